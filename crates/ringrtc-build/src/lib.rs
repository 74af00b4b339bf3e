//! # build-ios
//!
//! Command-line entry point that builds the RingRTC iOS bundle.
//!
//! ## Usage
//!
//! ```bash
//! # Everything, release
//! build-ios
//!
//! # Only libringrtc, debug
//! build-ios -d -r
//!
//! # Remove every output
//! build-ios --clean
//! ```
//!
//! ## Flags
//!
//! | Flag | Effect |
//! |------|--------|
//! | (none) | Build WebRTC.xcframework and libringrtc, release |
//! | `-d`, `--debug` | Debug variant |
//! | `-w` | Only WebRTC.xcframework |
//! | `-r` | Only libringrtc (archives, header, module map) |
//! | `-c`, `--clean` | Remove all outputs and exit |
//! | `-h`, `--help` | Print usage and exit |
//! | `-v`, `--verbose` | Debug logging, including every tool command line |
//! | `--config <path>` | Use this `ringrtc-build.toml` |
//!
//! Flags are read left to right. `-w` and `-r` override each other, so the
//! last one wins. `-c` and `-h` end processing: anything after them is
//! ignored, even if it would not parse.
//!
//! ## Output Directory
//!
//! ```text
//! out/
//! ├── debug/ release/       # per-environment WebRTC builds
//! ├── build/                # cargo target dir
//! ├── WebRTC.xcframework/   # merged bundle + build_env.txt
//! ├── WebRTCForTesting.podspec
//! └── libringrtc/           # <triple>/libringrtc.a, ringrtc.h, RingRTC.modulemap
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration file support for `ringrtc-build.toml`

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ringrtc_build_sdk::{
    BuildContext, BuildError, BuildMode, BuildReport, BuildVariant, Pipeline, SystemRunner,
};

pub mod config;

use config::{ConfigResolver, load_env_files};

/// Builds WebRTC.xcframework and libringrtc for iOS.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "build-ios",
    version,
    about = "Builds WebRTC.xcframework and the libringrtc static libraries for iOS",
    long_about = None,
    disable_help_flag = true,
    args_override_self = true
)]
pub struct Cli {
    /// Build the debug variant (default: release)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Build only WebRTC.xcframework
    #[arg(short = 'w', overrides_with = "native_only")]
    pub framework_only: bool,

    /// Build only libringrtc (archives, header, module map)
    #[arg(short = 'r', overrides_with = "framework_only")]
    pub native_only: bool,

    /// Remove all build outputs and exit
    #[arg(short = 'c', long)]
    pub clean: bool,

    /// Print help and exit
    #[arg(short = 'h', long)]
    pub help: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Path to ringrtc-build.toml (default: discovered from the current directory)
    #[arg(long, value_name = "PATH", allow_hyphen_values = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The single mode selected by the parsed flags.
    pub fn mode(&self) -> BuildMode {
        if self.help {
            BuildMode::Help
        } else if self.clean {
            BuildMode::Clean
        } else if self.framework_only {
            BuildMode::FrameworkOnly
        } else if self.native_only {
            BuildMode::NativeLibraryOnly
        } else {
            BuildMode::All
        }
    }

    pub fn variant(&self) -> BuildVariant {
        if self.debug {
            BuildVariant::Debug
        } else {
            BuildVariant::Release
        }
    }
}

/// Parses `args` (including the program name).
///
/// Arguments after the first `-c`/`--clean`/`-h`/`--help` are dropped
/// before clap sees them.
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    Cli::try_parse_from(truncate_at_terminal_flag(args))
}

/// Cuts the argument list right after the first flag that ends processing.
///
/// A short cluster such as `-dcx` is cut inside, keeping `-dc`.
fn truncate_at_terminal_flag(args: Vec<OsString>) -> Vec<OsString> {
    let mut kept = Vec::with_capacity(args.len());
    let mut args = args.into_iter();
    kept.extend(args.next());

    let mut takes_value = false;
    for arg in args {
        if takes_value {
            takes_value = false;
            kept.push(arg);
            continue;
        }
        let Some(text) = arg.to_str() else {
            kept.push(arg);
            continue;
        };
        match text {
            "--clean" | "--help" => {
                kept.push(arg);
                return kept;
            }
            "--config" => {
                takes_value = true;
                kept.push(arg);
            }
            long if long.starts_with("--") => kept.push(arg),
            short if short.starts_with('-') && short.len() > 1 => {
                if let Some(at) = short[1..].find(['c', 'h']) {
                    kept.push(OsString::from(&short[..at + 2]));
                    return kept;
                }
                kept.push(arg);
            }
            _ => kept.push(arg),
        }
    }
    kept
}

/// Runs the tool with the process arguments.
pub fn run() -> ExitCode {
    run_from(env::args_os())
}

/// Runs the tool with explicit arguments (including the program name).
pub fn run_from<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let cli = match parse_args(args) {
        Ok(cli) => cli,
        Err(err) => return report_parse_error(&err),
    };

    if cli.mode() == BuildMode::Help {
        print!("{}", Cli::command().render_help());
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.verbose);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn report_parse_error(err: &clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayVersion | ErrorKind::DisplayHelp => {
            let _ = err.print();
            ExitCode::SUCCESS
        }
        _ => {
            let _ = err.print();
            eprintln!();
            eprint!("{}", Cli::command().render_help());
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Exit status for a failed run: the failing tool's own code when there is one.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    let code = err
        .downcast_ref::<BuildError>()
        .map(BuildError::exit_code)
        .unwrap_or(1);
    u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
}

fn execute(cli: &Cli) -> Result<()> {
    let cwd = env::current_dir().context("Failed to get current directory")?;
    let resolver = ConfigResolver::load(cli.config.as_deref(), &cwd)?;
    if let Some(path) = &resolver.config_path {
        debug!("Using configuration from {}", path.display());
    }
    if let Some(path) = load_env_files(&resolver.env_file_candidates())? {
        debug!("Loaded environment from {}", path.display());
    }
    let resolver = resolver.with_env_overrides(|key| env::var(key).ok());
    let ctx = resolver.build_context();

    let mode = cli.mode();
    let variant = cli.variant();
    let report = Pipeline::new(&ctx, &SystemRunner).run(mode, variant)?;

    print!("{}", summary(&ctx, mode, variant, &report));
    Ok(())
}

/// Human-readable result of a run, printed to stdout.
fn summary(ctx: &BuildContext, mode: BuildMode, variant: BuildVariant, report: &BuildReport) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    if mode == BuildMode::Clean {
        if report.removed.is_empty() {
            let _ = writeln!(out, "Nothing to clean in {}", ctx.tree.root().display());
        }
        for path in &report.removed {
            let _ = writeln!(out, "Removed {}", path.display());
        }
        return out;
    }

    let _ = writeln!(out, "Build complete ({mode}, {variant})");
    let single = [
        ("Framework", &report.merged_framework),
        ("Build env", &report.provenance),
        ("Header", &report.header),
        ("Module map", &report.module_map),
        ("Podspec", &report.podspec),
    ];
    for (label, path) in single {
        if let Some(path) = path {
            let _ = writeln!(out, "  {:<11} {}", format!("{label}:"), path.display());
        }
    }
    for archive in &report.archives {
        let _ = writeln!(out, "  {:<11} {}", "Archive:", archive.display());
    }
    out
}
