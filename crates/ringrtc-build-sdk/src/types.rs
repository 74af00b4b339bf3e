//! Core types for ringrtc-build-sdk.
//!
//! - [`BuildError`] - Error type for every build, merge, and cleanup step
//! - [`BuildVariant`] - Debug or release output
//! - [`BuildMode`] - Which stages an invocation runs
//! - [`BuildReport`] - Paths produced by a successful run
//!
//! The closed target tables (environments, architectures, triples) live in
//! [`crate::targets`].

use std::fmt;
use std::path::PathBuf;

/// Error types for ringrtc-build-sdk operations.
///
/// Every variant carries enough context (tool, command, path) for the
/// message alone to say what failed and where.
///
/// # Example
///
/// ```
/// use ringrtc_build_sdk::BuildError;
///
/// let err = BuildError::ToolFailed {
///     description: "cargo rustc (aarch64-apple-ios)".to_string(),
///     code: Some(101),
///     diagnostics: "error[E0425]".to_string(),
/// };
/// assert_eq!(err.exit_code(), 101);
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// An environment name outside the fixed set was resolved.
    #[error("unknown environment '{0}'. Expected one of: simulator, device")]
    UnknownEnvironment(String),

    /// The external tool could not be started at all.
    #[error(
        "failed to start {description}: {source}\n\n\
         Ensure the tool is installed and available on PATH, or set its path under [tools] in ringrtc-build.toml."
    )]
    ToolLaunch {
        description: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool ran and exited unsuccessfully.
    #[error("{description} failed (exit status: {})\n\nOutput:\n{diagnostics}", display_code(.code))]
    ToolFailed {
        description: String,
        /// Exit code, or `None` when the process was terminated by a signal.
        code: Option<i32>,
        /// Trailing lines of the tool's output.
        diagnostics: String,
    },

    /// A filesystem operation on a known path failed.
    #[error("I/O error at {}: {source}. Check file paths and permissions", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tool reported success but its expected output is not on disk.
    #[error("{what} not found at {}", .path.display())]
    MissingArtifact { what: String, path: PathBuf },

    /// A tool produced several candidates where exactly one was expected.
    #[error("expected a single {what}, found {}: {}", .found.len(), display_paths(.found))]
    AmbiguousArtifact { what: String, found: Vec<PathBuf> },

    /// Invalid or missing configuration.
    #[error("configuration error: {0}. Check ringrtc-build.toml or the RINGRTC_* environment variables")]
    Config(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_string(),
    }
}

impl BuildError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code to report for this error.
    ///
    /// A failing tool's own nonzero code is propagated; everything else
    /// (including a tool killed by a signal) maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::ToolFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Build variant controlling optimization and the output subdirectory.
///
/// # Example
///
/// ```
/// use ringrtc_build_sdk::BuildVariant;
///
/// assert_eq!(BuildVariant::default(), BuildVariant::Release);
/// assert_eq!(BuildVariant::Debug.as_str(), "debug");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildVariant {
    /// Unoptimized build with debug info.
    Debug,
    /// Optimized build. The default.
    #[default]
    Release,
}

impl BuildVariant {
    pub const ALL: [BuildVariant; 2] = [BuildVariant::Debug, BuildVariant::Release];

    /// Returns `"debug"` or `"release"`; also the name of the output subdirectory.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildVariant::Debug => "debug",
            BuildVariant::Release => "release",
        }
    }

    pub fn is_release(&self) -> bool {
        matches!(self, BuildVariant::Release)
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which components an invocation runs.
///
/// Exactly one mode is selected per invocation. `Clean` and `Help`
/// terminate without building anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Framework and native-library stages, then metadata.
    #[default]
    All,
    /// Only the merged WebRTC.xcframework (and its metadata).
    FrameworkOnly,
    /// Only the libringrtc archives, header, and module map.
    NativeLibraryOnly,
    /// Remove every known output path.
    Clean,
    /// Print usage.
    Help,
}

impl BuildMode {
    pub fn builds_framework(&self) -> bool {
        matches!(self, BuildMode::All | BuildMode::FrameworkOnly)
    }

    pub fn builds_native_library(&self) -> bool {
        matches!(self, BuildMode::All | BuildMode::NativeLibraryOnly)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::All => "all",
            BuildMode::FrameworkOnly => "framework",
            BuildMode::NativeLibraryOnly => "native-library",
            BuildMode::Clean => "clean",
            BuildMode::Help => "help",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paths produced by a successful run.
///
/// Fields for stages that did not run stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// The merged multi-architecture bundle.
    pub merged_framework: Option<PathBuf>,
    /// `build_env.txt` inside the merged bundle.
    pub provenance: Option<PathBuf>,
    /// One `libringrtc.a` per target triple, in build order.
    pub archives: Vec<PathBuf>,
    /// The generated C header.
    pub header: Option<PathBuf>,
    pub module_map: Option<PathBuf>,
    pub podspec: Option<PathBuf>,
    /// Paths deleted by a clean run.
    pub removed: Vec<PathBuf>,
}
