//! Process invocation and filesystem helpers shared by every stage.
//!
//! External tools are never spawned directly by a builder. A builder
//! describes the call as an [`Invocation`] and hands it to a
//! [`CommandRunner`], which either runs it ([`SystemRunner`]) or, in tests,
//! records it and simulates its outputs. Failures come back as
//! [`BuildError`] values so the pipeline can stop at the first one.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::types::BuildError;

/// Number of trailing output lines kept in a [`BuildError::ToolFailed`].
const DIAGNOSTIC_LINES: usize = 40;

/// A fully described external tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
    description: String,
}

impl Invocation {
    /// Creates an invocation of `program`.
    ///
    /// `description` names the step in logs and errors, e.g.
    /// `"cargo rustc (aarch64-apple-ios)"`.
    pub fn new(program: impl Into<PathBuf>, description: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
            description: description.into(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// File name of the program, for matching and display.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn get_env(&self, key: &str) -> Option<&OsStr> {
        self.envs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Value following `flag` in the argument list, if any.
    pub fn arg_after(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(|a| a.as_os_str())
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }
}

impl fmt::Display for Invocation {
    /// Shell-like rendering for logs; not meant to be re-parsed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.envs {
            write!(f, "{}={} ", key.to_string_lossy(), value.to_string_lossy())?;
        }
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.contains(' ') || arg.is_empty() {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured output of a successful tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes [`Invocation`]s.
///
/// Implementations block until the tool exits and map a nonzero exit to
/// [`BuildError::ToolFailed`].
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, BuildError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, BuildError> {
        (**self).run(invocation)
    }
}

/// Runs invocations as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, BuildError> {
        match invocation.get_current_dir() {
            Some(dir) => debug!("Running {} (in {})", invocation, dir.display()),
            None => debug!("Running {}", invocation),
        }

        let output = invocation
            .to_command()
            .output()
            .map_err(|source| BuildError::ToolLaunch {
                description: invocation.description().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(BuildError::ToolFailed {
                description: invocation.description().to_string(),
                code: output.status.code(),
                diagnostics: diagnostic_tail(&stdout, &stderr),
            });
        }

        for line in stdout.lines() {
            debug!("  {}", line);
        }
        Ok(ToolOutput { stdout, stderr })
    }
}

/// Last lines of stdout followed by stderr, trimmed to [`DIAGNOSTIC_LINES`].
fn diagnostic_tail(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let start = lines.len().saturating_sub(DIAGNOSTIC_LINES);
    lines[start..].join("\n")
}

/// `fs::create_dir_all` with the path attached to the error.
pub fn create_dir_all(path: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(path).map_err(|e| BuildError::io(path, e))
}

/// Writes `contents` to `path`, creating parent directories and replacing
/// any existing file.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), BuildError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent)?;
    }
    fs::write(path, contents).map_err(|e| BuildError::io(path, e))
}

/// Copies a single file into place, creating the destination directory.
pub fn copy_file(from: &Path, to: &Path) -> Result<(), BuildError> {
    if let Some(parent) = to.parent() {
        create_dir_all(parent)?;
    }
    fs::copy(from, to).map_err(|e| BuildError::io(to, e))?;
    Ok(())
}
