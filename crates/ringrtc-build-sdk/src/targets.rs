//! Fixed target tables.
//!
//! Two independent tables drive the build:
//!
//! | Table | Used by | Entries |
//! |-------|---------|---------|
//! | [`Environment`] -> [`Arch`] | Framework stage | simulator: arm64, x64; device: arm64 |
//! | [`TargetTriple`] | Native-library stage | aarch64-apple-ios, x86_64-apple-ios, aarch64-apple-ios-sim |
//!
//! Both are closed enums; adding an entry is a code change, not configuration.

use std::fmt;
use std::str::FromStr;

use crate::types::BuildError;

/// CPU architecture identifier understood by the WebRTC iOS build script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Arm64,
    X64,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::X64 => "x64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical deployment environment for a framework slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Simulator,
    Device,
}

impl Environment {
    /// Every environment, in build order.
    pub const ALL: [Environment; 2] = [Environment::Simulator, Environment::Device];

    /// The `target_environment` value and output subdirectory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Simulator => "simulator",
            Environment::Device => "device",
        }
    }

    /// Architectures required for this environment. Never empty.
    pub fn architectures(&self) -> &'static [Arch] {
        match self {
            Environment::Simulator => &[Arch::Arm64, Arch::X64],
            Environment::Device => &[Arch::Arm64],
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Environment::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| BuildError::UnknownEnvironment(s.to_string()))
    }
}

/// Resolves an environment name to its architecture list.
///
/// # Example
///
/// ```
/// use ringrtc_build_sdk::targets::{architectures_for, Arch};
///
/// assert_eq!(architectures_for("device").unwrap(), &[Arch::Arm64]);
/// assert!(architectures_for("tvos").is_err());
/// ```
pub fn architectures_for(environment: &str) -> Result<&'static [Arch], BuildError> {
    Ok(environment.parse::<Environment>()?.architectures())
}

/// Native-library compilation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetTriple {
    /// Physical devices.
    Aarch64Ios,
    /// Simulator on Intel hosts.
    X86_64Ios,
    /// Simulator on Apple silicon hosts.
    Aarch64IosSim,
}

impl TargetTriple {
    /// Every triple the native-library stage builds, in build order.
    pub const ALL: [TargetTriple; 3] = [
        TargetTriple::Aarch64Ios,
        TargetTriple::X86_64Ios,
        TargetTriple::Aarch64IosSim,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetTriple::Aarch64Ios => "aarch64-apple-ios",
            TargetTriple::X86_64Ios => "x86_64-apple-ios",
            TargetTriple::Aarch64IosSim => "aarch64-apple-ios-sim",
        }
    }

    /// Extra toolchain flags for this triple.
    ///
    /// The arm64 simulator ABI ships no prebuilt standard library, so it is
    /// compiled from source.
    pub fn extra_cargo_args(&self) -> &'static [&'static str] {
        match self {
            TargetTriple::Aarch64IosSim => &["-Zbuild-std"],
            TargetTriple::Aarch64Ios | TargetTriple::X86_64Ios => &[],
        }
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed list of native-library targets, independent of environment.
pub fn native_targets() -> &'static [TargetTriple] {
    &TargetTriple::ALL
}
