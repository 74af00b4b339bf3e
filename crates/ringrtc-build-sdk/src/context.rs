//! Resolved inputs shared by every stage.
//!
//! A [`BuildContext`] is assembled once by the caller (the CLI loads it from
//! `ringrtc-build.toml` and the environment) and then only read.

use std::path::{self, PathBuf};

use crate::layout::ArtifactTree;
use crate::types::BuildError;

pub const DEFAULT_WEBRTC_BUILD_SCRIPT: &str = "tools_webrtc/ios/build_ios_libs.py";
pub const DEFAULT_BUILD_ENV_SCRIPT: &str = "bin/print_build_env.py";
pub const DEFAULT_DEPLOYMENT_TARGET: &str = "12.2";

/// Locations of the external tools the stages invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub cargo: PathBuf,
    pub cbindgen: PathBuf,
    /// Provides `-create-xcframework`.
    pub xcodebuild: PathBuf,
    /// Per-environment WebRTC build script. A relative path is taken
    /// relative to the WebRTC source directory.
    pub webrtc_build_script: PathBuf,
    /// Helper that prints the provenance text for two version strings.
    pub build_env_script: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            cargo: PathBuf::from("cargo"),
            cbindgen: PathBuf::from("cbindgen"),
            xcodebuild: PathBuf::from("xcodebuild"),
            webrtc_build_script: PathBuf::from(DEFAULT_WEBRTC_BUILD_SCRIPT),
            build_env_script: PathBuf::from(DEFAULT_BUILD_ENV_SCRIPT),
        }
    }
}

/// Version identifiers recorded in `build_env.txt`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Versions {
    pub webrtc: Option<String>,
    pub ringrtc: Option<String>,
}

impl Versions {
    pub fn new(webrtc: impl Into<String>, ringrtc: impl Into<String>) -> Self {
        Self {
            webrtc: Some(webrtc.into()),
            ringrtc: Some(ringrtc.into()),
        }
    }

    /// Both versions, or a configuration error naming the missing one.
    pub fn require(&self) -> Result<(&str, &str), BuildError> {
        let webrtc = self.webrtc.as_deref().filter(|v| !v.is_empty()).ok_or_else(|| {
            BuildError::Config("WebRTC version is not set ([versions] webrtc or WEBRTC_VERSION)".into())
        })?;
        let ringrtc = self.ringrtc.as_deref().filter(|v| !v.is_empty()).ok_or_else(|| {
            BuildError::Config(
                "RingRTC version is not set ([versions] ringrtc or RINGRTC_VERSION)".into(),
            )
        })?;
        Ok((webrtc, ringrtc))
    }
}

/// Everything a build needs besides the mode and variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub tree: ArtifactTree,
    /// The native crate: holds `Cargo.toml`, `src/lib.rs`, and `cbindgen.toml`.
    pub native_src_dir: PathBuf,
    /// WebRTC checkout root (the directory containing `tools_webrtc/`).
    pub webrtc_src_dir: PathBuf,
    pub tools: Toolchain,
    pub versions: Versions,
    /// Minimum iOS version passed to both toolchains.
    pub deployment_target: String,
}

impl BuildContext {
    /// Creates a context with default tools, no versions, and the default
    /// deployment target.
    ///
    /// Relative directories are made absolute against the current directory.
    /// Tools run in another working directory receive these paths.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        native_src_dir: impl Into<PathBuf>,
        webrtc_src_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tree: ArtifactTree::new(absolute(output_dir.into())),
            native_src_dir: absolute(native_src_dir.into()),
            webrtc_src_dir: absolute(webrtc_src_dir.into()),
            tools: Toolchain::default(),
            versions: Versions::default(),
            deployment_target: DEFAULT_DEPLOYMENT_TARGET.to_string(),
        }
    }

    pub fn with_versions(mut self, versions: Versions) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_tools(mut self, tools: Toolchain) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_deployment_target(mut self, target: impl Into<String>) -> Self {
        self.deployment_target = target.into();
        self
    }

    /// Absolute-or-joined path of the WebRTC build script.
    pub fn webrtc_build_script(&self) -> PathBuf {
        self.webrtc_src_dir.join(&self.tools.webrtc_build_script)
    }
}

/// `path` made absolute without touching the filesystem. Falls back to
/// `path` itself when the current directory is unavailable.
fn absolute(path: PathBuf) -> PathBuf {
    path::absolute(&path).unwrap_or(path)
}
