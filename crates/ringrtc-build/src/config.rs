//! Configuration file support for build-ios.
//!
//! Paths, versions, and tool locations come from an optional
//! `ringrtc-build.toml`, then from environment variables.
//!
//! ## Configuration File Location
//!
//! Unless `--config <path>` is given, the file is searched for in:
//! 1. Current working directory (`./ringrtc-build.toml`)
//! 2. Parent directories (up to the repository root or filesystem root)
//!
//! ## Example Configuration
//!
//! ```toml
//! [paths]
//! output_dir = "out"
//! native_src_dir = "src/rust"
//! webrtc_src_dir = "src/webrtc/src"
//!
//! [versions]
//! webrtc = "6099a"
//! ringrtc = "2.50.0"
//!
//! [tools]
//! cbindgen = "/opt/homebrew/bin/cbindgen"
//! build_env_script = "bin/print_build_env.py"
//!
//! [ios]
//! deployment_target = "12.2"
//! ```
//!
//! Relative paths in the file resolve against the directory that holds it.
//!
//! ## Environment Overrides
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `RINGRTC_OUTPUT_DIR` | `paths.output_dir` |
//! | `RINGRTC_NATIVE_SRC_DIR` | `paths.native_src_dir` |
//! | `RINGRTC_WEBRTC_SRC_DIR` | `paths.webrtc_src_dir` |
//! | `WEBRTC_VERSION` | `versions.webrtc` |
//! | `RINGRTC_VERSION` | `versions.ringrtc` |
//! | `IPHONEOS_DEPLOYMENT_TARGET` | `ios.deployment_target` |
//!
//! Relative paths from the environment resolve against the current directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use ringrtc_build_sdk::context::{
    DEFAULT_BUILD_ENV_SCRIPT, DEFAULT_DEPLOYMENT_TARGET, DEFAULT_WEBRTC_BUILD_SCRIPT,
};
use ringrtc_build_sdk::{BuildContext, Toolchain, Versions};

/// The default configuration file name.
pub const CONFIG_FILE_NAME: &str = "ringrtc-build.toml";

/// Local environment file loaded before overrides are applied.
pub const ENV_FILE_NAME: &str = ".env.local";

/// Root configuration structure for `ringrtc-build.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub paths: PathsConfig,
    pub versions: VersionsConfig,
    pub tools: ToolsConfig,
    pub ios: IosConfig,
}

/// Input and output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of every generated artifact. Defaults to `out`.
    pub output_dir: PathBuf,

    /// The native crate (holds `Cargo.toml`, `src/lib.rs`, `cbindgen.toml`).
    ///
    /// Defaults to `src/rust`.
    pub native_src_dir: PathBuf,

    /// WebRTC checkout root. Defaults to `src/webrtc/src`.
    pub webrtc_src_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("out"),
            native_src_dir: PathBuf::from("src/rust"),
            webrtc_src_dir: PathBuf::from("src/webrtc/src"),
        }
    }
}

/// Versions recorded in `build_env.txt`. Only needed when the framework is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionsConfig {
    pub webrtc: Option<String>,
    pub ringrtc: Option<String>,
}

/// External tool locations.
///
/// A bare program name (`cargo`) is looked up on `PATH`; anything with a
/// directory component resolves like the other paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub cargo: PathBuf,
    pub cbindgen: PathBuf,
    pub xcodebuild: PathBuf,

    /// Relative to `paths.webrtc_src_dir`, not the config directory.
    pub webrtc_build_script: PathBuf,

    pub build_env_script: PathBuf,
}

impl Default for ToolsConfig {
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

/// iOS-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IosConfig {
    /// Minimum iOS version. Defaults to "12.2".
    pub deployment_target: String,
}

impl Default for IosConfig {
    fn default() -> Self {
        Self {
            deployment_target: DEFAULT_DEPLOYMENT_TARGET.to_string(),
        }
    }
}

impl BuildConfig {
    /// Loads configuration from the specified file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: BuildConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Attempts to find and load configuration starting from the specified directory.
    ///
    /// # Returns
    ///
    /// * `Ok(Some((config, path)))` - Found and loaded configuration with its path
    /// * `Ok(None)` - No configuration file found
    /// * `Err` - If a config file was found but couldn't be parsed
    pub fn discover_from(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.is_file() {
                let config = Self::load_from_file(&config_path)?;
                return Ok(Some((config, config_path)));
            }

            // Stop at repository root or filesystem root
            if current.join(".git").exists() || !current.pop() {
                break;
            }
        }

        Ok(None)
    }
}

/// Resolves the loaded configuration into a [`BuildContext`].
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    /// Loaded (or default) configuration, with overrides applied.
    pub config: BuildConfig,

    /// Path to the loaded config file, if any.
    pub config_path: Option<PathBuf>,

    /// Base for relative paths from the file.
    base_dir: PathBuf,

    /// Base for relative paths from the environment.
    cwd: PathBuf,
}

impl ConfigResolver {
    /// Loads `explicit` if given, otherwise discovers a file from `cwd`.
    ///
    /// An explicitly named file must exist; a discovered one is optional.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let found = match explicit {
            Some(path) => {
                let path = cwd.join(path);
                Some((BuildConfig::load_from_file(&path)?, path))
            }
            None => BuildConfig::discover_from(cwd)?,
        };

        Ok(match found {
            Some((config, path)) => Self {
                config,
                base_dir: path.parent().unwrap_or(cwd).to_path_buf(),
                config_path: Some(path),
                cwd: cwd.to_path_buf(),
            },
            None => Self::from_config(BuildConfig::default(), cwd),
        })
    }

    /// A resolver over an in-memory configuration rooted at `cwd`.
    pub fn from_config(config: BuildConfig, cwd: &Path) -> Self {
        Self {
            config,
            config_path: None,
            base_dir: cwd.to_path_buf(),
            cwd: cwd.to_path_buf(),
        }
    }

    /// Directories searched for [`ENV_FILE_NAME`], nearest first.
    pub fn env_file_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = vec![self.base_dir.join(ENV_FILE_NAME)];
        let in_cwd = self.cwd.join(ENV_FILE_NAME);
        if !candidates.contains(&in_cwd) {
            candidates.push(in_cwd);
        }
        candidates
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(dir) = get("RINGRTC_OUTPUT_DIR") {
            self.config.paths.output_dir = self.cwd.join(dir);
        }
        if let Some(dir) = get("RINGRTC_NATIVE_SRC_DIR") {
            self.config.paths.native_src_dir = self.cwd.join(dir);
        }
        if let Some(dir) = get("RINGRTC_WEBRTC_SRC_DIR") {
            self.config.paths.webrtc_src_dir = self.cwd.join(dir);
        }
        if let Some(version) = get("WEBRTC_VERSION") {
            self.config.versions.webrtc = Some(version);
        }
        if let Some(version) = get("RINGRTC_VERSION") {
            self.config.versions.ringrtc = Some(version);
        }
        if let Some(target) = get("IPHONEOS_DEPLOYMENT_TARGET") {
            self.config.ios.deployment_target = target;
        }
        self
    }

    /// Returns the output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.output_dir)
    }

    /// Builds the context handed to the pipeline.
    pub fn build_context(&self) -> BuildContext {
        let paths = &self.config.paths;
        let tools = &self.config.tools;

        BuildContext::new(
            self.output_dir(),
            self.resolve(&paths.native_src_dir),
            self.resolve(&paths.webrtc_src_dir),
        )
        .with_versions(Versions {
            webrtc: self.config.versions.webrtc.clone(),
            ringrtc: self.config.versions.ringrtc.clone(),
        })
        .with_tools(Toolchain {
            cargo: self.resolve_tool(&tools.cargo),
            cbindgen: self.resolve_tool(&tools.cbindgen),
            xcodebuild: self.resolve_tool(&tools.xcodebuild),
            webrtc_build_script: tools.webrtc_build_script.clone(),
            build_env_script: self.resolve(&tools.build_env_script),
        })
        .with_deployment_target(self.config.ios.deployment_target.clone())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    fn resolve_tool(&self, program: &Path) -> PathBuf {
        if program.components().count() > 1 {
            self.resolve(program)
        } else {
            program.to_path_buf()
        }
    }
}

/// Loads the first existing env file. Variables already set are kept.
///
/// An env file that exists but cannot be parsed is an error.
pub fn load_env_files(candidates: &[PathBuf]) -> Result<Option<PathBuf>> {
    let Some(path) = candidates.iter().find(|path| path.is_file()) else {
        return Ok(None);
    };
    dotenvy::from_path(path)
        .with_context(|| format!("Failed to load environment file: {:?}", path))?;
    Ok(Some(path.clone()))
}
