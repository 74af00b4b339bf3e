//! WebRTC.xcframework assembly.
//!
//! The WebRTC build script is run once per [`Environment`] into
//! `<out>/<variant>/<environment>`, which must then hold exactly one
//! `WebRTC.xcframework/<slice>/WebRTC.framework`. The per-architecture
//! `*_libs` intermediates next to it are ignored. One framework per
//! environment is merged with `xcodebuild -create-xcframework` into
//! `<out>/WebRTC.xcframework`, and the provenance file is written into the
//! merged bundle.
//!
//! Environments are built in [`Environment::ALL`] order. A failed
//! environment build stops the stage before anything is merged.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::builders::common::{CommandRunner, Invocation, create_dir_all};
use crate::context::BuildContext;
use crate::layout::{FRAMEWORK_BUNDLE_NAME, MERGED_FRAMEWORK_DIR, remove_path};
use crate::metadata::MetadataEmitter;
use crate::targets::{Arch, Environment};
use crate::types::{BuildError, BuildVariant};

/// Slice directory holding debug symbols, never a framework slice.
const DEBUG_SYMBOL_DIR: &str = "dSYMs";

/// Paths produced by a framework build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkOutput {
    pub merged: PathBuf,
    pub provenance: PathBuf,
}

pub struct FrameworkBuilder<'a, R: CommandRunner + ?Sized> {
    ctx: &'a BuildContext,
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> FrameworkBuilder<'a, R> {
    pub fn new(ctx: &'a BuildContext, runner: &'a R) -> Self {
        Self { ctx, runner }
    }

    /// Builds every environment, merges the results, and records provenance.
    pub fn build(&self, variant: BuildVariant) -> Result<FrameworkOutput, BuildError> {
        info!(
            "Building the WebRTC.xcframework ({}) in {}",
            variant,
            self.ctx.tree.root().display()
        );

        let mut frameworks = Vec::new();
        for environment in Environment::ALL {
            frameworks.push(self.build_environment(environment, variant)?);
        }

        let merged = self.merge(&frameworks)?;
        let provenance = MetadataEmitter::new(self.ctx, self.runner).write_provenance()?;
        Ok(FrameworkOutput { merged, provenance })
    }

    /// Runs the WebRTC build for one environment and returns the single
    /// framework bundle it produced.
    pub fn build_environment(
        &self,
        environment: Environment,
        variant: BuildVariant,
    ) -> Result<PathBuf, BuildError> {
        let archs: Vec<&str> = environment.architectures().iter().map(Arch::as_str).collect();
        info!("  Building WebRTC for {} ({})", environment, archs.join(", "));

        self.runner
            .run(&self.environment_invocation(environment, variant))?;

        let out = self.ctx.tree.environment_dir(variant, environment);
        let what = format!("{} for {}", FRAMEWORK_BUNDLE_NAME, environment);
        let mut found = find_framework_bundles(&out)?;
        match found.len() {
            0 => Err(BuildError::MissingArtifact {
                what,
                path: out.join(MERGED_FRAMEWORK_DIR),
            }),
            1 => {
                let framework = found.remove(0);
                debug!("  Found {}", framework.display());
                Ok(framework)
            }
            _ => Err(BuildError::AmbiguousArtifact { what, found }),
        }
    }

    /// The WebRTC build script call for one environment.
    pub fn environment_invocation(
        &self,
        environment: Environment,
        variant: BuildVariant,
    ) -> Invocation {
        let description = format!("WebRTC build ({}, {})", environment, variant);
        Invocation::new(self.ctx.webrtc_build_script(), description)
            .arg("-o")
            .arg(self.ctx.tree.environment_dir(variant, environment))
            .args(["--build_config", variant.as_str()])
            .arg("--deployment-target")
            .arg(&self.ctx.deployment_target)
            .arg("--arch")
            .args(environment.architectures().iter().map(Arch::as_str))
            .arg("--extra-gn-args")
            .args(extra_gn_args(environment))
            .current_dir(&self.ctx.webrtc_src_dir)
    }

    /// Replaces `<out>/WebRTC.xcframework` with a merge of `frameworks`.
    pub fn merge(&self, frameworks: &[PathBuf]) -> Result<PathBuf, BuildError> {
        let merged = self.ctx.tree.merged_framework();
        if remove_path(&merged)? {
            debug!("Removed previous {}", merged.display());
        }
        create_dir_all(self.ctx.tree.root())?;

        info!("  Merging {} framework(s)", frameworks.len());
        let mut invocation = Invocation::new(&self.ctx.tools.xcodebuild, "xcodebuild -create-xcframework")
            .arg("-create-xcframework");
        for framework in frameworks {
            invocation = invocation.arg("-framework").arg(framework);
        }
        invocation = invocation.arg("-output").arg(&merged);
        self.runner.run(&invocation)?;

        if !merged.is_dir() {
            return Err(BuildError::MissingArtifact {
                what: "merged framework".to_string(),
                path: merged,
            });
        }
        Ok(merged)
    }
}

/// GN arguments passed through to the WebRTC build for `environment`.
pub fn extra_gn_args(environment: Environment) -> Vec<String> {
    vec![
        "rtc_enable_sctp=false".to_string(),
        format!("target_environment=\"{}\"", environment),
    ]
}

/// The `WebRTC.framework` slices of the single-environment
/// `WebRTC.xcframework` inside `env_dir`, sorted.
///
/// Only `<env_dir>/WebRTC.xcframework/<slice>/WebRTC.framework` is
/// considered. Per-architecture intermediates elsewhere in `env_dir` and
/// `dSYMs` are ignored. A missing xcframework yields an empty list.
pub fn find_framework_bundles(env_dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let xcframework = env_dir.join(MERGED_FRAMEWORK_DIR);
    let entries = match fs::read_dir(&xcframework) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BuildError::io(&xcframework, e)),
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(&xcframework, e))?;
        if entry.file_name() == DEBUG_SYMBOL_DIR {
            continue;
        }
        let framework = entry.path().join(FRAMEWORK_BUNDLE_NAME);
        if framework.is_dir() {
            found.push(framework);
        }
    }

    found.sort();
    Ok(found)
}
