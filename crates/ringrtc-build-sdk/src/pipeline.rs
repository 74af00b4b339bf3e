//! Stage sequencing.
//!
//! [`Pipeline::run`] executes the stages selected by a [`BuildMode`] in a
//! fixed order and stops at the first error:
//!
//! 1. framework (WebRTC builds, merge, provenance)
//! 2. native library (per-triple archives, header)
//! 3. metadata (module map after the native stage, podspec after the
//!    framework stage)
//!
//! `Clean` removes known outputs and `Help` does nothing; neither invokes
//! a tool.

use tracing::info;

use crate::builders::common::{CommandRunner, create_dir_all};
use crate::builders::{FrameworkBuilder, HeaderGenerator, NativeLibraryBuilder};
use crate::context::BuildContext;
use crate::metadata::MetadataEmitter;
use crate::types::{BuildError, BuildMode, BuildReport, BuildVariant};

/// Runs build stages against one [`BuildContext`].
///
/// # Example
///
/// ```no_run
/// use ringrtc_build_sdk::{BuildContext, BuildMode, BuildVariant, Pipeline, SystemRunner, Versions};
///
/// let ctx = BuildContext::new("out", "src/rust", "src/webrtc/src")
///     .with_versions(Versions::new("6099a", "2.50.0"));
/// let report = Pipeline::new(&ctx, &SystemRunner).run(BuildMode::All, BuildVariant::Release)?;
/// println!("{} archive(s)", report.archives.len());
/// # Ok::<(), ringrtc_build_sdk::BuildError>(())
/// ```
pub struct Pipeline<'a, R: CommandRunner + ?Sized> {
    ctx: &'a BuildContext,
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> Pipeline<'a, R> {
    pub fn new(ctx: &'a BuildContext, runner: &'a R) -> Self {
        Self { ctx, runner }
    }

    pub fn run(&self, mode: BuildMode, variant: BuildVariant) -> Result<BuildReport, BuildError> {
        let mut report = BuildReport::default();
        match mode {
            BuildMode::Help => return Ok(report),
            BuildMode::Clean => {
                report.removed = self.ctx.tree.clean()?;
                return Ok(report);
            }
            BuildMode::All | BuildMode::FrameworkOnly | BuildMode::NativeLibraryOnly => {}
        }

        // Versions must be known before any tool runs.
        if mode.builds_framework() {
            self.ctx.versions.require()?;
        }

        info!(
            "Building {} ({}) into {}",
            mode,
            variant,
            self.ctx.tree.root().display()
        );
        create_dir_all(self.ctx.tree.root())?;

        if mode.builds_framework() {
            let output = FrameworkBuilder::new(self.ctx, self.runner).build(variant)?;
            report.merged_framework = Some(output.merged);
            report.provenance = Some(output.provenance);
        }

        if mode.builds_native_library() {
            report.archives = NativeLibraryBuilder::new(self.ctx, self.runner).build(variant)?;
            report.header = Some(HeaderGenerator::new(self.ctx, self.runner).generate()?);
        }

        let metadata = MetadataEmitter::new(self.ctx, self.runner);
        if mode.builds_native_library() {
            report.module_map = Some(metadata.write_module_map()?);
        }
        if mode.builds_framework() {
            report.podspec = Some(metadata.write_podspec()?);
        }

        info!("Done");
        Ok(report)
    }
}
