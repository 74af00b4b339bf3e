//! libringrtc static archives.
//!
//! Invokes the native toolchain once per [`TargetTriple`] and copies each
//! archive to `libringrtc/<triple>/libringrtc.a`. Triples are built one
//! after another; the first failure stops the stage.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::builders::common::{CommandRunner, Invocation, copy_file};
use crate::context::BuildContext;
use crate::targets::{TargetTriple, native_targets};
use crate::types::{BuildError, BuildVariant};

/// Builds and collects the per-triple archives.
pub struct NativeLibraryBuilder<'a, R: CommandRunner + ?Sized> {
    ctx: &'a BuildContext,
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> NativeLibraryBuilder<'a, R> {
    pub fn new(ctx: &'a BuildContext, runner: &'a R) -> Self {
        Self { ctx, runner }
    }

    /// Builds every triple in [`native_targets`] and returns the copied
    /// archive paths in build order.
    pub fn build(&self, variant: BuildVariant) -> Result<Vec<PathBuf>, BuildError> {
        info!(
            "Building libringrtc.a ({}) in {}",
            variant,
            self.ctx.tree.native_output_dir().display()
        );
        native_targets()
            .iter()
            .map(|triple| self.build_target(*triple, variant))
            .collect()
    }

    /// Builds one triple and copies its archive into the artifact tree.
    pub fn build_target(
        &self,
        triple: TargetTriple,
        variant: BuildVariant,
    ) -> Result<PathBuf, BuildError> {
        info!("  Building for {}", triple);
        self.runner.run(&self.invocation(triple, variant))?;

        let built = self.ctx.tree.built_archive(triple, variant);
        if !built.is_file() {
            return Err(BuildError::MissingArtifact {
                what: format!("{} archive", triple),
                path: built,
            });
        }
        let dest = self.ctx.tree.target_archive(triple);
        copy_file(&built, &dest)?;
        debug!("  Copied {} -> {}", built.display(), dest.display());
        Ok(dest)
    }

    /// The toolchain call for one triple.
    pub fn invocation(&self, triple: TargetTriple, variant: BuildVariant) -> Invocation {
        let mut inv = Invocation::new(&self.ctx.tools.cargo, format!("cargo rustc ({})", triple))
            .args(["rustc", "--lib", "--target", triple.as_str()]);
        if variant.is_release() {
            inv = inv.arg("--release");
        }
        inv.args(triple.extra_cargo_args())
            .current_dir(&self.ctx.native_src_dir)
            .env("CARGO_TARGET_DIR", self.ctx.tree.native_build_dir())
            .env("IPHONEOS_DEPLOYMENT_TARGET", &self.ctx.deployment_target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRunner, test_context};
    use std::ffi::OsStr;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn release_invocation_has_release_flag_and_target_dir() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(temp.path());
        let runner = FakeRunner::new();
        let builder = NativeLibraryBuilder::new(&ctx, &runner);

        let inv = builder.invocation(TargetTriple::Aarch64Ios, BuildVariant::Release);

        assert_eq!(inv.program_name(), "cargo");
        assert_eq!(inv.arg_after("--target"), Some(OsStr::new("aarch64-apple-ios")));
        assert!(inv.has_arg("--release"));
        assert!(!inv.has_arg("-Zbuild-std"));
        assert_eq!(inv.get_current_dir(), Some(ctx.native_src_dir.as_path()));
        assert_eq!(
            inv.get_env("CARGO_TARGET_DIR"),
            Some(ctx.tree.native_build_dir().as_os_str())
        );
        assert_eq!(inv.get_env("IPHONEOS_DEPLOYMENT_TARGET"), Some(OsStr::new("12.2")));
    }

    #[test]
    fn debug_sim_invocation_builds_std_without_release() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(temp.path());
        let runner = FakeRunner::new();
        let builder = NativeLibraryBuilder::new(&ctx, &runner);

        let inv = builder.invocation(TargetTriple::Aarch64IosSim, BuildVariant::Debug);

        assert!(!inv.has_arg("--release"));
        assert!(inv.has_arg("-Zbuild-std"));
    }

    #[test]
    fn builds_every_triple_once_and_copies_archives() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(temp.path());
        let runner = FakeRunner::new();

        let archives = NativeLibraryBuilder::new(&ctx, &runner)
            .build(BuildVariant::Release)
            .unwrap();

        let built: Vec<_> = runner
            .calls_to("cargo")
            .iter()
            .map(|inv| inv.arg_after("--target").unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            built,
            ["aarch64-apple-ios", "x86_64-apple-ios", "aarch64-apple-ios-sim"]
        );
        assert_eq!(archives.len(), 3);
        for triple in TargetTriple::ALL {
            let archive = ctx.tree.target_archive(triple);
            assert!(archives.contains(&archive));
            assert_eq!(
                fs::read_to_string(&archive).unwrap(),
                format!("archive {triple} release")
            );
        }
    }

    #[test]
    fn toolchain_failure_stops_remaining_triples() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(temp.path());
        let runner = FakeRunner::new().fail_when(
            |inv| inv.arg_after("--target") == Some(OsStr::new("x86_64-apple-ios")),
            101,
        );

        let err = NativeLibraryBuilder::new(&ctx, &runner)
            .build(BuildVariant::Release)
            .unwrap_err();

        assert_eq!(err.exit_code(), 101);
        assert_eq!(runner.calls_to("cargo").len(), 2);
        assert!(ctx.tree.target_archive(TargetTriple::Aarch64Ios).exists());
        assert!(!ctx.tree.target_archive(TargetTriple::Aarch64IosSim).exists());
    }

    #[test]
    fn missing_archive_after_success_is_reported() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(temp.path());
        let runner = FakeRunner::new().without_outputs();

        let err = NativeLibraryBuilder::new(&ctx, &runner)
            .build_target(TargetTriple::Aarch64Ios, BuildVariant::Debug)
            .unwrap_err();

        match err {
            BuildError::MissingArtifact { path, .. } => assert_eq!(
                path,
                ctx.tree
                    .built_archive(TargetTriple::Aarch64Ios, BuildVariant::Debug)
            ),
            other => panic!("expected MissingArtifact, got {other:?}"),
        }
    }
}
