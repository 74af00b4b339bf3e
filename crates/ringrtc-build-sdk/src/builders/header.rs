//! C header for libringrtc, produced by cbindgen.

use std::path::PathBuf;

use tracing::info;

use crate::builders::common::{CommandRunner, Invocation, create_dir_all};
use crate::context::BuildContext;
use crate::types::BuildError;

pub struct HeaderGenerator<'a, R: CommandRunner + ?Sized> {
    ctx: &'a BuildContext,
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> HeaderGenerator<'a, R> {
    pub fn new(ctx: &'a BuildContext, runner: &'a R) -> Self {
        Self { ctx, runner }
    }

    /// Writes `libringrtc/ringrtc.h`, replacing any previous header.
    pub fn generate(&self) -> Result<PathBuf, BuildError> {
        let header = self.ctx.tree.header();
        info!("Creating header file in {}", header.display());

        create_dir_all(&self.ctx.tree.native_output_dir())?;
        self.runner.run(&self.invocation())?;

        if !header.is_file() {
            return Err(BuildError::MissingArtifact {
                what: "generated header".to_string(),
                path: header,
            });
        }
        Ok(header)
    }

    pub fn invocation(&self) -> Invocation {
        let src = &self.ctx.native_src_dir;
        Invocation::new(&self.ctx.tools.cbindgen, "cbindgen")
            .arg(src.join("src").join("lib.rs"))
            .arg("--config")
            .arg(src.join("cbindgen.toml"))
            .arg("-o")
            .arg(self.ctx.tree.header())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRunner, test_context};
    use tempfile::TempDir;

    #[test]
    fn invokes_cbindgen_once_with_crate_config() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(temp.path());
        let runner = FakeRunner::new();

        let header = HeaderGenerator::new(&ctx, &runner).generate().unwrap();

        assert_eq!(header, ctx.tree.header());
        assert!(header.is_file());
        let calls = runner.calls_to("cbindgen");
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].arg_after("--config"),
            Some(ctx.native_src_dir.join("cbindgen.toml").as_os_str())
        );
        assert_eq!(
            calls[0].get_args()[0].as_os_str(),
            ctx.native_src_dir.join("src/lib.rs").as_os_str()
        );
        assert_eq!(calls[0].arg_after("-o"), Some(header.as_os_str()));
    }

    #[test]
    fn failure_is_propagated() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(temp.path());
        let runner = FakeRunner::new().fail_when(|inv| inv.program_name() == "cbindgen", 2);

        let err = HeaderGenerator::new(&ctx, &runner).generate().unwrap_err();

        assert_eq!(err.exit_code(), 2);
        assert!(!ctx.tree.header().exists());
    }
}
