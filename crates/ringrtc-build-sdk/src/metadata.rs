//! Small descriptive files that accompany the binaries.
//!
//! - `libringrtc/RingRTC.modulemap`: exposes the native library to Swift
//! - `WebRTCForTesting.podspec`: lets the test app consume the merged framework
//! - `WebRTC.xcframework/build_env.txt`: provenance from the build-env helper
//!
//! The module map and podspec contents are constant; only the provenance
//! text depends on the configured versions.

use std::path::PathBuf;

use tracing::info;

use crate::builders::common::{CommandRunner, Invocation, write_file};
use crate::context::{BuildContext, DEFAULT_DEPLOYMENT_TARGET};
use crate::layout::{HEADER_FILE, MERGED_FRAMEWORK_DIR, NATIVE_LIBRARY_NAME};
use crate::types::BuildError;

pub const MODULE_NAME: &str = "SignalRingRTC";
pub const UMBRELLA_HEADER: &str = "SignalRingRTC.h";
pub const PODSPEC_NAME: &str = "WebRTCForTesting";
pub const PODSPEC_VERSION: &str = "0.0.1";

/// Module map text: the public umbrella header plus an explicit private
/// submodule for `ringrtc.h` that links the native library.
pub fn module_map() -> String {
    format!(
        r#"framework module {MODULE_NAME} {{
  umbrella header "{UMBRELLA_HEADER}"
  export *
  module * {{ export * }}

  explicit module {MODULE_NAME}_Private {{
    header "{HEADER_FILE}"
    link "{NATIVE_LIBRARY_NAME}"
    export *
  }}
}}
"#
    )
}

/// Podspec text for the testing pod that vendors the merged framework.
pub fn podspec() -> String {
    format!(
        r#"Pod::Spec.new do |s|
  s.name     = "{PODSPEC_NAME}"
  s.version  = "{PODSPEC_VERSION}"
  s.summary  = "Intended only for testing SignalRingRTC within this repository"
  s.license  = "BSD"
  s.homepage = "https://github.com/signalapp/webrtc"
  s.source   = {{ git: "https://github.com/signalapp/webrtc.git" }}
  s.author   = {{ "iOS Team": "ios@signal.org" }}

  s.platform = :ios, "{DEFAULT_DEPLOYMENT_TARGET}"
  s.vendored_frameworks = "{MERGED_FRAMEWORK_DIR}"
end
"#
    )
}

/// Writes the metadata files into the artifact tree.
pub struct MetadataEmitter<'a, R: CommandRunner + ?Sized> {
    ctx: &'a BuildContext,
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> MetadataEmitter<'a, R> {
    pub fn new(ctx: &'a BuildContext, runner: &'a R) -> Self {
        Self { ctx, runner }
    }

    pub fn write_module_map(&self) -> Result<PathBuf, BuildError> {
        let path = self.ctx.tree.module_map();
        info!("Creating module map in {}", path.display());
        write_file(&path, module_map())?;
        Ok(path)
    }

    pub fn write_podspec(&self) -> Result<PathBuf, BuildError> {
        let path = self.ctx.tree.podspec();
        info!("Creating {}", path.display());
        write_file(&path, podspec())?;
        Ok(path)
    }

    /// Runs the build-env helper and stores its stdout as `build_env.txt`.
    ///
    /// Requires both versions and an existing merged framework directory.
    pub fn write_provenance(&self) -> Result<PathBuf, BuildError> {
        let (webrtc, ringrtc) = self.ctx.versions.require()?;
        let merged = self.ctx.tree.merged_framework();
        if !merged.is_dir() {
            return Err(BuildError::MissingArtifact {
                what: "merged framework".to_string(),
                path: merged,
            });
        }

        let invocation = Invocation::new(&self.ctx.tools.build_env_script, "build environment report")
            .arg(format!("--webrtc-version={webrtc}"))
            .arg(format!("--ringrtc-version={ringrtc}"));
        let output = self.runner.run(&invocation)?;

        let path = self.ctx.tree.provenance_file();
        write_file(&path, output.stdout)?;
        info!("Recorded build environment in {}", path.display());
        Ok(path)
    }
}
