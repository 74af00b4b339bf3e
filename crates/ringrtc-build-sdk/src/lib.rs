//! Build orchestration for the RingRTC iOS bundle.
//!
//! `ringrtc-build-sdk` cross-compiles the two halves of the bundle and lays
//! them out in one output directory:
//!
//! - **WebRTC.xcframework**: WebRTC built once per deployment environment
//!   (simulator, device) and merged into a single multi-architecture bundle,
//!   with a `build_env.txt` provenance file inside
//! - **libringrtc**: one static archive per target triple, a C header, and a
//!   module map
//! - **WebRTCForTesting.podspec**: a testing pod that vendors the merged
//!   framework
//!
//! # Example
//!
//! ```no_run
//! use ringrtc_build_sdk::{BuildContext, BuildMode, BuildVariant, Pipeline, SystemRunner, Versions};
//!
//! let ctx = BuildContext::new("out", "src/rust", "src/webrtc/src")
//!     .with_versions(Versions::new("6099a", "2.50.0"));
//!
//! let report = Pipeline::new(&ctx, &SystemRunner).run(BuildMode::All, BuildVariant::Release)?;
//! for archive in &report.archives {
//!     println!("{}", archive.display());
//! }
//! # Ok::<(), ringrtc_build_sdk::BuildError>(())
//! ```
//!
//! # Architecture
//!
//! - **Targets**: fixed environment and triple tables ([`targets`])
//! - **Layout**: every output path, plus cleanup ([`layout`])
//! - **Builders**: one per stage, all driven through a [`CommandRunner`] ([`builders`])
//! - **Metadata**: module map, podspec, and provenance ([`metadata`])
//! - **Pipeline**: stage selection and ordering ([`pipeline`])

pub mod builders;
pub mod context;
pub mod layout;
pub mod metadata;
pub mod pipeline;
pub mod targets;
pub mod types;

#[cfg(test)]
mod testing;

pub use builders::{CommandRunner, Invocation, SystemRunner, ToolOutput};
pub use context::{BuildContext, Toolchain, Versions};
pub use layout::ArtifactTree;
pub use pipeline::Pipeline;
pub use targets::{Arch, Environment, TargetTriple, architectures_for, native_targets};
pub use types::{BuildError, BuildMode, BuildReport, BuildVariant};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
