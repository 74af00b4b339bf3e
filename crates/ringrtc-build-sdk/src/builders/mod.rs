//! Build stages for the iOS bundle.
//!
//! Each builder borrows a [`BuildContext`](crate::BuildContext) and a
//! [`CommandRunner`], so the same code drives real tools or a recording
//! double in tests.
//!
//! | Builder | Tool | Output |
//! |---------|------|--------|
//! | [`FrameworkBuilder`] | WebRTC build script, `xcodebuild` | `WebRTC.xcframework` |
//! | [`NativeLibraryBuilder`] | `cargo rustc` | `libringrtc/<triple>/libringrtc.a` |
//! | [`HeaderGenerator`] | `cbindgen` | `libringrtc/ringrtc.h` |
//!
//! ## Common Utilities
//!
//! The [`common`] module provides process invocation ([`Invocation`],
//! [`SystemRunner`]) and path-annotated filesystem helpers.

pub mod common;
pub mod framework;
pub mod header;
pub mod native;

pub use common::{CommandRunner, Invocation, SystemRunner, ToolOutput};
pub use framework::{FrameworkBuilder, FrameworkOutput, find_framework_bundles};
pub use header::HeaderGenerator;
pub use native::NativeLibraryBuilder;
