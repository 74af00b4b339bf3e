//! On-disk output layout.
//!
//! Everything the build writes lives under one output root:
//!
//! ```text
//! <out>/
//! ├── debug/<environment>/          # per-environment WebRTC builds (debug)
//! ├── release/<environment>/        # per-environment WebRTC builds (release)
//! ├── build/<triple>/<variant>/     # cargo target dir for libringrtc
//! ├── WebRTC.xcframework/           # merged bundle, contains build_env.txt
//! ├── WebRTCForTesting.podspec
//! └── libringrtc/
//!     ├── <triple>/libringrtc.a
//!     ├── ringrtc.h
//!     └── RingRTC.modulemap
//! ```
//!
//! Debug and release intermediates live in separate subdirectories so one
//! variant never overwrites the other.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::targets::{Environment, TargetTriple};
use crate::types::{BuildError, BuildVariant};

pub const MERGED_FRAMEWORK_DIR: &str = "WebRTC.xcframework";
pub const FRAMEWORK_BUNDLE_NAME: &str = "WebRTC.framework";
pub const PROVENANCE_FILE: &str = "build_env.txt";
pub const NATIVE_BUILD_DIR: &str = "build";
pub const NATIVE_OUTPUT_DIR: &str = "libringrtc";
pub const NATIVE_LIBRARY_NAME: &str = "ringrtc";
pub const ARCHIVE_FILE: &str = "libringrtc.a";
pub const HEADER_FILE: &str = "ringrtc.h";
pub const MODULE_MAP_FILE: &str = "RingRTC.modulemap";
pub const PODSPEC_FILE: &str = "WebRTCForTesting.podspec";

/// Path computations for the output tree rooted at a single directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactTree {
    root: PathBuf,
}

impl ArtifactTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<out>/<variant>`
    pub fn variant_dir(&self, variant: BuildVariant) -> PathBuf {
        self.root.join(variant.as_str())
    }

    /// `<out>/<variant>/<environment>`: output directory for one framework build.
    pub fn environment_dir(&self, variant: BuildVariant, environment: Environment) -> PathBuf {
        self.variant_dir(variant).join(environment.as_str())
    }

    /// Cargo target directory shared by every triple.
    pub fn native_build_dir(&self) -> PathBuf {
        self.root.join(NATIVE_BUILD_DIR)
    }

    /// Where cargo leaves the archive for `triple` in `variant`.
    pub fn built_archive(&self, triple: TargetTriple, variant: BuildVariant) -> PathBuf {
        self.native_build_dir()
            .join(triple.as_str())
            .join(variant.as_str())
            .join(ARCHIVE_FILE)
    }

    pub fn merged_framework(&self) -> PathBuf {
        self.root.join(MERGED_FRAMEWORK_DIR)
    }

    pub fn provenance_file(&self) -> PathBuf {
        self.merged_framework().join(PROVENANCE_FILE)
    }

    /// `<out>/libringrtc`
    pub fn native_output_dir(&self) -> PathBuf {
        self.root.join(NATIVE_OUTPUT_DIR)
    }

    pub fn target_archive_dir(&self, triple: TargetTriple) -> PathBuf {
        self.native_output_dir().join(triple.as_str())
    }

    /// Final location of the archive for `triple`.
    pub fn target_archive(&self, triple: TargetTriple) -> PathBuf {
        self.target_archive_dir(triple).join(ARCHIVE_FILE)
    }

    pub fn header(&self) -> PathBuf {
        self.native_output_dir().join(HEADER_FILE)
    }

    pub fn module_map(&self) -> PathBuf {
        self.native_output_dir().join(MODULE_MAP_FILE)
    }

    pub fn podspec(&self) -> PathBuf {
        self.root.join(PODSPEC_FILE)
    }

    /// Every path the build can create directly under the root.
    pub fn known_outputs(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = BuildVariant::ALL
            .iter()
            .map(|variant| self.variant_dir(*variant))
            .collect();
        paths.push(self.native_build_dir());
        paths.push(self.merged_framework());
        paths.push(self.native_output_dir());
        paths.push(self.podspec());
        paths
    }

    /// Removes every known output path.
    ///
    /// Paths that are already absent are skipped, so running this twice is
    /// not an error. Returns the paths that were actually removed.
    pub fn clean(&self) -> Result<Vec<PathBuf>, BuildError> {
        let mut removed = Vec::new();
        for path in self.known_outputs() {
            if remove_path(&path)? {
                debug!("Removed {}", path.display());
                removed.push(path);
            }
        }
        info!(
            "Cleaned {} ({} path(s) removed)",
            self.root.display(),
            removed.len()
        );
        Ok(removed)
    }
}

/// Removes a file or directory tree, returning whether anything was there.
pub fn remove_path(path: &Path) -> Result<bool, BuildError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(BuildError::io(path, e)),
    };
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BuildError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populate(tree: &ArtifactTree) {
        for variant in BuildVariant::ALL {
            for env in Environment::ALL {
                fs::create_dir_all(tree.environment_dir(variant, env)).unwrap();
            }
        }
        let archive = tree.built_archive(TargetTriple::Aarch64Ios, BuildVariant::Release);
        fs::create_dir_all(archive.parent().unwrap()).unwrap();
        fs::write(&archive, b"!<arch>\n").unwrap();
        fs::create_dir_all(tree.merged_framework()).unwrap();
        fs::write(tree.provenance_file(), "WEBRTC_VERSION=1\n").unwrap();
        fs::create_dir_all(tree.target_archive_dir(TargetTriple::X86_64Ios)).unwrap();
        fs::write(tree.header(), "/* header */").unwrap();
        fs::write(tree.podspec(), "Pod::Spec.new").unwrap();
    }

    #[test]
    fn paths_follow_layout() {
        let tree = ArtifactTree::new("/out");
        assert_eq!(
            tree.environment_dir(BuildVariant::Debug, Environment::Simulator),
            PathBuf::from("/out/debug/simulator")
        );
        assert_eq!(
            tree.built_archive(TargetTriple::Aarch64IosSim, BuildVariant::Release),
            PathBuf::from("/out/build/aarch64-apple-ios-sim/release/libringrtc.a")
        );
        assert_eq!(
            tree.target_archive(TargetTriple::X86_64Ios),
            PathBuf::from("/out/libringrtc/x86_64-apple-ios/libringrtc.a")
        );
        assert_eq!(
            tree.provenance_file(),
            PathBuf::from("/out/WebRTC.xcframework/build_env.txt")
        );
        assert_eq!(
            tree.module_map(),
            PathBuf::from("/out/libringrtc/RingRTC.modulemap")
        );
        assert_eq!(tree.header(), PathBuf::from("/out/libringrtc/ringrtc.h"));
        assert_eq!(
            tree.podspec(),
            PathBuf::from("/out/WebRTCForTesting.podspec")
        );
    }

    #[test]
    fn variants_do_not_share_directories() {
        let tree = ArtifactTree::new("/out");
        assert_ne!(
            tree.variant_dir(BuildVariant::Debug),
            tree.variant_dir(BuildVariant::Release)
        );
        assert_ne!(
            tree.built_archive(TargetTriple::Aarch64Ios, BuildVariant::Debug),
            tree.built_archive(TargetTriple::Aarch64Ios, BuildVariant::Release)
        );
    }

    #[test]
    fn clean_removes_every_known_output() {
        let temp = TempDir::new().unwrap();
        let tree = ArtifactTree::new(temp.path());
        populate(&tree);
        let unrelated = temp.path().join("keep.txt");
        fs::write(&unrelated, "not ours").unwrap();

        let removed = tree.clean().unwrap();

        assert_eq!(removed.len(), 6);
        for name in [
            "debug",
            "release",
            "build",
            "WebRTC.xcframework",
            "libringrtc",
            "WebRTCForTesting.podspec",
        ] {
            assert!(!temp.path().join(name).exists(), "{name} still present");
        }
        assert!(unrelated.exists());
    }

    #[test]
    fn clean_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let tree = ArtifactTree::new(temp.path());
        populate(&tree);

        tree.clean().unwrap();
        let second = tree.clean().unwrap();

        assert!(second.is_empty());
    }

    #[test]
    fn clean_of_missing_root_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let tree = ArtifactTree::new(temp.path().join("never-created"));
        assert!(tree.clean().unwrap().is_empty());
    }
}
