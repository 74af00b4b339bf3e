//! Test doubles for the external tools.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::common::{CommandRunner, Invocation, ToolOutput};
use crate::context::{BuildContext, Versions};
use crate::types::BuildError;

type Predicate = Box<dyn Fn(&Invocation) -> bool>;

/// Records every invocation and fakes the files each tool would write.
pub(crate) struct FakeRunner {
    calls: RefCell<Vec<Invocation>>,
    failures: Vec<(Predicate, i32)>,
    simulate_outputs: bool,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            failures: Vec::new(),
            simulate_outputs: true,
        }
    }

    /// Makes matching invocations exit with `code`.
    pub fn fail_when(mut self, predicate: impl Fn(&Invocation) -> bool + 'static, code: i32) -> Self {
        self.failures.push((Box::new(predicate), code));
        self
    }

    /// Tools report success but write nothing.
    pub fn without_outputs(mut self) -> Self {
        self.simulate_outputs = false;
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, program_name: &str) -> Vec<Invocation> {
        self.calls
            .borrow()
            .iter()
            .filter(|inv| inv.program_name() == program_name)
            .cloned()
            .collect()
    }

    pub fn program_names(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|inv| inv.program_name()).collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, BuildError> {
        self.calls.borrow_mut().push(invocation.clone());

        if let Some((_, code)) = self.failures.iter().find(|(p, _)| p(invocation)) {
            return Err(BuildError::ToolFailed {
                description: invocation.description().to_string(),
                code: Some(*code),
                diagnostics: "injected failure".to_string(),
            });
        }
        if !self.simulate_outputs {
            return Ok(ToolOutput::default());
        }

        let stdout = match invocation.program_name().as_str() {
            "build_ios_libs.py" => {
                fake_webrtc_build(invocation);
                String::new()
            }
            "xcodebuild" => {
                let output = path_after(invocation, "-output");
                fs::create_dir_all(&output).unwrap();
                fs::write(output.join("Info.plist"), "<plist/>").unwrap();
                String::new()
            }
            "cargo" => {
                fake_cargo_build(invocation);
                String::new()
            }
            "cbindgen" => {
                let header = path_after(invocation, "-o");
                fs::write(header, "/* generated by cbindgen */\n").unwrap();
                String::new()
            }
            "print_build_env.py" => invocation
                .get_args()
                .iter()
                .filter_map(|a| {
                    let a = a.to_string_lossy();
                    a.strip_prefix("--webrtc-version=")
                        .map(|v| format!("WEBRTC_VERSION={v}\n"))
                        .or_else(|| {
                            a.strip_prefix("--ringrtc-version=")
                                .map(|v| format!("RINGRTC_VERSION={v}\n"))
                        })
                })
                .collect(),
            _ => String::new(),
        };
        Ok(ToolOutput {
            stdout,
            stderr: String::new(),
        })
    }
}

fn path_after(invocation: &Invocation, flag: &str) -> PathBuf {
    PathBuf::from(
        invocation
            .arg_after(flag)
            .unwrap_or_else(|| panic!("{flag} missing from {invocation}")),
    )
}

/// Writes a single-environment xcframework the way the WebRTC script does,
/// leaving per-architecture `<env>_<arch>_libs/WebRTC.framework`
/// intermediates and a dSYM beside it. Only the xcframework slice is the
/// build's result.
fn fake_webrtc_build(invocation: &Invocation) {
    let out = path_after(invocation, "-o");
    let (env, archs, slice) = if invocation.has_arg("target_environment=\"simulator\"") {
        ("simulator", &["arm64", "x64"][..], "ios-arm64_x86_64-simulator")
    } else {
        ("device", &["arm64"][..], "ios-arm64")
    };
    for arch in archs {
        let intermediate = out.join(format!("{env}_{arch}_libs")).join("WebRTC.framework");
        fs::create_dir_all(&intermediate).unwrap();
        fs::write(intermediate.join("WebRTC"), "mach-o").unwrap();
    }
    let slice_dir = out.join("WebRTC.xcframework").join(slice);
    let framework = slice_dir.join("WebRTC.framework");
    fs::create_dir_all(&framework).unwrap();
    fs::write(framework.join("WebRTC"), "mach-o").unwrap();
    fs::create_dir_all(slice_dir.join("dSYMs/WebRTC.framework")).unwrap();
}

fn fake_cargo_build(invocation: &Invocation) {
    let target_dir = PathBuf::from(
        invocation
            .get_env("CARGO_TARGET_DIR")
            .expect("CARGO_TARGET_DIR not set"),
    );
    let triple = path_after(invocation, "--target");
    let variant = if invocation.has_arg("--release") {
        "release"
    } else {
        "debug"
    };
    let dir = target_dir.join(&triple).join(variant);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("libringrtc.a"),
        format!("archive {} {variant}", triple.display()),
    )
    .unwrap();
}

/// Context rooted in `root` with both versions set.
pub(crate) fn test_context(root: &Path) -> BuildContext {
    BuildContext::new(root.join("out"), root.join("rust"), root.join("webrtc"))
        .with_versions(Versions::new("6099a", "2.50.0"))
}
