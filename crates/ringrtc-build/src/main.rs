use std::process::ExitCode;

fn main() -> ExitCode {
    ringrtc_build::run()
}
