use std::process::ExitCode;

fn main() -> ExitCode {
    shield_editor::native::run()
}
