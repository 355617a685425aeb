use std::process::ExitCode;

fn main() -> ExitCode {
    match snorlaxd::run_service() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => error.exit_code(),
    }
}
