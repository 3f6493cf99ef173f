use std::process::ExitCode;

use tracing::error;

mod app;

fn main() -> ExitCode {
    let wiring = match app::bootstrap::build_app() {
        Ok(wiring) => wiring,
        Err(err) => {
            error!(error = %err, "startup_failed");
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    app::loop_runner::run(wiring)
}
