use std::process::ExitCode;

use engine::run_app;
use tracing::{error, info};

use super::bootstrap::AppWiring;

/// Blocks on the window loop until the player quits or the window closes.
pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        scenes,
        keybinds,
    } = app;
    match run_app(config, scenes, keybinds) {
        Ok(()) => {
            info!("app_exited");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "app_failed");
            ExitCode::FAILURE
        }
    }
}
