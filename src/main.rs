//! talker binary
//!
//! Publishes `Hello World: <n>` on the configured topic once per period until
//! interrupted (Ctrl-C, or SIGTERM on unix). Configuration comes from
//! `config/default.*`, `.env` and `TALKER__*` environment variables.
//!
//! Exit code is 0 after a clean shutdown and 1 when the middleware could not
//! be initialized.

use std::path::Path;
use std::process::ExitCode;

use talker::app;
use talker::config::{load_config, load_env_file};
use talker::utils::logging;
use tracing::{debug, error};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logging is not up yet; report the outcome once it is.
    let env_file = load_env_file(Path::new(".env"));

    let settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.log.level);

    match env_file {
        Ok(Some(path)) => debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => debug!("Ignoring .env file: {e}"),
    }

    app::run(&settings, app::shutdown_signal()).await
}
