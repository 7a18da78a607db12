//! `perch [config-path]`: load configuration, install the built-in state
//! tracker, and run the supervisor until a clean shutdown.

use std::path::PathBuf;
use std::process::ExitCode;

use perch::config::Config;
use perch::extloader::ExtensionFactory;
use perch::supervisor::Supervisor;

#[tokio::main]
async fn main() -> ExitCode {
    perch::logging::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = match Config::load(&PathBuf::from(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("failed to load configuration from {config_path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Caller-supplied extensions (e.g. a Twitter-stream relay, a URL
    // archiver) are out of scope for this core; this registry is ready
    // for a caller to populate before calling `Supervisor::new`.
    let extensions: Vec<Box<dyn ExtensionFactory>> = Vec::new();

    let supervisor = match Supervisor::new(config, extensions) {
        Ok(supervisor) => supervisor,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match supervisor.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal I/O error: {e}");
            ExitCode::FAILURE
        }
    }
}
