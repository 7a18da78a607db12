//! Process-wide logging setup.
//!
//! Honors the same two environment switches the original checked, renamed
//! into this crate's own namespace: one redirects output to a file, the
//! other suppresses ANSI color (for logs piped somewhere that can't
//! render escape codes).

use std::fs::OpenOptions;

use tracing_subscriber::EnvFilter;

const LOG_FILE_VAR: &str = "PERCH_LOG_FILE";
const NO_COLOR_VAR: &str = "PERCH_NO_COLOR";

/// Initialize the global `tracing` subscriber. Call once, at process
/// start, before anything logs.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let ansi = std::env::var_os(NO_COLOR_VAR).is_none();

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(ansi);

    match std::env::var_os(LOG_FILE_VAR) {
        Some(path) => match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => builder.with_writer(file).with_ansi(false).init(),
            Err(e) => {
                builder.init();
                tracing::error!("could not open log file {path:?}: {e}, logging to stderr instead");
            }
        },
        None => builder.init(),
    }
}
