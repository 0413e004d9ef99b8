//! Logging setup

use crate::config::LogFormat;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "rating_server=info,tower_http=info,security=info";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logger(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.with_target(true).init(),
    }
}
