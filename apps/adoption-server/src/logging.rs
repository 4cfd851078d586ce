use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// # Errors
///
/// Returns an error if `directive` is not a valid filter.
pub fn parse_filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive).with_context(|| format!("invalid logging.level `{directive}`"))
}

/// Installs the global subscriber. `RUST_LOG`, when set and valid, wins over
/// the configured level. Output goes to stderr so stdout stays machine-readable.
///
/// # Errors
///
/// Returns an error if the level is invalid or a subscriber is already set.
pub fn init(cfg: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&cfg.level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match cfg.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
