//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::Error;

/// Installs the global subscriber. `RUST_LOG` wins over `config.log_level`;
/// an unparsable directive falls back to `info`.
pub fn init(config: &Config) -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
    };
    installed.map_err(|e| Error::Telemetry(e.to_string()))?;

    tracing::info!(json = config.log_json, "tracing initialized");
    Ok(())
}
