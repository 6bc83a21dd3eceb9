//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured `log.filter` applies.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config_loader::LogConfig;

/// Build the filter for the process subscriber
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Later calls are no-ops, so tests and the
/// binary can both call this.
pub fn init(config: &LogConfig) {
    let _ = fmt()
        .with_env_filter(env_filter(config))
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_falls_back_instead_of_panicking() {
        let cfg = LogConfig {
            filter: "forecast_serve=[[[".to_string(),
        };
        let _ = env_filter(&cfg);
        init(&cfg);
        init(&cfg);
    }
}
