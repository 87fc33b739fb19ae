//! Structured logging setup
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use crate::config::DaybookConfig;
use crate::error::{DaybookError, Result};
use tracing::{info, Level};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Errors
/// Returns `DaybookError::Configuration` if the level is invalid or a global
/// subscriber is already installed
pub fn init_tracing(config: &DaybookConfig) -> Result<()> {
    config
        .log_level
        .parse::<Level>()
        .map_err(|e| DaybookError::configuration(format!("Invalid log level: {e}")))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json_logs {
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr);
        registry.with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).try_init()
    };
    installed.map_err(|e| DaybookError::configuration(format!("Failed to initialize tracing: {e}")))?;

    info!("Tracing initialized with level: {}", config.log_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        let mut config = DaybookConfig::default();
        config.log_level = "chatty".to_string();

        assert!(matches!(
            init_tracing(&config),
            Err(DaybookError::Configuration { .. })
        ));
    }

    #[test]
    fn test_second_init_fails() {
        let config = DaybookConfig::default();
        let _ = init_tracing(&config);

        assert!(init_tracing(&config).is_err());
    }
}
