use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Result, StarrError};
use crate::settings::LoggingSettings;

/// Install a global `tracing` subscriber for binaries embedding the client.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if the
/// level is unknown or a subscriber is already installed.
pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    let log_level = parse_log_level(&settings.level)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if settings.format.as_str() == "json" {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    installed.map_err(|e| StarrError::Config(format!("Failed to install logger: {e}")))
}

/// Parse log level string to tracing Level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(StarrError::Config(format!("Invalid log level: {level}"))),
    }
}
