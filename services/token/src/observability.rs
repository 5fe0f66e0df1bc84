//! Tracing subscriber setup.

use crate::config::Config;
use crate::error::TokenError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured log level. Should be
/// called once at startup, before the signing key is generated.
///
/// # Errors
///
/// Returns [`TokenError::Config`] if a global subscriber is already set.
pub fn init_tracing(config: &Config) -> Result<(), TokenError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = if config.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    result.map_err(|e| TokenError::config(format!("Tracing already initialized: {e}")))?;

    tracing::info!(service = %config.service_name, "Tracing initialized");
    Ok(())
}
