//! # Telemetry
//!
//! `tracing` subscriber setup for the binary.
//!
//! `RUST_LOG` wins over the configured filter when it is set.

use crate::config::LogFormat;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Error raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive does not parse.
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber is already installed.
    #[error("tracing already initialised: {0}")]
    AlreadyInitialised(#[from] tracing_subscriber::util::TryInitError),
}

/// Builds the filter from `RUST_LOG`, falling back to `default_directive`.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if `default_directive` is needed
/// and does not parse.
pub fn env_filter(default_directive: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(default_directive)?),
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// - `TelemetryError::InvalidFilter` for a bad filter directive
/// - `TelemetryError::AlreadyInitialised` if called twice
pub fn init_tracing(format: LogFormat, default_directive: &str) -> Result<(), TelemetryError> {
    let filter = env_filter(default_directive)?;
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false),
            )
            .try_init()?,
    }
    Ok(())
}
