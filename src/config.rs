//! # Configuration
//!
//! Marketplace settings loaded from defaults, an optional file and the
//! environment.
//!
//! Sources are layered in this order, later ones winning:
//!
//! 1. [`MarketplaceConfig::default`]
//! 2. An optional TOML file
//! 3. `PROCUREMENT__*` environment variables (after `.env` is loaded)
//!
//! ```text
//! PROCUREMENT__REQUEST_TTL_DAYS=14
//! PROCUREMENT__SWEEP_INTERVAL_SECS=30
//! PROCUREMENT__LOG_FORMAT=json
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PROCUREMENT";

/// Longest lifetime accepted for requests, group requests and groups.
pub const MAX_TTL_DAYS: i64 = 3_650;

/// Error raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Marketplace settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Lifetime of a new request.
    pub request_ttl_days: i64,
    /// Lifetime of a new group request.
    pub group_request_ttl_days: i64,
    /// Lifetime of a new group.
    pub group_ttl_days: i64,
    /// Member cap when the creator does not pick one.
    pub default_max_members: u32,
    /// Page size when the caller does not pick one.
    pub default_page_size: u32,
    /// Largest page size a caller may ask for.
    pub max_page_size: u32,
    /// Attempts before an optimistic write gives up.
    pub max_conflict_retries: u32,
    /// Seconds between expiration sweeps.
    pub sweep_interval_secs: u64,
    /// Log output format.
    pub log_format: LogFormat,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            request_ttl_days: 7,
            group_request_ttl_days: 3,
            group_ttl_days: 7,
            default_max_members: 20,
            default_page_size: 20,
            max_page_size: 100,
            max_conflict_retries: 5,
            sweep_interval_secs: 60,
            log_format: LogFormat::Pretty,
            log_filter: "info".to_string(),
        }
    }
}

impl MarketplaceConfig {
    /// Loads `.env`, then layers defaults, `file` and the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source is malformed or a value is out of range.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            tracing::warn!(error = %err, "ignoring unreadable .env file");
        }

        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let loaded: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("request_ttl_days", self.request_ttl_days),
            ("group_request_ttl_days", self.group_request_ttl_days),
            ("group_ttl_days", self.group_ttl_days),
        ];
        for (key, value) in positive {
            if value <= 0 {
                return Err(ConfigError::Invalid(format!("{key} must be positive")));
            }
            if value > MAX_TTL_DAYS {
                return Err(ConfigError::Invalid(format!(
                    "{key} cannot exceed {MAX_TTL_DAYS} days"
                )));
            }
        }
        if self.default_max_members == 0 {
            return Err(ConfigError::Invalid(
                "default_max_members must be at least 1".to_string(),
            ));
        }
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(ConfigError::Invalid("page sizes must be at least 1".to_string()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::Invalid(
                "default_page_size cannot exceed max_page_size".to_string(),
            ));
        }
        if self.max_conflict_retries == 0 {
            return Err(ConfigError::Invalid(
                "max_conflict_retries must be at least 1".to_string(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sweep_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Interval between expiration sweeps.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MarketplaceConfig::default();
        config.validate().unwrap();
        assert_eq!(config.request_ttl_days, 7);
        assert_eq!(config.group_request_ttl_days, 3);
        assert_eq!(config.default_max_members, 20);
        assert_eq!(config.max_page_size, 100);
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn rejects_inverted_page_sizes() {
        let config = MarketplaceConfig {
            default_page_size: 200,
            ..MarketplaceConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_ttl() {
        let config = MarketplaceConfig {
            group_ttl_days: 0,
            ..MarketplaceConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("group_ttl_days"));
    }

    #[test]
    fn rejects_oversized_ttl() {
        let config = MarketplaceConfig {
            request_ttl_days: i64::MAX,
            ..MarketplaceConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_ttl_days cannot exceed"));

        let config = MarketplaceConfig {
            group_ttl_days: MAX_TTL_DAYS,
            ..MarketplaceConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let parsed: MarketplaceConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "sweep_interval_secs = 5\nlog_format = \"json\"",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(parsed.sweep_interval_secs, 5);
        assert_eq!(parsed.log_format, LogFormat::Json);
        assert_eq!(parsed.request_ttl_days, 7);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let loaded = MarketplaceConfig::load(Some(Path::new("does-not-exist.toml"))).unwrap();
        assert_eq!(loaded.default_page_size, 20);
    }
}
