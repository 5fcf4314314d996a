use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Running query-engine configuration, consumed by SQM creation contexts and
/// the compiled-query cache.
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum association join depth accepted in one statement (1-64)
    #[validate(range(
        min = 1,
        max = 64,
        message = "Join depth must be between 1 and 64"
    ))]
    pub max_join_depth: usize,

    /// Statement execution timeout in seconds; 0 disables the timeout
    #[validate(range(max = 3600, message = "Timeout must be at most 3600 seconds"))]
    pub query_timeout_secs: u64,

    /// Default tenant identifier used for cache keys when the caller
    /// supplies none
    pub default_tenant: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_join_depth: 16,
            query_timeout_secs: 0,
            default_tenant: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables:
    /// - `RELMAP_MAX_JOIN_DEPTH` (default: 16)
    /// - `RELMAP_QUERY_TIMEOUT_SECS` (default: 0, disabled)
    /// - `RELMAP_DEFAULT_TENANT` (default: unset)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = EngineConfig::default();

        let max_join_depth = parse_env("RELMAP_MAX_JOIN_DEPTH", defaults.max_join_depth)?;
        let query_timeout_secs =
            parse_env("RELMAP_QUERY_TIMEOUT_SECS", defaults.query_timeout_secs)?;
        let default_tenant = env::var("RELMAP_DEFAULT_TENANT").ok();

        let config = EngineConfig {
            max_join_depth,
            query_timeout_secs,
            default_tenant,
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_env<T>(field: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(field) {
        Ok(value) => value.parse().map_err(|e| ConfigError::Parse {
            field: field.to_string(),
            value,
            source: Box::new(e),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_join_depth, 16);
    }

    #[test]
    fn test_out_of_range_depth_fails_validation() {
        let config = EngineConfig {
            max_join_depth: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
