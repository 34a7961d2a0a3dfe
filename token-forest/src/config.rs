//! Forest traversal configuration.

use std::env;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TokenForestError};

/// Protocol ceiling on account updates visited per approval pass.
pub const MAX_ACCOUNT_UPDATES: usize = 20;

/// Environment variable overriding [`ForestConfig::max_account_updates`].
pub const MAX_ACCOUNT_UPDATES_ENV: &str = "TOKEN_FOREST_MAX_ACCOUNT_UPDATES";

/// Configuration of the bounded forest traversal.
///
/// The bound fixes the circuit shape: every approval pass runs exactly
/// `max_account_updates` iterator steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of iterator steps per approval pass.
    pub max_account_updates: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            max_account_updates: MAX_ACCOUNT_UPDATES,
        }
    }
}

impl ForestConfig {
    /// Create a validated configuration.
    pub fn new(max_account_updates: usize) -> Result<Self> {
        let config = Self { max_account_updates };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Missing, unparsable or zero values fall back to the default.
    pub fn from_env() -> Self {
        let max_account_updates = env::var(MAX_ACCOUNT_UPDATES_ENV)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(MAX_ACCOUNT_UPDATES);

        debug!(max_account_updates, "loaded forest config from environment");
        Self { max_account_updates }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot visit any account update.
    pub fn validate(&self) -> Result<()> {
        if self.max_account_updates == 0 {
            return Err(TokenForestError::InvalidConfig(
                "max_account_updates must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bound_is_protocol_limit() {
        assert_eq!(ForestConfig::default().max_account_updates, 20);
    }

    #[test]
    fn parses_json() {
        let config = ForestConfig::from_json(r#"{"max_account_updates": 7}"#).unwrap();
        assert_eq!(config.max_account_updates, 7);

        let defaulted = ForestConfig::from_json("{}").unwrap();
        assert_eq!(defaulted, ForestConfig::default());
    }

    #[test]
    fn rejects_zero_bound() {
        assert!(matches!(
            ForestConfig::new(0),
            Err(TokenForestError::InvalidConfig(_))
        ));
        assert!(ForestConfig::from_json(r#"{"max_account_updates": 0}"#).is_err());
        assert!(ForestConfig::from_json("not json").is_err());
    }

    #[test]
    fn reads_environment() {
        env::set_var(MAX_ACCOUNT_UPDATES_ENV, "12");
        assert_eq!(ForestConfig::from_env().max_account_updates, 12);

        env::set_var(MAX_ACCOUNT_UPDATES_ENV, "zero");
        assert_eq!(ForestConfig::from_env().max_account_updates, MAX_ACCOUNT_UPDATES);

        env::remove_var(MAX_ACCOUNT_UPDATES_ENV);
        assert_eq!(ForestConfig::from_env(), ForestConfig::default());
    }
}
