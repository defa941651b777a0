//! Engine configuration
//!
//! Loaded from TOML, optionally overridden from the environment, then
//! validated before use.
//!
//! ```toml
//! base_token = "0x000000000000000000000000000000000000800A"
//! warn_on_unlimited = true
//! ```

use crate::errors::{SsoError, SsoResult};
use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Native token system contract on zkSync chains
pub const DEFAULT_BASE_TOKEN: Address = address!("000000000000000000000000000000000000800a");

/// Environment variable overriding [`EngineConfig::base_token`]
pub const BASE_TOKEN_ENV: &str = "SSO_BASE_TOKEN";

/// Environment variable overriding [`EngineConfig::warn_on_unlimited`]
pub const WARN_ON_UNLIMITED_ENV: &str = "SSO_WARN_ON_UNLIMITED";

/// Configuration shared by the exposure and reconciliation engines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Address under which native value and fees are accounted
    pub base_token: Address,
    /// Emit a warning whenever an aggregation yields an unlimited entry
    pub warn_on_unlimited: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_token: DEFAULT_BASE_TOKEN,
            warn_on_unlimited: true,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> SsoResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> SsoResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded engine configuration");
        Ok(config)
    }

    /// Apply `SSO_*` environment overrides
    pub fn merge_with_env(&mut self) -> SsoResult<()> {
        self.merge_with_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn merge_with_vars<F>(&mut self, var: F) -> SsoResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var(BASE_TOKEN_ENV) {
            self.base_token = value.trim().parse().map_err(|e| {
                SsoError::invalid_config(format!("{BASE_TOKEN_ENV}={value:?} is not an address: {e}"))
            })?;
        }
        if let Some(value) = var(WARN_ON_UNLIMITED_ENV) {
            self.warn_on_unlimited = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(SsoError::invalid_config(format!(
                        "{WARN_ON_UNLIMITED_ENV}={value:?} is not a boolean"
                    )))
                }
            };
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> SsoResult<()> {
        if self.base_token == Address::ZERO {
            return Err(SsoError::invalid_config(
                "base token cannot be the zero address",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.base_token, DEFAULT_BASE_TOKEN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("warn_on_unlimited = false").unwrap();
        assert_eq!(config.base_token, DEFAULT_BASE_TOKEN);
        assert!(!config.warn_on_unlimited);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(EngineConfig::from_toml_str("base_tokn = \"0x00\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_token = \"0x1111111111111111111111111111111111111111\""
        )
        .unwrap();
        let config = EngineConfig::load_from_file(file.path()).unwrap();
        assert_eq!(
            config.base_token,
            address!("1111111111111111111111111111111111111111")
        );
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = EngineConfig::load_from_file(Path::new("/nonexistent/sso.toml")).unwrap_err();
        assert!(matches!(err, SsoError::NotFound { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (BASE_TOKEN_ENV, "0x2222222222222222222222222222222222222222"),
            (WARN_ON_UNLIMITED_ENV, "no"),
        ]
        .into_iter()
        .collect();
        let mut config = EngineConfig::default();
        config
            .merge_with_vars(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(
            config.base_token,
            address!("2222222222222222222222222222222222222222")
        );
        assert!(!config.warn_on_unlimited);

        let mut config = EngineConfig::default();
        let err = config
            .merge_with_vars(|k| (k == BASE_TOKEN_ENV).then(|| "not-an-address".to_string()))
            .unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn test_zero_base_token_invalid() {
        let config = EngineConfig {
            base_token: Address::ZERO,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
