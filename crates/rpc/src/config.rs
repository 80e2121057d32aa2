//! Vault configuration
//!
//! Read from an optional JSON file; every field has a default so partial
//! files are fine. `ZENOPAY_ADMIN` and `ZENOPAY_HIGH_VALUE_THRESHOLD`
//! override the file.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use zenopay_core::{AccountId, Amount, AmountError, ChainId};

pub const ENV_ADMIN: &str = "ZENOPAY_ADMIN";
pub const ENV_HIGH_VALUE_THRESHOLD: &str = "ZENOPAY_HIGH_VALUE_THRESHOLD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Configuration for the payout vault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Accounts holding the admin role
    #[serde(default = "default_admins")]
    pub admins: Vec<AccountId>,

    /// Accounts holding the signer role (multisig owners always do)
    #[serde(default)]
    pub signers: Vec<AccountId>,

    /// Default high-value threshold in ETH for `configure-multisig`
    #[serde(default = "default_high_value_threshold")]
    pub high_value_threshold: Decimal,

    /// Only registered contributors may submit requests
    #[serde(default)]
    pub require_registered_contributors: bool,

    /// Hours before an open signature proposal expires
    #[serde(default = "default_proposal_expiry_hours")]
    pub proposal_expiry_hours: i64,

    /// Chains the bundled mock bridge accepts
    #[serde(default = "default_supported_chains")]
    pub supported_chains: Vec<ChainId>,

    /// Event bus channel capacity
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

fn default_admins() -> Vec<AccountId> {
    AccountId::new("admin").into_iter().collect()
}

fn default_high_value_threshold() -> Decimal {
    Decimal::ONE
}

fn default_proposal_expiry_hours() -> i64 {
    24
}

fn default_supported_chains() -> Vec<ChainId> {
    vec![
        ChainId::Ethereum,
        ChainId::Optimism,
        ChainId::Bnb,
        ChainId::Polygon,
        ChainId::Base,
        ChainId::Arbitrum,
        ChainId::Sepolia,
    ]
}

fn default_bus_capacity() -> usize {
    256
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            admins: default_admins(),
            signers: Vec::new(),
            high_value_threshold: default_high_value_threshold(),
            require_registered_contributors: false,
            proposal_expiry_hours: default_proposal_expiry_hours(),
            supported_chains: default_supported_chains(),
            bus_capacity: default_bus_capacity(),
        }
    }
}

impl VaultConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// File (if given) plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (the process environment in `load`)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_ADMIN) {
            self.admins = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(AccountId::new)
                .collect::<Result<_, _>>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: ENV_ADMIN.to_string(),
                    reason: e.to_string(),
                })?;
        }

        if let Some(raw) = lookup(ENV_HIGH_VALUE_THRESHOLD) {
            self.high_value_threshold =
                raw.trim()
                    .parse::<Decimal>()
                    .map_err(|e| ConfigError::InvalidValue {
                        key: ENV_HIGH_VALUE_THRESHOLD.to_string(),
                        reason: e.to_string(),
                    })?;
        }

        Ok(())
    }

    /// Default threshold in wei
    pub fn high_value_threshold_amount(&self) -> Result<Amount, AmountError> {
        Amount::from_ether(self.high_value_threshold)
    }

    pub fn is_admin(&self, account: &AccountId) -> bool {
        self.admins.contains(account)
    }

    pub fn is_signer(&self, account: &AccountId) -> bool {
        self.signers.contains(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = VaultConfig::default();

        assert_eq!(config.admins, vec![AccountId::new("admin").unwrap()]);
        assert!(config.signers.is_empty());
        assert_eq!(config.high_value_threshold, dec!(1));
        assert!(!config.require_registered_contributors);
        assert_eq!(config.proposal_expiry_hours, 24);
        assert!(config.supported_chains.contains(&ChainId::Bnb));
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{ "high_value_threshold": "2.5", "supported_chains": [1, 56] }"#;
        let config: VaultConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.high_value_threshold, dec!(2.5));
        assert_eq!(config.supported_chains, vec![ChainId::Ethereum, ChainId::Bnb]);
        assert_eq!(config.proposal_expiry_hours, 24); // default
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_ADMIN, "Alice, bob"),
            (ENV_HIGH_VALUE_THRESHOLD, "0.75"),
        ]
        .into_iter()
        .collect();

        let mut config = VaultConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert!(config.is_admin(&AccountId::new("alice").unwrap()));
        assert!(config.is_admin(&AccountId::new("bob").unwrap()));
        assert!(!config.is_admin(&AccountId::new("admin").unwrap()));
        assert_eq!(
            config.high_value_threshold_amount().unwrap(),
            Amount::new(750_000_000_000_000_000)
        );
    }

    #[test]
    fn test_bad_threshold_override() {
        let mut config = VaultConfig::default();
        let result = config.apply_overrides(|key| {
            (key == ENV_HIGH_VALUE_THRESHOLD).then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("zenopay.json");
        std::fs::write(&path, r#"{ "admins": ["root"], "require_registered_contributors": true }"#).unwrap();

        let config = VaultConfig::from_file(&path).unwrap();
        assert!(config.is_admin(&AccountId::new("root").unwrap()));
        assert!(config.require_registered_contributors);
    }
}
