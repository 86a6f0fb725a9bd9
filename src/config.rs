//! Configuration management with validation and defaults.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for the settlement core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CasinoConfig {
    pub limits: BetLimits,
    pub settlement: SettlementConfig,
    pub storage: StorageConfig,
}

impl Default for CasinoConfig {
    fn default() -> Self {
        Self {
            limits: BetLimits::default(),
            settlement: SettlementConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Platform-wide stake bounds, applied before any wallet access.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BetLimits {
    pub min_bet: Decimal,
    pub max_bet: Decimal,
    /// Bound for a single deposit or withdrawal.
    pub max_transfer: Decimal,
}

impl Default for BetLimits {
    fn default() -> Self {
        Self {
            min_bet: dec!(0.01),
            max_bet: dec!(100000),
            max_transfer: dec!(100000),
        }
    }
}

/// Timing bounds for one settlement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Maximum wait for exclusive wallet access before giving up.
    pub lease_timeout_ms: u64,
    /// Maximum wait for the atomic commit to land.
    pub commit_timeout_ms: u64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            lease_timeout_ms: 5_000,
            commit_timeout_ms: 5_000,
        }
    }
}

/// RocksDB tuning for the ledger store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: String,
    pub write_buffer_size_mb: usize,
    pub max_write_buffer_number: i32,
    pub target_file_size_mb: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_directory: "./DB/ledger_data".to_string(),
            write_buffer_size_mb: 128,
            max_write_buffer_number: 4,
            target_file_size_mb: 128,
        }
    }
}

impl CasinoConfig {
    /// Production defaults: durable storage path, conservative timeouts.
    pub fn production() -> Self {
        Self::default()
    }

    /// Aggressive timeouts and a throwaway data directory for tests.
    pub fn testing() -> Self {
        Self {
            settlement: SettlementConfig {
                lease_timeout_ms: 500,
                commit_timeout_ms: 500,
            },
            storage: StorageConfig {
                data_directory: "./DB/test_ledger".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate logical consistency of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.min_bet <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue(
                "min_bet must be > 0".to_string(),
            ));
        }
        if self.limits.max_bet < self.limits.min_bet {
            return Err(ConfigError::InvalidValue(
                "max_bet must be >= min_bet".to_string(),
            ));
        }
        if self.limits.max_transfer <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue(
                "max_transfer must be > 0".to_string(),
            ));
        }
        if self.settlement.lease_timeout_ms == 0 || self.settlement.commit_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "settlement timeouts must be > 0".to_string(),
            ));
        }
        if self.storage.write_buffer_size_mb == 0 {
            return Err(ConfigError::InvalidValue(
                "write_buffer_size_mb must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn lease_timeout(&self) -> Duration {
        Duration::from_millis(self.settlement.lease_timeout_ms)
    }

    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.settlement.commit_timeout_ms)
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(CasinoConfig::default().validate().is_ok());
    }

    #[test]
    fn test_testing_config_is_valid() {
        assert!(CasinoConfig::testing().validate().is_ok());
    }

    #[test]
    fn test_invalid_bet_bounds_rejected() {
        let mut config = CasinoConfig::default();
        config.limits.max_bet = dec!(0.001);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = CasinoConfig::default();
        config.settlement.lease_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_conversions() {
        let config = CasinoConfig::default();
        assert_eq!(config.lease_timeout(), Duration::from_millis(5_000));
        assert_eq!(config.commit_timeout(), Duration::from_millis(5_000));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CasinoConfig::default();
        let raw = toml::to_string(&config).unwrap();
        let parsed: CasinoConfig = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.limits.max_bet, config.limits.max_bet);
        assert_eq!(
            parsed.settlement.lease_timeout_ms,
            config.settlement.lease_timeout_ms
        );
    }
}
