//! Exchange configuration
//!
//! `ExchangeConfig` is the mutable administrative state created by
//! `initialize`. `ExchangeSettings` holds the static trading parameters the
//! exchange is deployed with, loaded from JSON.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::fee::FeeSchedule;
use types::ids::AccountName;

use crate::errors::ConfigError;
use crate::security::{AccessControl, PauseGuard};

/// Administrative state of an initialized exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub access: AccessControl,
    /// Receives every trading fee
    pub fee_recipient: AccountName,
    /// Optional account outgoing transfers are routed through
    pub transfer_proxy: Option<AccountName>,
    /// Running flag; the exchange starts stopped
    pub running: PauseGuard,
}

impl ExchangeConfig {
    pub fn new(admin: AccountName, fee_recipient: AccountName) -> Self {
        Self {
            access: AccessControl::new(admin),
            fee_recipient,
            transfer_proxy: None,
            running: PauseGuard::paused(),
        }
    }

    pub fn admin(&self) -> &AccountName {
        self.access.admin()
    }

    pub fn is_running(&self) -> bool {
        !self.running.is_paused()
    }
}

/// Static trading parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeSettings {
    pub fee: FeeSchedule,
    /// Shortest finite TTL accepted for a new order
    pub min_ttl_secs: u32,
    /// Minimum order size in synthetic units; base orders use its spot value
    pub min_synthetic_trade: Decimal,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            fee: FeeSchedule::default(),
            min_ttl_secs: 60,
            min_synthetic_trade: Decimal::from(1024),
        }
    }
}

impl ExchangeSettings {
    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fee.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "fee rate must be within [0, 1] and minimum fees non-negative, got {:?}",
                self.fee
            )));
        }
        if self.min_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "min_ttl_secs must be at least 1".to_string(),
            ));
        }
        if self.min_synthetic_trade <= Decimal::ZERO || !self.min_synthetic_trade.fract().is_zero() {
            return Err(ConfigError::Invalid(format!(
                "min_synthetic_trade must be a positive whole number, got {}",
                self.min_synthetic_trade
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config_is_stopped() {
        let config = ExchangeConfig::new(AccountName::from("admin"), AccountName::from("fees"));
        assert!(!config.is_running());
        assert_eq!(config.admin(), &AccountName::from("admin"));
        assert!(config.transfer_proxy.is_none());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ExchangeSettings::default();
        assert_eq!(settings.min_ttl_secs, 60);
        assert_eq!(settings.min_synthetic_trade, Decimal::from(1024));
        assert_eq!(settings.fee.rate, Decimal::new(1, 3));
    }

    #[test]
    fn test_settings_from_partial_json() {
        let settings = ExchangeSettings::from_json_str(
            r#"{ "min_ttl_secs": 300, "fee": { "rate": "0.002", "min_base_fee": "0.0001" } }"#,
        )
        .unwrap();
        assert_eq!(settings.min_ttl_secs, 300);
        assert_eq!(settings.fee.rate, Decimal::new(2, 3));
        assert_eq!(settings.fee.min_base_fee, Decimal::new(1, 4));
        assert_eq!(settings.fee.min_synthetic_fee, Decimal::ZERO);
        assert_eq!(settings.min_synthetic_trade, Decimal::from(1024));
    }

    #[test]
    fn test_settings_rejects_invalid_fee() {
        let err = ExchangeSettings::from_json_str(r#"{ "fee": { "rate": "1.5" } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_settings_rejects_zero_min_ttl() {
        let err = ExchangeSettings::from_json_str(r#"{ "min_ttl_secs": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("min_ttl_secs")));
        assert!(ExchangeSettings::from_json_str(r#"{ "min_ttl_secs": 1 }"#).is_ok());
    }

    #[test]
    fn test_settings_rejects_malformed_json() {
        let err = ExchangeSettings::from_json_str("{ min_ttl_secs: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
