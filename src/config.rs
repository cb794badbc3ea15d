//! # Transport Configuration
//!
//! The transport is configured from JSON:
//!
//! ```json
//! {
//!   "frequency_hz": 868000000,
//!   "variant": "buffered",
//!   "rx_buffer_size": 20,
//!   "network_id": 100,
//!   "role": "node",
//!   "atc": { "enabled": true, "target_rssi_dbm": -80 },
//!   "retries": 5,
//!   "retry_timeout_ms": 200,
//!   "encryption": { "source": "passphrase", "passphrase": "my-secret" }
//! }
//! ```
//!
//! Every field is optional and falls back to the defaults in
//! [`crate::constants`].

use crate::constants::*;
use crate::error::TransportError;
use crate::radio::driver::{RadioSettings, RetryPolicy};
use crate::transport::keys::KeySource;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which receive path the transport uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverVariant {
    /// Frames decoded from the radio interrupt into the receive queue
    Buffered,
    /// Frames polled synchronously from the driver
    Polling,
}

/// Role of this node on the radio network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Node,
    /// Network concentrator; never runs automatic transmit-power control
    Gateway,
}

/// Automatic transmit-power control settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtcConfig {
    pub enabled: bool,
    pub target_rssi_dbm: i16,
}

impl Default for AtcConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_rssi_dbm: DEFAULT_ATC_TARGET_RSSI_DBM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Carrier frequency in Hz
    pub frequency_hz: u32,
    pub variant: DriverVariant,
    /// Receive queue capacity in frames (buffered variant)
    pub rx_buffer_size: usize,
    pub network_id: u8,
    pub role: NodeRole,
    pub atc: AtcConfig,
    pub retries: u8,
    pub retry_timeout_ms: u16,
    /// Encryption key source; `None` leaves encryption off
    pub encryption: Option<KeySource>,
    /// RFM69HW/HCW high-power module
    pub high_power: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            variant: DriverVariant::Buffered,
            rx_buffer_size: DEFAULT_RX_BUFFER_SIZE,
            network_id: DEFAULT_NETWORK_ID,
            role: NodeRole::Node,
            atc: AtcConfig::default(),
            retries: DEFAULT_RETRIES,
            retry_timeout_ms: DEFAULT_RETRY_TIMEOUT_MS,
            encryption: None,
            high_power: false,
        }
    }
}

impl TransportConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, TransportError> {
        let config: TransportConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded transport config from {}", path.as_ref().display());
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), TransportError> {
        if self.rx_buffer_size == 0 {
            return Err(TransportError::InvalidConfig(
                "rx_buffer_size must be at least 1".to_string(),
            ));
        }
        // RFM69 synthesiser bands: 290-340, 424-510 and 862-1020 MHz
        let mhz = self.frequency_hz / 1_000_000;
        if !matches!(mhz, 290..=339 | 424..=509 | 862..=1019) {
            return Err(TransportError::InvalidConfig(format!(
                "frequency {} Hz outside the RFM69 bands",
                self.frequency_hz
            )));
        }
        if self.atc.target_rssi_dbm > 0 || self.atc.target_rssi_dbm < -120 {
            return Err(TransportError::InvalidConfig(format!(
                "ATC target {} dBm out of range (-120..=0)",
                self.atc.target_rssi_dbm
            )));
        }
        Ok(())
    }

    pub fn radio_settings(&self) -> RadioSettings {
        RadioSettings {
            frequency_hz: self.frequency_hz,
            network_id: self.network_id,
            high_power: self.high_power,
        }
    }

    /// Retry policy for acknowledged sends
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, self.retry_timeout_ms)
    }

    /// ATC runs only on nodes with ATC enabled, never on a gateway.
    pub fn atc_active(&self) -> bool {
        self.atc.enabled && self.role != NodeRole::Gateway
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.frequency_hz, 868_000_000);
        assert_eq!(config.rx_buffer_size, DEFAULT_RX_BUFFER_SIZE);
        assert_eq!(config.variant, DriverVariant::Buffered);
        assert!(config.atc_active());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gateway_disables_atc() {
        let config = TransportConfig {
            role: NodeRole::Gateway,
            ..Default::default()
        };
        assert!(!config.atc_active());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = TransportConfig::from_json_str(r#"{ "variant": "polling" }"#).unwrap();
        assert_eq!(config.variant, DriverVariant::Polling);
        assert_eq!(config.retries, DEFAULT_RETRIES);
        assert_eq!(config.atc.target_rssi_dbm, DEFAULT_ATC_TARGET_RSSI_DBM);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(TransportConfig::from_json_str(r#"{ "rx_buffer_size": 0 }"#).is_err());
        assert!(TransportConfig::from_json_str(r#"{ "frequency_hz": 2400000000 }"#).is_err());
        assert!(TransportConfig::from_json_str(r#"{ "atc": { "target_rssi_dbm": 10 } }"#).is_err());
        assert!(matches!(
            TransportConfig::from_json_str("{ not json"),
            Err(TransportError::Json(_))
        ));
    }
}
