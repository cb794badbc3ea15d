//! # Configuration and Key Storage Tests
//!
//! JSON configuration files and file-backed key storage.

use rfm69_transport::transport::keys::resolve_key;
use rfm69_transport::{
    DriverVariant, FileKeyStore, KeySource, KeyStore, NodeRole, TransportConfig, TransportError,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_full_config_file() {
    let file = write_temp(
        br#"{
            "frequency_hz": 433000000,
            "variant": "polling",
            "rx_buffer_size": 8,
            "network_id": 7,
            "role": "gateway",
            "atc": { "enabled": false, "target_rssi_dbm": -90 },
            "retries": 3,
            "retry_timeout_ms": 100,
            "encryption": { "source": "hex", "key": "000102030405060708090a0b0c0d0e0f" },
            "high_power": true
        }"#,
    );

    let config = TransportConfig::from_file(file.path()).unwrap();
    assert_eq!(config.frequency_hz, 433_000_000);
    assert_eq!(config.variant, DriverVariant::Polling);
    assert_eq!(config.rx_buffer_size, 8);
    assert_eq!(config.role, NodeRole::Gateway);
    assert!(!config.atc_active());
    assert_eq!(config.retry_policy().retries, 3);
    assert!(config.radio_settings().high_power);
    assert!(matches!(config.encryption, Some(KeySource::Hex { .. })));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TransportConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, TransportError::Io(_)));
}

#[test]
fn test_malformed_file_is_json_error() {
    let file = write_temp(b"{ \"frequency_hz\": ");
    let err = TransportConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, TransportError::Json(_)));
}

#[test]
fn test_out_of_band_frequency_rejected() {
    let file = write_temp(br#"{ "frequency_hz": 2400000000 }"#);
    let err = TransportConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, TransportError::InvalidConfig(_)));
}

#[test]
fn test_config_serializes_back() {
    let config = TransportConfig {
        encryption: Some(KeySource::Passphrase {
            passphrase: "abc".to_string(),
        }),
        ..TransportConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"source\":\"passphrase\""));
    assert_eq!(TransportConfig::from_json_str(&json).unwrap(), config);
}

mod file_key_store {
    use super::*;

    #[test]
    fn test_reads_key_block() {
        let block: Vec<u8> = (0u8..16).collect();
        let file = write_temp(&block);

        let mut store = FileKeyStore::new(file.path());
        let mut key = [0u8; 16];
        store.read_key(&mut key).unwrap();
        assert_eq!(key.as_slice(), block.as_slice());
    }

    /// Only the first 16 bytes of a larger image are used
    #[test]
    fn test_longer_image_truncated() {
        let mut image = vec![0x11u8; 16];
        image.extend_from_slice(&[0xFF; 16]);
        let file = write_temp(&image);

        let mut store = FileKeyStore::new(file.path());
        let key = resolve_key(&KeySource::Stored, Some(&mut store)).unwrap();
        assert_eq!(key.as_bytes(), &[0x11u8; 16]);
    }

    #[test]
    fn test_short_image_rejected() {
        let file = write_temp(&[1, 2, 3]);
        let mut store = FileKeyStore::new(file.path());
        let mut key = [0u8; 16];
        let err = store.read_key(&mut key).unwrap_err();
        assert!(matches!(err, TransportError::Key(_)));
    }
}
