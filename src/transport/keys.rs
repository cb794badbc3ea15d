//! # Encryption Key Provisioning
//!
//! Resolves the configured [`KeySource`] into a 16-byte [`AesKey`], installs
//! it into the radio and wipes the local copy immediately afterwards.
//!
//! Key sources:
//! - `Passphrase`: the first 16 bytes of the passphrase, zero-padded
//! - `Hex`: 32 hex characters
//! - `Stored`: a 16-byte block read from a [`KeyStore`] (persisted
//!   configuration storage)

use crate::constants::AES_KEY_LEN;
use crate::error::TransportError;
use crate::radio::driver::RadioDriver;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-128 key block. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AesKey([u8; AES_KEY_LEN]);

impl AesKey {
    pub fn from_bytes(bytes: [u8; AES_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Zero-pad or truncate `passphrase` to the key width.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let mut key = [0u8; AES_KEY_LEN];
        let raw = passphrase.as_bytes();
        let n = raw.len().min(AES_KEY_LEN);
        key[..n].copy_from_slice(&raw[..n]);
        Self(key)
    }

    pub fn from_hex(hex_key: &str) -> Result<Self, TransportError> {
        let mut key = [0u8; AES_KEY_LEN];
        if let Err(e) = hex::decode_to_slice(hex_key.trim(), &mut key) {
            key.zeroize();
            return Err(TransportError::Key(format!(
                "AES key must be {} hex characters: {e}",
                AES_KEY_LEN * 2
            )));
        }
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; AES_KEY_LEN] {
        &self.0
    }

    pub fn is_zeroed(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesKey(<redacted>)")
    }
}

/// Where the encryption key comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum KeySource {
    Passphrase { passphrase: String },
    Hex { key: String },
    /// Read from the transport's attached [`KeyStore`]
    Stored,
}

/// Persisted configuration storage holding the key block
pub trait KeyStore: Send {
    fn read_key(&mut self, key: &mut [u8; AES_KEY_LEN]) -> Result<(), TransportError>;
}

/// Key block kept in memory (tests, host tools)
pub struct MemoryKeyStore {
    block: [u8; AES_KEY_LEN],
}

impl MemoryKeyStore {
    pub fn new(block: [u8; AES_KEY_LEN]) -> Self {
        Self { block }
    }
}

impl KeyStore for MemoryKeyStore {
    fn read_key(&mut self, key: &mut [u8; AES_KEY_LEN]) -> Result<(), TransportError> {
        key.copy_from_slice(&self.block);
        Ok(())
    }
}

impl Drop for MemoryKeyStore {
    fn drop(&mut self) {
        self.block.zeroize();
    }
}

/// Raw 16-byte key block stored in a file (EEPROM image)
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl KeyStore for FileKeyStore {
    fn read_key(&mut self, key: &mut [u8; AES_KEY_LEN]) -> Result<(), TransportError> {
        let mut raw = fs::read(&self.path)?;
        if raw.len() < AES_KEY_LEN {
            let len = raw.len();
            raw.zeroize();
            return Err(TransportError::Key(format!(
                "key block in {} is {len} bytes, need {AES_KEY_LEN}",
                self.path.display()
            )));
        }
        key.copy_from_slice(&raw[..AES_KEY_LEN]);
        raw.zeroize();
        Ok(())
    }
}

/// Resolve `source` into key material.
pub fn resolve_key(
    source: &KeySource,
    store: Option<&mut (dyn KeyStore + 'static)>,
) -> Result<AesKey, TransportError> {
    match source {
        KeySource::Passphrase { passphrase } => Ok(AesKey::from_passphrase(passphrase)),
        KeySource::Hex { key } => AesKey::from_hex(key),
        KeySource::Stored => {
            let store = store.ok_or_else(|| {
                TransportError::Key("stored key requested but no key store attached".to_string())
            })?;
            let mut block = [0u8; AES_KEY_LEN];
            let result = store.read_key(&mut block);
            let key = AesKey::from_bytes(block);
            block.zeroize();
            result.map(|_| key)
        }
    }
}

/// Install `key` into the driver, then wipe it.
pub fn install_and_wipe<D: RadioDriver + ?Sized>(driver: &mut D, mut key: AesKey) {
    driver.install_key(&key);
    key.zeroize();
    log::info!("Radio encryption enabled");
}
