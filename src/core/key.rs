// src/core/key.rs
//! Master key construction helpers
//!
//! The key is always supplied by the caller; nothing here persists it.

use crate::aliases::{MasterKey32, SecureRandomExt};
use crate::consts::KEY_SIZE;
use crate::error::{CoreError, Result};

/// Generate a new random 256-bit master key
#[inline]
pub fn generate_key() -> MasterKey32 {
    MasterKey32::random()
}

/// Wrap caller-supplied key bytes: exactly 32 or `InvalidKey`
pub fn key_from_slice(bytes: &[u8]) -> Result<MasterKey32> {
    let raw: [u8; KEY_SIZE] = bytes
        .try_into()
        .map_err(|_| CoreError::InvalidKey { len: bytes.len() })?;
    Ok(MasterKey32::new(raw))
}

/// Parse a 64-character hex key
pub fn key_from_hex(encoded: &str) -> Result<MasterKey32> {
    let encoded = encoded.trim();
    let bytes = hex::decode(encoded).map_err(|_| CoreError::InvalidKey {
        len: encoded.len() / 2,
    })?;
    key_from_slice(&bytes)
}
