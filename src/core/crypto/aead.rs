// src/core/crypto/aead.rs
//! ChaCha20-Poly1305 adapter with empty associated data
//!
//! Sealed output is `ciphertext ‖ 16-byte tag`. Nonces are 12 bytes and are
//! drawn fresh from the thread-local CSPRNG for every seal; nothing tracks
//! them across calls.

use std::fmt;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;

use crate::aliases::MasterKey32;
use crate::consts::NONCE_SIZE;
use crate::error::{CoreError, Result};

pub type NonceBytes = [u8; NONCE_SIZE];

/// A keyed AEAD instance, reused across every chunk of one object
#[derive(Clone)]
pub struct Cipher {
    aead: ChaCha20Poly1305,
}

impl Cipher {
    /// Build a cipher from raw key bytes; fails fast unless exactly 32 bytes
    pub fn new(key: &[u8]) -> Result<Self> {
        let aead = ChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| CoreError::InvalidKey { len: key.len() })?;
        Ok(Self { aead })
    }

    pub fn from_master_key(key: &MasterKey32) -> Self {
        let aead = ChaCha20Poly1305::new(Key::from_slice(key.expose_secret().as_slice()));
        Self { aead }
    }

    pub fn seal(&self, nonce: &NonceBytes, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.aead
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| CoreError::Encryption)
    }

    /// Every failure collapses into the same opaque `Authentication` error
    pub fn open(&self, nonce: &NonceBytes, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.aead
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CoreError::Authentication)
    }

    /// Seal under a freshly generated nonce and hand the nonce back for framing
    pub fn seal_fresh(&self, plaintext: &[u8]) -> Result<(NonceBytes, Vec<u8>)> {
        let nonce = generate_nonce();
        let ciphertext = self.seal(&nonce, plaintext)?;
        Ok((nonce, ciphertext))
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}

#[inline]
pub fn generate_nonce() -> NonceBytes {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce);
    nonce
}

/// One-off seal with a raw key
pub fn seal(key: &[u8], nonce: &NonceBytes, plaintext: &[u8]) -> Result<Vec<u8>> {
    Cipher::new(key)?.seal(nonce, plaintext)
}

/// One-off open with a raw key
pub fn open(key: &[u8], nonce: &NonceBytes, ciphertext: &[u8]) -> Result<Vec<u8>> {
    Cipher::new(key)?.open(nonce, ciphertext)
}
