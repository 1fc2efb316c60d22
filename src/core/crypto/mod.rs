// src/core/crypto/mod.rs
//! Pure cryptographic operations, no filesystem access
//!
//! `aead` wraps the cipher; `codec` frames byte streams into sealed chunks
//! on top of it. Everything here works on readers, writers and buffers.
mod aead;
mod codec;

pub use aead::{generate_nonce, open, seal, Cipher, NonceBytes};
pub use codec::{
    decode_container, decode_single_shot, decode_stream, decrypt_to_vec, encode_single_shot,
    encode_stream, encrypt_to_vec, single_shot_nonce, Decoded, StreamSummary,
};
