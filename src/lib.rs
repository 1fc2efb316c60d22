// src/lib.rs
//! crypta-vault: a local encrypted object vault
//!
//! Features:
//! - ChaCha20-Poly1305 sealing with a fresh random nonce per call
//! - Single-shot containers for small objects, 64 KiB sealed chunks for large ones
//! - Crash-safe writes: `.partial` file, fsync, atomic rename
//! - Flat directory layout (`<name>.crypta`), no separate index

pub mod aliases;
pub mod config;
pub mod consts;
pub mod core;
pub mod enums;
pub mod error;

// Re-export everything users need at the crate root
pub use aliases::{MasterKey32, PlainText, SecureConversionsExt, SecureRandomExt};
pub use config::{load as load_config, Config};
pub use crate::core::{
    decrypt_to_vec, encrypt_to_vec, generate_key, key_from_hex, key_from_slice, AtomicWriter,
    Cipher, ObjectInfo, ObjectStore,
};
pub use enums::ContainerFormat;
pub use error::{CoreError, Result as CoreResult};
