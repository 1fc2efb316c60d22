// src/consts.rs
//! Shared constants: container format parameters and on-disk defaults

/// Magic header that marks the streaming container form
pub const STREAM_MAGIC: &[u8; MAGIC_SIZE] = b"EV1\x00";

pub const MAGIC_SIZE: usize = 4;

/// Plaintext block size used when encoding the streaming form (64 KiB)
// Decode never relies on this, only on the explicit length prefix
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Sources strictly larger than this are encrypted through the streaming path (10 MiB)
pub const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// ChaCha20-Poly1305 key size in bytes
pub const KEY_SIZE: usize = 32;

/// ChaCha20-Poly1305 nonce size in bytes
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size in bytes
pub const TAG_SIZE: usize = 16;

/// Width of the little-endian ciphertext length that prefixes each sealed chunk
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Extension of every stored object file
pub const OBJECT_EXTENSION: &str = "crypta";

/// Suffix appended to an object path while it is being written
pub const PARTIAL_SUFFIX: &str = "partial";

/// Default vault directory, relative to the working directory
pub const DEFAULT_VAULT_DIR: &str = "crypta";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "crypta.toml";
