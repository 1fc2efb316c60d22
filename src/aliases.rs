// src/aliases.rs
//! Re-exports secure-gate's ergonomic secret types
//!
//! These are the canonical secret-holding types used throughout crypta-vault.

pub use secure_gate::{dynamic_alias, fixed_alias, SecureConversionsExt, SecureRandomExt};

// Fixed-size secrets
fixed_alias!(MasterKey32, 32); // 256-bit ChaCha20-Poly1305 vault key

// Dynamic secrets
dynamic_alias!(PlainText, Vec<u8>); // Decrypted object bytes, zeroized on drop
