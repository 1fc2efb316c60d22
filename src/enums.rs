// src/enums.rs
//! Public enum types used throughout the crate

use crate::consts::STREAM_MAGIC;

/// The two wire shapes an object container can take
///
/// Resolved by a single peek at the first four bytes: the streaming magic
/// selects [`ContainerFormat::Streaming`], anything else (including fewer
/// than four bytes) is attempted as [`ContainerFormat::SingleShot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// `nonce ‖ ciphertext‖tag`, one AEAD call over the whole plaintext
    SingleShot,
    /// `"EV1\0"` followed by length-prefixed sealed chunks until EOF
    Streaming,
}

impl ContainerFormat {
    /// Classify a container by its leading bytes
    pub fn sniff(header: &[u8]) -> Self {
        if header.starts_with(STREAM_MAGIC) {
            ContainerFormat::Streaming
        } else {
            ContainerFormat::SingleShot
        }
    }

    /// Pick the encode path for a plaintext of `size` bytes
    pub fn for_size(size: u64, large_file_threshold: u64) -> Self {
        if size > large_file_threshold {
            ContainerFormat::Streaming
        } else {
            ContainerFormat::SingleShot
        }
    }
}
