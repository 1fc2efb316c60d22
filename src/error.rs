// src/error.rs
//! Public error type for the entire crate

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid master key: expected 32 bytes, got {len}")]
    InvalidKey { len: usize },

    /// Never says whether the key, the data, or its length was at fault
    #[error("authentication failed")]
    Authentication,

    #[error("encryption failed")]
    Encryption,

    #[error("corrupt stream framing: {0}")]
    CorruptFraming(String),

    #[error("object too short: {len} bytes is smaller than one nonce")]
    TooShort { len: usize },

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid object name: {0:?}")]
    InvalidName(String),

    #[error("another write is in progress for {}", .0.display())]
    WriteInProgress(PathBuf),

    #[error("IO error while {stage}: {source}")]
    Io {
        stage: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Attach the failing stage to an I/O result
pub trait IoStage<T> {
    fn stage(self, stage: &'static str) -> Result<T>;
}

impl<T> IoStage<T> for io::Result<T> {
    fn stage(self, stage: &'static str) -> Result<T> {
        self.map_err(|source| CoreError::Io { stage, source })
    }
}

impl CoreError {
    /// True for the errors a tampered or foreign object can produce on read
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            CoreError::Authentication | CoreError::CorruptFraming(_) | CoreError::TooShort { .. }
        )
    }
}
