// src/core/mod.rs
pub mod crypto;
pub mod key;
pub mod store;
pub mod writer;

pub use crypto::*;
pub use key::*;
pub use store::*;
pub use writer::*;

// Keep only the absolute top-level public API here if needed
pub type Result<T> = std::result::Result<T, crate::error::CoreError>;
