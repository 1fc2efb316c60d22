// src/config/mod.rs
//! Configuration system for crypta-vault
//!
//! Central, lazy-loaded global config with TOML + env overrides.
//! The vault directory is process-wide and fixed once loaded.

pub use app::{load, Config, Limits, Vault, CONFIG_ENV, VAULT_DIR_ENV};

mod app;
mod defaults;
