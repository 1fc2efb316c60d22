// src/config/defaults.rs
use std::path::PathBuf;

use crate::config::app::{Limits, Vault};
use crate::consts::{DEFAULT_VAULT_DIR, LARGE_FILE_THRESHOLD};

impl Default for Vault {
    fn default() -> Self {
        Vault {
            dir: PathBuf::from(DEFAULT_VAULT_DIR),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            large_file_threshold: LARGE_FILE_THRESHOLD,
        }
    }
}
