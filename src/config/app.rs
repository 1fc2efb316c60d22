// src/config/app.rs
use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::DEFAULT_CONFIG_FILE;
use crate::error::{CoreError, IoStage, Result};

/// Points at an explicit TOML config file
pub const CONFIG_ENV: &str = "CRYPTA_CONFIG";

/// Overrides `vault.dir` regardless of what the file says
pub const VAULT_DIR_ENV: &str = "CRYPTA_VAULT_DIR";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vault: Vault,
    pub limits: Limits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vault {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Plaintext sizes above this many bytes take the streaming path
    pub large_file_threshold: u64,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let conf: Config = toml::from_str(content)?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).stage("reading config file")?;
        Self::from_toml_str(&content)
    }

    /// Resolve the config file, parse it, then apply env overrides
    pub fn from_env() -> Result<Self> {
        let mut conf = match resolve_config_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading config");
                Self::from_path(&path)?
            }
            Some(path) => {
                warn!(path = %path.display(), "config file not found, using built-in defaults");
                Config::default()
            }
            None => Config::default(),
        };

        if let Ok(dir) = env::var(VAULT_DIR_ENV) {
            conf.vault.dir = PathBuf::from(dir);
        }

        conf.validate()?;
        Ok(conf)
    }

    fn validate(&self) -> Result<()> {
        if self.vault.dir.as_os_str().is_empty() {
            return Err(CoreError::Config("vault.dir must not be empty".into()));
        }
        Ok(())
    }
}

/// `$CRYPTA_CONFIG`, then `./crypta.toml`, then the user config directory
fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("crypta").join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.exists())
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load config once per process; later calls return the cached value
pub fn load() -> Result<&'static Config> {
    if let Some(conf) = CONFIG.get() {
        return Ok(conf);
    }
    let conf = Config::from_env()?;
    Ok(CONFIG.get_or_init(|| conf))
}
