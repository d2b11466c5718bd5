//! Gate configuration
//!
//! Stored as JSON. Every field has a default, so partial files are accepted.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AuthError, Result};
use crate::lockout::LockoutPolicy;
use crate::policy::PinPolicy;
use crate::session::{SessionConfig, SESSION_TIMEOUT};

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "PINLOCK_CONFIG";

/// Configuration directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "pinlock";

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.json";

/// Gate configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Directory holding the credential and session records
    pub storage_dir: PathBuf,

    /// Wallet file whose presence marks the profile as initialized
    pub wallet_path: PathBuf,

    /// Session lifetime in seconds
    pub session_timeout_secs: u64,

    /// Accepted PIN shape
    pub pin: PinPolicy,

    /// Failed-attempt lockout
    pub lockout: LockoutPolicy,
}

impl Default for GateConfig {
    fn default() -> Self {
        let data_dir = Self::default_data_dir();
        Self {
            wallet_path: data_dir.join("wallet.json"),
            storage_dir: data_dir,
            session_timeout_secs: SESSION_TIMEOUT.as_secs(),
            pin: PinPolicy::default(),
            lockout: LockoutPolicy::default(),
        }
    }
}

impl GateConfig {
    fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
    }

    /// Config file path: `$PINLOCK_CONFIG`, else `<config dir>/pinlock/config.json`
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(CONFIG_DIR_NAME)
                    .join(CONFIG_FILE_NAME)
            })
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| AuthError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AuthError::Config(format!("failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or unusable
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        Self::load(path).unwrap_or_else(|e| {
            warn!("{e}; using default configuration");
            Self::default()
        })
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| AuthError::Config(e.to_string()))?;
        }
        let content =
            serde_json::to_string_pretty(self).map_err(|e| AuthError::Config(e.to_string()))?;
        fs::write(path, content).map_err(|e| AuthError::Config(e.to_string()))?;
        Ok(())
    }

    /// Reject settings that would make the gate unusable
    pub fn validate(&self) -> Result<()> {
        if self.session_timeout_secs == 0 {
            return Err(AuthError::Config("session_timeout_secs must be positive".into()));
        }
        if self.pin.min_length == 0 || self.pin.min_length > self.pin.max_length {
            return Err(AuthError::Config(format!(
                "invalid PIN length range {}-{}",
                self.pin.min_length, self.pin.max_length
            )));
        }
        if self.lockout.threshold == 0 {
            return Err(AuthError::Config("lockout threshold must be positive".into()));
        }
        Ok(())
    }

    /// Session settings derived from this config
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            timeout: Duration::from_secs(self.session_timeout_secs),
        }
    }
}
