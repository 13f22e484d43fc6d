use crate::errors::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SESSION_NAME: &str = "SESSIONID";
pub const DEFAULT_NAMESPACE: &str = "SessionAbstraction";
/// Idle lifetime of a committed session, in seconds
pub const DEFAULT_TTL_SECS: u64 = 1440;

/// Configuration for the session transport and the stores opened on it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the cookie (or request parameter) carrying the session id
    pub session_name: String,
    /// Region used by stores that do not name their own
    pub default_namespace: String,
    /// `None` keeps committed sessions until they are deleted
    pub ttl_secs: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_name: DEFAULT_SESSION_NAME.to_string(),
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            ttl_secs: Some(DEFAULT_TTL_SECS),
        }
    }
}

/// Partial configuration as read from a file, used by [`SessionConfig::merge`]
#[derive(Debug, Clone, Default)]
pub struct SessionConfigOverrides {
    pub session_name: Option<String>,
    pub default_namespace: Option<String>,
    pub ttl_secs: Option<u64>,
}

impl SessionConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> SessionResult<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                SessionError::Config(format!("Failed to read config file: {}", e))
            })?;

            let config: Self = toml::from_str(&content).map_err(|e| {
                SessionError::Config(format!("Failed to parse config file: {}", e))
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> SessionResult<()> {
        let content = toml::to_string(self).map_err(|e| {
            SessionError::Config(format!("Failed to serialize config: {}", e))
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;

        Ok(())
    }

    /// Merges overrides into this config, preferring the override values if present
    pub fn merge(&self, other: &SessionConfigOverrides) -> Self {
        Self {
            session_name: other
                .session_name
                .clone()
                .unwrap_or_else(|| self.session_name.clone()),
            default_namespace: other
                .default_namespace
                .clone()
                .unwrap_or_else(|| self.default_namespace.clone()),
            ttl_secs: other.ttl_secs.or(self.ttl_secs),
        }
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> SessionResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        SessionError::Config("Could not determine home directory".to_string())
    })?;

    Ok(home_dir.join(".config").join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> SessionResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("session.toml"))
}
