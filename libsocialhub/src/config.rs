//! Configuration management for SocialHub

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::credentials::CredentialConfig;
use crate::error::{ConfigError, Result};
use crate::platforms::{bluesky, threads, x};
use crate::types::PlatformId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub credentials: CredentialConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub bluesky: BlueskyConfig,
    #[serde(default)]
    pub x: XConfig,
    #[serde(default)]
    pub threads: ThreadsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Upper bound on a single platform publish, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl PublishConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Platforms used when the caller doesn't pick any
    #[serde(default = "default_platforms")]
    pub platforms: Vec<PlatformId>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            platforms: default_platforms(),
        }
    }
}

fn default_platforms() -> Vec<PlatformId> {
    PlatformId::ALL.to_vec()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueskyConfig {
    #[serde(default = "default_pds_url")]
    pub pds_url: String,
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            pds_url: default_pds_url(),
        }
    }
}

fn default_pds_url() -> String {
    bluesky::DEFAULT_PDS_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XConfig {
    #[serde(default = "default_x_api_url")]
    pub api_url: String,
}

impl Default for XConfig {
    fn default() -> Self {
        Self {
            api_url: default_x_api_url(),
        }
    }
}

fn default_x_api_url() -> String {
    x::DEFAULT_API_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadsConfig {
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
}

impl Default for ThreadsConfig {
    fn default() -> Self {
        Self {
            graph_url: default_graph_url(),
        }
    }
}

fn default_graph_url() -> String {
    threads::DEFAULT_GRAPH_URL.to_string()
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing config file is not an error: defaults are used.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.publish.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "publish.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }

        for (field, url) in [
            ("bluesky.pds_url", &self.bluesky.pds_url),
            ("x.api_url", &self.x.api_url),
            ("threads.graph_url", &self.threads.graph_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("'{}' is not an http(s) URL", url),
                }
                .into());
            }
        }

        if self.credentials.path.is_empty() {
            return Err(ConfigError::MissingField("credentials.path".to_string()).into());
        }

        Ok(())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SOCIALHUB_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("socialhub").join("config.toml"))
}
