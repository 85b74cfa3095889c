//! Ranking configuration parser (TOML).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Plugin timeout used when the config omits one.
pub const DEFAULT_PLUGIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RankingConfig {
    #[serde(default)]
    pub plugin: PluginConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Ranking plugin URL. External ranking is disabled when absent.
    pub endpoint: Option<String>,
    /// Per-request timeout (e.g. "500ms", "2s").
    pub timeout: Option<String>,
    /// Initial value of the runtime plugin switch.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: None,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FallbackConfig {
    /// Hosts with at least this many starting tasks are deprioritized.
    /// Zero or negative disables the penalty.
    #[serde(default)]
    pub max_starting_tasks_per_host: i64,
    /// Drop overloaded hosts instead of moving them to the back.
    #[serde(default)]
    pub filter_overloaded_hosts: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}

/// A parsed `http://host:port/path` plugin endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEndpoint {
    /// `host:port` (port defaults to 80).
    pub authority: String,
    /// Request path, always starting with `/`.
    pub path: String,
}

impl PluginEndpoint {
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let rest = url
            .strip_prefix("http://")
            .ok_or_else(|| ConfigError::UnsupportedScheme(url.to_string()))?;
        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };
        if authority.is_empty() {
            return Err(ConfigError::InvalidEndpoint(url.to_string()));
        }
        let authority = match authority.rsplit_once(':') {
            Some((host, port)) => {
                if host.is_empty() || port.parse::<u16>().is_err() {
                    return Err(ConfigError::InvalidEndpoint(url.to_string()));
                }
                authority.to_string()
            }
            None => format!("{authority}:80"),
        };
        Ok(Self {
            authority,
            path: path.to_string(),
        })
    }

    /// Full request URI.
    pub fn uri(&self) -> String {
        format!("http://{}{}", self.authority, self.path)
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

impl RankingConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RankingConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the endpoint and timeout without building a client.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint()?;
        self.timeout()?;
        Ok(())
    }

    /// The parsed plugin endpoint, if one is configured.
    pub fn endpoint(&self) -> Result<Option<PluginEndpoint>, ConfigError> {
        self.plugin
            .endpoint
            .as_deref()
            .map(PluginEndpoint::parse)
            .transpose()
    }

    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        match self.plugin.timeout.as_deref() {
            Some(raw) => {
                parse_duration(raw).ok_or_else(|| ConfigError::InvalidDuration(raw.to_string()))
            }
            None => Ok(DEFAULT_PLUGIN_TIMEOUT),
        }
    }
}
