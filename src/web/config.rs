use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::position::DEFAULT_BASE_URL;
use crate::session::DEFAULT_POLL_INTERVAL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub web: WebConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    pub observer: Option<ObserverConfig>,
    pub settings: SettingsConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    pub api_keys: Vec<ApiKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Station coordinates used when no device location provider is wired
/// in: "lat, lon" plus altitude in meters.
#[derive(Debug, Clone, Deserialize)]
pub struct ObserverConfig {
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    pub file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(
        default = "default_poll_interval",
        deserialize_with = "deserialize_interval"
    )]
    pub poll_interval: Duration,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn deserialize_interval<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub name: String,
    pub permissions: HashSet<Permission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Control,
    ReadStatus,
    ManageSettings,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn find_api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let yaml = r#"
web:
  bind: "127.0.0.1:9000"
upstream:
  base_url: "http://localhost:8999/rest/v1/satellite"
observer:
  coordinates: "47.64, -122.33"
  altitude_m: 86.0
settings:
  file: /var/lib/skytrack/settings.yaml
tracking:
  poll_interval: 10s
api_keys:
  - key: secret-key
    name: operator
    permissions: [control, read_status, manage_settings]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.web.bind, "127.0.0.1:9000");
        assert_eq!(config.tracking.poll_interval, Duration::from_secs(10));
        assert!(config.find_api_key("secret-key").is_some());
        assert!(config.find_api_key("other").is_none());
        assert!(config.observer.is_some());
    }

    #[test]
    fn defaults_apply_when_sections_absent() {
        let yaml = r#"
web: {}
settings:
  file: settings.yaml
api_keys: []
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.web.bind, "0.0.0.0:8080");
        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.tracking.poll_interval, Duration::from_secs(5));
        assert!(config.observer.is_none());
    }

    #[test]
    fn rejects_bad_poll_interval() {
        let yaml = r#"
web: {}
settings:
  file: settings.yaml
tracking:
  poll_interval: "not a duration"
api_keys: []
"#;
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }
}
