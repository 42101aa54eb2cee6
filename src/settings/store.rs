use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::peripheral::{AddressParseError, MacAddress};

const API_KEY_MIN_LEN: usize = 10;
const API_KEY_MAX_LEN: usize = 30;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid API credential: expected 10-30 characters of [A-Za-z0-9_-]")]
    InvalidApiKey,
    #[error(transparent)]
    InvalidMac(#[from] AddressParseError),
}

/// Mutable service settings, persisted as one YAML document. The
/// credential is stored as entered; it is never interpreted here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peripheral_mac: Option<MacAddress>,
}

pub fn validate_api_key(value: &str) -> Result<(), SettingsError> {
    let trimmed = value.trim();
    let len_ok = (API_KEY_MIN_LEN..=API_KEY_MAX_LEN).contains(&trimmed.len());
    let charset_ok = trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if len_ok && charset_ok {
        Ok(())
    } else {
        Err(SettingsError::InvalidApiKey)
    }
}

/// File-backed settings store. Saves validate first and never touch the
/// file on rejection; a missing file reads as empty settings.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<Settings, SettingsError> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save_api_key(&self, value: &str) -> Result<(), SettingsError> {
        validate_api_key(value)?;
        let mut settings = self.load()?;
        settings.api_key = Some(value.trim().to_string());
        self.persist(&settings)
    }

    pub fn save_peripheral_mac(&self, value: &str) -> Result<MacAddress, SettingsError> {
        let mac = MacAddress::parse(value)?;
        let mut settings = self.load()?;
        settings.peripheral_mac = Some(mac.clone());
        self.persist(&settings)?;
        Ok(mac)
    }

    pub fn clear_peripheral_mac(&self) -> Result<(), SettingsError> {
        let mut settings = self.load()?;
        settings.peripheral_mac = None;
        self.persist(&settings)
    }

    fn persist(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(settings)?;
        std::fs::write(&self.path, content)?;
        debug!("settings saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static NEXT: AtomicU32 = AtomicU32::new(0);

    fn scratch_store() -> SettingsStore {
        let n = NEXT.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "skytrack-settings-{}-{}.yaml",
            std::process::id(),
            n
        ));
        let _ = std::fs::remove_file(&path);
        SettingsStore::new(path)
    }

    #[test]
    fn api_key_format() {
        assert!(validate_api_key("A1B2-C3D4-E5F6").is_ok());
        assert!(validate_api_key("  A1B2-C3D4-E5F6  ").is_ok());
        assert!(validate_api_key("under_score_123").is_ok());

        assert!(validate_api_key("").is_err());
        assert!(validate_api_key("short").is_err());
        assert!(validate_api_key(&"x".repeat(31)).is_err());
        assert!(validate_api_key("has spaces not allowed").is_err());
        assert!(validate_api_key("bad!chars#here$").is_err());
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let store = scratch_store();
        let settings = store.load().unwrap();
        assert!(settings.api_key.is_none());
        assert!(settings.peripheral_mac.is_none());
    }

    #[test]
    fn rejected_save_never_touches_the_file() {
        let store = scratch_store();
        assert!(store.save_api_key("short").is_err());
        assert!(store.save_peripheral_mac("nope").is_err());
        assert!(!store.path.exists());
    }

    #[test]
    fn saves_round_trip() {
        let store = scratch_store();
        store.save_api_key("A1B2-C3D4-E5F6").unwrap();
        store.save_peripheral_mac("aa:bb:cc:dd:ee:ff").unwrap();

        let settings = store.load().unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("A1B2-C3D4-E5F6"));
        assert_eq!(
            settings.peripheral_mac.as_ref().map(|m| m.as_str()),
            Some("AA:BB:CC:DD:EE:FF")
        );

        // Saving one field leaves the other intact.
        store.save_api_key("NEW_KEY_0123456789").unwrap();
        let settings = store.load().unwrap();
        assert!(settings.peripheral_mac.is_some());

        store.clear_peripheral_mac().unwrap();
        assert!(store.load().unwrap().peripheral_mac.is_none());
    }
}
