// SPDX-License-Identifier: MPL-2.0

use crate::config::{APP_ID, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVICE_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const SERVICE_URL_ENV: &str = "TABLON_SERVICE_URL";
pub const AUTH_TOKEN_ENV: &str = "TABLON_AUTH_TOKEN";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Format(#[from] serde_json::Error),
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Persistent feed engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSettings {
    #[serde(default = "default_service_url")]
    pub service_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Bearer token sent with every request, if the service needs one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            auth_token: None,
        }
    }
}

impl FeedSettings {
    /// Get the settings file path (~/.config/io.github.sethcottle.Tablon/feed.json)
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push(APP_ID);
            p.push("feed.json");
            p
        })
    }

    /// Load settings from the default location, or defaults if missing or unreadable.
    /// Environment overrides are applied either way.
    pub fn load() -> Self {
        let settings = Self::settings_path()
            .and_then(|path| Self::load_from(&path).ok())
            .unwrap_or_default();
        settings.with_env_overrides()
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(SERVICE_URL_ENV)
            && !url.is_empty()
        {
            self.service_url = url;
        }
        if let Ok(token) = std::env::var(AUTH_TOKEN_ENV)
            && !token.is_empty()
        {
            self.auth_token = Some(token);
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!(
            "tablon_settings_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        dir.join("feed.json")
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: FeedSettings =
            serde_json::from_str(r#"{"service_url": "http://localhost:9000"}"#).unwrap();
        assert_eq!(settings.service_url, "http://localhost:9000");
        assert_eq!(settings.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(settings.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(settings.auth_token, None);
    }

    #[test]
    fn save_then_load_from_disk() {
        let path = temp_path("roundtrip");
        let settings = FeedSettings {
            service_url: "http://feed.test".into(),
            page_size: 5,
            request_timeout_secs: 3,
            auth_token: Some("secret".into()),
        };
        settings.save_to(&path).unwrap();

        let loaded = FeedSettings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.request_timeout(), Duration::from_secs(3));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupted_file_is_an_error() {
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            FeedSettings::load_from(&path),
            Err(SettingsError::Format(_))
        ));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
