//! Persisted application settings (lives in the OS config directory).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::model::timeline::TimelineScale;

pub const API_URL_ENV: &str = "RESOURCE_GANTT_API_URL";
pub const PROGRAM_ID_ENV: &str = "RESOURCE_GANTT_PROGRAM_ID";

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Base URL of the scheduling service, e.g. `http://localhost:8080/api/v1`.
    pub api_base_url: String,
    /// Program whose resources are shown. Nothing is fetched while unset.
    pub program_id: Option<Uuid>,
    pub default_scale: TimelineScale,
    /// Length of the initial visible range, starting today.
    pub default_range_days: u32,
    pub request_timeout_secs: u64,
    /// Used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api/v1".into(),
            program_id: None,
            default_scale: TimelineScale::Days,
            default_range_days: 28,
            request_timeout_secs: 30,
            log_filter: "info,resource_gantt=debug".into(),
        }
    }
}

impl AppSettings {
    /// Directory holding the settings file.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        directories::ProjectDirs::from("", "", "ResourceGantt")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Self::config_dir().map(|dir| dir.join(SETTINGS_FILE))
    }

    /// Load settings from the default location, writing defaults on first
    /// run, then apply environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        let mut settings = Self::load_or_init(&path)?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Read `path`, or create it with defaults when it does not exist.
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load_from(path);
        }
        let settings = Self::default();
        if let Err(err) = settings.save_to(path) {
            // A read-only config dir must not stop the app.
            warn!(path = %path.display(), error = %err, "could not write default settings");
        } else {
            info!(path = %path.display(), "wrote default settings");
        }
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&contents).map_err(ConfigError::Parse)?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        let write_err = |source| ConfigError::WriteFile {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, json).map_err(write_err)
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    ///
    /// An unparsable program id is ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(PROGRAM_ID_ENV) {
            match Uuid::parse_str(raw.trim()) {
                Ok(id) => self.program_id = Some(id),
                Err(err) => warn!(value = %raw, error = %err, "ignoring {PROGRAM_ID_ENV}"),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: format!("`{url}` must start with http:// or https://"),
            });
        }
        if self.default_range_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_range_days",
                reason: "must be at least 1".into(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
