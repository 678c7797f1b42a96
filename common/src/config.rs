// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::schedule::RetryPolicy;

/// Environment variable overriding the configured sensor URL at runtime.
pub const SENSOR_URL_ENV: &str = "SENSOR_URL";

/// Environment variable switching the host to the bundled dummy reading.
pub const DEMO_ENV: &str = "CLIMATE_WIDGET_DEMO";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Settings of the widget host, read from `config.json`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct WidgetConfig {
    pub sensor_url: String,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub widget_count: u32,
    pub retry: RetryPolicy,
    pub demo: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            // Baked in at build time, like the API keys of the weather demo.
            sensor_url: std::option_env!("SENSOR_URL").unwrap_or_default().to_string(),
            refresh_interval_secs: 15 * 60,
            request_timeout_secs: 10,
            widget_count: 1,
            retry: RetryPolicy::default(),
            demo: false,
        }
    }
}

pub(crate) fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "example", "climate-monitor")
}

impl WidgetConfig {
    /// `config.json` in the platform's config directory.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Reads the config at `path`, falling back to defaults if it does not exist.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json_data = match std::fs::read_to_string(path) {
            Ok(json_data) => json_data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&json_data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the config from the default location and applies environment
    /// overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match Self::default_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var(SENSOR_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.sensor_url = url;
        }
        if var(DEMO_ENV).is_some() {
            self.demo = true;
        }
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
