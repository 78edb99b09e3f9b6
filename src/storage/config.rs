use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::access::PageKey;
use crate::calendar::GridConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub calendar: CalendarConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub base_url: String,
    /// Company (branch) id sent with calendar queries; empty for all branches.
    #[serde(default)]
    pub company: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarConfig {
    pub start_hour: u32,
    pub end_hour: u32,
    pub pixels_per_hour: f64,
    pub placeholder_doctor: String,
    #[serde(default = "default_true")]
    pub fallback_on_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    pub theme: String,
    pub default_page: PageKey,
}

fn default_timeout() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_create() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            Ok(config)
        }
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clinic-desk")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let calendar = &self.calendar;
        if calendar.start_hour >= calendar.end_hour {
            return Err(ConfigError::Invalid(format!(
                "calendar.start_hour ({}) must be before calendar.end_hour ({})",
                calendar.start_hour, calendar.end_hour
            )));
        }
        if calendar.end_hour > 23 {
            return Err(ConfigError::Invalid(format!(
                "calendar.end_hour ({}) must be at most 23",
                calendar.end_hour
            )));
        }
        if !(calendar.pixels_per_hour > 0.0) {
            return Err(ConfigError::Invalid(
                "calendar.pixels_per_hour must be positive".to_string(),
            ));
        }
        if self.server.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("server.base_url is empty".to_string()));
        }
        Ok(())
    }

    pub fn grid(&self) -> GridConfig {
        GridConfig {
            start_hour: self.calendar.start_hour,
            end_hour: self.calendar.end_hour,
            pixels_per_hour: self.calendar.pixels_per_hour,
            placeholder_doctor: self.calendar.placeholder_doctor.clone(),
        }
    }

    pub fn company(&self) -> Option<String> {
        let company = self.server.company.trim();
        (!company.is_empty()).then(|| company.to_string())
    }
}

impl Default for Config {
    fn default() -> Self {
        let grid = GridConfig::default();

        Self {
            server: ServerConfig {
                base_url: "http://localhost:8899".to_string(),
                company: String::new(),
                timeout_seconds: default_timeout(),
            },
            calendar: CalendarConfig {
                start_hour: grid.start_hour,
                end_hour: grid.end_hour,
                pixels_per_hour: grid.pixels_per_hour,
                placeholder_doctor: grid.placeholder_doctor,
                fallback_on_error: true,
            },
            ui: UiConfig {
                theme: "default".to_string(),
                default_page: PageKey::Dashboard,
            },
        }
    }
}
