//! Configuration loading

use crate::types::{SizeVariant, ThemeColor};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Where assets are fetched from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Folder of the primary structure models (one per size)
    #[serde(default = "default_structure_base")]
    pub structure_base: String,
    /// Folder of the glass door models (relative path)
    #[serde(default = "default_glass_base")]
    pub glass_base: String,
    /// CDN base of the zip screen models (absolute URL)
    #[serde(default = "default_zip_base")]
    pub zip_base: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            structure_base: default_structure_base(),
            glass_base: default_glass_base(),
            zip_base: default_zip_base(),
        }
    }
}

fn default_structure_base() -> String {
    "models/structure".to_string()
}

fn default_glass_base() -> String {
    "models/glass".to_string()
}

fn default_zip_base() -> String {
    "https://cdn.pergola-configurator.com/models/zip".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Duration of each half of the mount open-then-close pass, in seconds
    #[serde(default = "default_mount_secs")]
    pub mount_secs: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            mount_secs: default_mount_secs(),
        }
    }
}

fn default_mount_secs() -> f32 {
    1.2
}

/// Initial selections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub size: SizeVariant,
    #[serde(default)]
    pub theme: ThemeColor,
}

impl Config {
    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a pretty TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.animation.mount_secs.is_finite() && self.animation.mount_secs > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "animation.mount_secs must be positive, got {}",
                self.animation.mount_secs
            )));
        }
        if self.assets.zip_base.is_empty() || self.assets.glass_base.is_empty() {
            return Err(ConfigError::ValidationError(
                "asset bases must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from file, falling back to defaults when it is missing
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config = Config::from_toml(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let content = config.to_toml()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
