//! Configuration file support for SafeNight.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/safenight/config.toml`.

use crate::store::{DEFAULT_WINDOW_HOURS, MAX_WINDOW_HOURS};
use crate::{Error, Result, Sex, UserProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub profile: ProfileConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Profile used until one is saved in the data directory
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default = "default_weight_lbs")]
    pub weight_lbs: f64,

    #[serde(default)]
    pub sex: Sex,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            weight_lbs: default_weight_lbs(),
            sex: Sex::default(),
        }
    }
}

impl ProfileConfig {
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id.clone(),
            weight_lbs: self.weight_lbs,
            sex: self.sex,
        }
    }
}

/// Drink tracking parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Drinks older than this no longer count toward BAC
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("safenight")
}

fn default_user_id() -> String {
    "local".into()
}

fn default_weight_lbs() -> f64 {
    140.0
}

fn default_window_hours() -> i64 {
    DEFAULT_WINDOW_HOURS
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        Self::load_or_default(&Self::default_config_path())
    }

    /// Load configuration from `path`, or defaults when no file exists there
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("safenight").join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_WINDOW_HOURS).contains(&self.tracking.window_hours) {
            return Err(Error::Config(format!(
                "tracking.window_hours must be between 1 and {}, got {}",
                MAX_WINDOW_HOURS, self.tracking.window_hours
            )));
        }
        self.profile
            .to_profile()
            .validate()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
