//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from YAML files.

use chrono::{FixedOffset, NaiveTime};
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use crate::models::User;

use super::types::{
    AppConfig, EngineConfig, LocationSeed, LocationsFile, MealAllowanceConfig, UsersFile,
};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── engine.yaml          # Timezone, work schedule, claim years, photos, audit
/// ├── meal_allowance.yaml  # Fallback policy and per-record rate
/// ├── locations.yaml       # Optional seed locations
/// └── users.yaml           # Optional seed directory entries
/// ```
///
/// # Example
///
/// ```no_run
/// use attendance_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Timezone: {}", loader.engine().timezone.name);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: AppConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns `ConfigNotFound` if `engine.yaml` or `meal_allowance.yaml` is
    /// missing and `ConfigParseError` if any file is malformed. A missing
    /// `locations.yaml` or `users.yaml` means no seed entries.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use attendance_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/default")?;
    /// # Ok::<(), attendance_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let engine = Self::load_yaml::<EngineConfig>(&path.join("engine.yaml"))?;
        let meal_allowance =
            Self::load_yaml::<MealAllowanceConfig>(&path.join("meal_allowance.yaml"))?;

        let seed_locations = Self::load_optional::<LocationsFile>(&path.join("locations.yaml"))?
            .locations;
        let seed_users = Self::load_optional::<UsersFile>(&path.join("users.yaml"))?.users;

        Ok(Self {
            config: AppConfig::new(engine, meal_allowance, seed_locations, seed_users),
        })
    }

    /// Builds a loader around already-constructed configuration.
    pub fn from_config(config: AppConfig) -> Self {
        Self { config }
    }

    /// Loads a YAML file, or the default if it does not exist.
    fn load_optional<T: serde::de::DeserializeOwned + Default>(path: &Path) -> EngineResult<T> {
        if path.exists() {
            Self::load_yaml(path)
        } else {
            Ok(T::default())
        }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the engine settings.
    pub fn engine(&self) -> &EngineConfig {
        self.config.engine()
    }

    /// Returns the meal-allowance settings.
    pub fn meal_allowance(&self) -> &MealAllowanceConfig {
        self.config.meal_allowance()
    }

    /// Returns the seed locations.
    pub fn seed_locations(&self) -> &[LocationSeed] {
        self.config.seed_locations()
    }

    /// Returns the seed users.
    pub fn seed_users(&self) -> &[User] {
        self.config.seed_users()
    }

    /// The local offset used for day and month grouping.
    pub fn offset(&self) -> FixedOffset {
        self.engine().offset()
    }

    /// The work-start threshold.
    pub fn work_start(&self) -> NaiveTime {
        self.engine().work_start()
    }
}
