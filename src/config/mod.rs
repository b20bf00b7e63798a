//! Configuration loading and management for the attendance engine.
//!
//! This module loads engine settings from YAML files: the local timezone,
//! the work schedule, accepted claim years, photo rules, the fallback
//! meal-allowance policy, and optional seed locations.
//!
//! # Example
//!
//! ```no_run
//! use attendance_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Work starts at {}", config.work_start());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AppConfig, AuditConfig, ClaimRules, DefaultPolicyConfig, EngineConfig, LocationDefaults,
    LocationSeed, LocationsFile, MealAllowanceConfig, PhotoConfig, TimezoneConfig, UsersFile,
    WorkScheduleConfig,
};
