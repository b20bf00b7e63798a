//! Configuration types for the attendance engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. Every section carries
//! defaults so a partial file only needs to name what it overrides.

use chrono::{FixedOffset, NaiveTime, Offset, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{LocationType, User};

/// Local timezone used for calendar-day and month grouping.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    /// IANA name, reported to clients and stamped on new locations.
    pub name: String,
    /// Fixed offset from UTC in minutes.
    pub utc_offset_minutes: i32,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            name: "Asia/Jakarta".to_string(),
            utc_offset_minutes: 7 * 60,
        }
    }
}

/// Office hours used to judge lateness and complete days.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkScheduleConfig {
    /// Hour of the work-start threshold.
    pub start_hour: u32,
    /// Minute of the work-start threshold.
    pub start_minute: u32,
    /// Hours a record needs to not count as incomplete.
    pub full_day_hours: Decimal,
}

impl Default for WorkScheduleConfig {
    fn default() -> Self {
        Self {
            start_hour: 9,
            start_minute: 0,
            full_day_hours: Decimal::from(8),
        }
    }
}

/// Accepted claim years.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClaimRules {
    /// Earliest accepted claim year.
    pub min_year: i32,
    /// Latest accepted claim year.
    pub max_year: i32,
}

impl Default for ClaimRules {
    fn default() -> Self {
        Self {
            min_year: 2020,
            max_year: 2030,
        }
    }
}

/// Photo upload rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhotoConfig {
    /// Accepted file extensions, lowercase with the leading dot.
    pub allowed_extensions: Vec<String>,
    /// Directory the local photo store writes into.
    pub upload_dir: String,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: [".jpg", ".jpeg", ".png", ".gif", ".webp"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            upload_dir: "./uploads".to_string(),
        }
    }
}

/// Background audit queue settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Entries buffered before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}

/// Defaults applied to new locations and nearby queries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocationDefaults {
    /// Geofence radius in meters when none is given.
    pub radius: u32,
    /// Search radius in meters for nearby queries.
    pub nearby_search_radius: f64,
}

impl Default for LocationDefaults {
    fn default() -> Self {
        Self {
            radius: 100,
            nearby_search_radius: 1000.0,
        }
    }
}

/// Contents of `engine.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Local timezone.
    pub timezone: TimezoneConfig,
    /// Office hours.
    pub work_schedule: WorkScheduleConfig,
    /// Accepted claim years.
    pub claims: ClaimRules,
    /// Photo upload rules.
    pub photos: PhotoConfig,
    /// Audit queue.
    pub audit: AuditConfig,
    /// Location defaults.
    pub locations: LocationDefaults,
}

impl EngineConfig {
    /// The configured offset, falling back to UTC if out of range.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.timezone.utc_offset_minutes * 60).unwrap_or(Utc.fix())
    }

    /// The work-start threshold as a time of day.
    pub fn work_start(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(
            self.work_schedule.start_hour,
            self.work_schedule.start_minute,
            0,
        )
        .unwrap_or(NaiveTime::MIN)
    }
}

/// The policy used when no active policy has been stored.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultPolicyConfig {
    /// Allowance per valid day.
    pub amount_per_day: Decimal,
    /// Minimum qualifying working hours.
    pub min_working_hours: Decimal,
    /// Claims allowed per month.
    pub max_claims_per_month: u32,
}

impl Default for DefaultPolicyConfig {
    fn default() -> Self {
        Self {
            amount_per_day: Decimal::from(15000),
            min_working_hours: Decimal::from(8),
            max_claims_per_month: 1,
        }
    }
}

/// Contents of `meal_allowance.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MealAllowanceConfig {
    /// Fallback policy.
    pub default_policy: DefaultPolicyConfig,
    /// Flat rate per valid attendance record, used by the management report.
    pub per_record_rate: Decimal,
}

impl Default for MealAllowanceConfig {
    fn default() -> Self {
        Self {
            default_policy: DefaultPolicyConfig::default(),
            per_record_rate: Decimal::from(15000),
        }
    }
}

/// One entry of `locations.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationSeed {
    /// Display name.
    pub name: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
    /// Geofence radius, defaults to [`LocationDefaults::radius`].
    #[serde(default)]
    pub radius: Option<u32>,
    /// Kind of site.
    #[serde(rename = "type", default)]
    pub location_type: LocationType,
}

/// Contents of `locations.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationsFile {
    /// Seed locations.
    #[serde(default)]
    pub locations: Vec<LocationSeed>,
}

/// Contents of `users.yaml`: directory entries for running without an
/// external identity service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersFile {
    /// Seed users.
    #[serde(default)]
    pub users: Vec<User>,
}

/// The complete configuration loaded from a directory.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    engine: EngineConfig,
    meal_allowance: MealAllowanceConfig,
    seed_locations: Vec<LocationSeed>,
    seed_users: Vec<User>,
}

impl AppConfig {
    /// Creates an AppConfig from its component parts.
    pub fn new(
        engine: EngineConfig,
        meal_allowance: MealAllowanceConfig,
        seed_locations: Vec<LocationSeed>,
        seed_users: Vec<User>,
    ) -> Self {
        Self {
            engine,
            meal_allowance,
            seed_locations,
            seed_users,
        }
    }

    /// Returns the engine settings.
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Returns the meal-allowance settings.
    pub fn meal_allowance(&self) -> &MealAllowanceConfig {
        &self.meal_allowance
    }

    /// Returns the seed locations.
    pub fn seed_locations(&self) -> &[LocationSeed] {
        &self.seed_locations
    }

    /// Returns the seed users.
    pub fn seed_users(&self) -> &[User] {
        &self.seed_users
    }
}
