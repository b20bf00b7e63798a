//! Location model and related types.
//!
//! A location is an approved place of work described by a circular geofence.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// A point on the earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees, valid in `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in decimal degrees, valid in `[-180, 180]`.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate without validating it.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true if both components are finite and inside their domains.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Validates the coordinate, naming the first offending component.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::Coordinate;
    ///
    /// assert!(Coordinate::new(-6.2, 106.8).validate().is_ok());
    /// assert!(Coordinate::new(95.0, 106.8).validate().is_err());
    /// ```
    pub fn validate(&self) -> EngineResult<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(EngineError::InvalidCoordinate {
                field: "latitude",
                value: self.latitude,
            });
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(EngineError::InvalidCoordinate {
                field: "longitude",
                value: self.longitude,
            });
        }
        Ok(())
    }
}

/// The kind of site a location represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    /// Main office.
    #[default]
    Office,
    /// Branch office.
    Branch,
    /// Approved remote work location.
    Remote,
    /// A client's premises.
    ClientSite,
}

/// Working hours attached to a location.
///
/// Stored for display and scheduling. Lateness is judged against the engine's
/// configured work start, not this policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHoursPolicy {
    /// Start of the working day.
    pub start: NaiveTime,
    /// End of the working day.
    pub end: NaiveTime,
    /// Days of the week on which the location is staffed.
    pub days: Vec<Weekday>,
}

impl WorkingHoursPolicy {
    /// Returns true if the location is staffed on the given weekday.
    pub fn is_working_day(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }
}

impl Default for WorkingHoursPolicy {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }
}

/// An approved attendance location with its geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
    /// Geofence radius in meters.
    pub radius: u32,
    /// Kind of site.
    #[serde(rename = "type", default)]
    pub location_type: LocationType,
    /// Inactive locations are ignored by validation.
    pub is_active: bool,
    /// Optional staffed hours.
    #[serde(default)]
    pub working_hours: Option<WorkingHoursPolicy>,
    /// IANA timezone name, informational.
    pub timezone: String,
    /// The administrator who created the location.
    #[serde(default)]
    pub created_by: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Location {
    /// The center of the geofence.
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Checks the location's stored invariants.
    pub fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::InvalidLocation {
                field: "name",
                message: "must not be empty".to_string(),
            });
        }
        self.center().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_bounds_are_inclusive() {
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.0001, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
    }

    #[test]
    fn test_nan_coordinate_is_invalid() {
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(matches!(
            Coordinate::new(0.0, f64::NAN).validate(),
            Err(EngineError::InvalidCoordinate {
                field: "longitude",
                ..
            })
        ));
    }

    #[test]
    fn test_location_type_serialization() {
        assert_eq!(
            serde_json::to_string(&LocationType::ClientSite).unwrap(),
            "\"client_site\""
        );
        let parsed: LocationType = serde_json::from_str("\"branch\"").unwrap();
        assert_eq!(parsed, LocationType::Branch);
    }

    #[test]
    fn test_default_working_hours_excludes_weekend() {
        let policy = WorkingHoursPolicy::default();
        assert!(policy.is_working_day(Weekday::Mon));
        assert!(policy.is_working_day(Weekday::Fri));
        assert!(!policy.is_working_day(Weekday::Sat));
        assert!(!policy.is_working_day(Weekday::Sun));
    }

    #[test]
    fn test_deserialize_location_with_working_hours() {
        let json = r#"{
            "id": "6c1a3b7e-2f43-4a4e-9f5c-1d2e3f4a5b6c",
            "name": "Head Office",
            "address": "Jl. Sudirman 1",
            "latitude": -6.2088,
            "longitude": 106.8456,
            "radius": 150,
            "type": "office",
            "is_active": true,
            "working_hours": {"start": "08:00:00", "end": "16:00:00", "days": ["Mon", "Tue"]},
            "timezone": "Asia/Jakarta",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }"#;

        let location: Location = serde_json::from_str(json).unwrap();
        assert_eq!(location.radius, 150);
        assert_eq!(location.location_type, LocationType::Office);
        let hours = location.working_hours.unwrap();
        assert!(hours.is_working_day(Weekday::Tue));
        assert!(!hours.is_working_day(Weekday::Wed));
    }
}
