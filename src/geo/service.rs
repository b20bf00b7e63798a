//! Location administration and geofence queries.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{LocationDefaults, LocationSeed};
use crate::error::{EngineError, EngineResult};
use crate::models::{Coordinate, Location, LocationType, WorkingHoursPolicy};
use crate::storage::{Clock, LocationFilter, LocationStore};

use super::{GeofenceMatch, NearbyLocation, rank_nearby, validate_against_locations};

/// Fields for a new location. Unset fields take configured defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLocation {
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
    #[serde(default)]
    pub radius: Option<u32>,
    /// Kind of site.
    #[serde(rename = "type", default)]
    pub location_type: Option<LocationType>,
    /// Staffed hours.
    #[serde(default)]
    pub working_hours: Option<WorkingHoursPolicy>,
    /// IANA timezone name.
    #[serde(default)]
    pub timezone: Option<String>,
}

/// A partial update. Only set fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationUpdate {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New address.
    #[serde(default)]
    pub address: Option<String>,
    /// New latitude.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// New longitude.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// New radius.
    #[serde(default)]
    pub radius: Option<u32>,
    /// New type.
    #[serde(rename = "type", default)]
    pub location_type: Option<LocationType>,
    /// Activate or deactivate.
    #[serde(default)]
    pub is_active: Option<bool>,
    /// New staffed hours.
    #[serde(default)]
    pub working_hours: Option<WorkingHoursPolicy>,
    /// New timezone name.
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Result of validating a point for attendance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationValidation {
    /// Whether the point may be used for attendance.
    pub is_valid: bool,
    /// The matched location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Distance to the matched location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Human-readable outcome.
    pub message: String,
}

impl From<GeofenceMatch> for LocationValidation {
    fn from(result: GeofenceMatch) -> Self {
        let message = if result.is_valid {
            "Location is valid for attendance"
        } else {
            "Location is not within any allowed radius"
        };
        Self {
            is_valid: result.is_valid,
            location: result.location,
            distance: result.distance,
            message: message.to_string(),
        }
    }
}

/// Manages approved locations and answers geofence queries.
#[derive(Clone)]
pub struct LocationService {
    store: Arc<dyn LocationStore>,
    clock: Arc<dyn Clock>,
    defaults: LocationDefaults,
    timezone: String,
}

impl LocationService {
    /// Creates a service over the given store.
    pub fn new(
        store: Arc<dyn LocationStore>,
        clock: Arc<dyn Clock>,
        defaults: LocationDefaults,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            defaults,
            timezone: timezone.into(),
        }
    }

    /// Creates a location, filling radius, type and timezone from defaults.
    pub fn create(&self, input: NewLocation, created_by: Option<Uuid>) -> EngineResult<Location> {
        let now = self.clock.now();
        let location = Location {
            id: Uuid::new_v4(),
            name: input.name,
            address: input.address,
            latitude: input.latitude,
            longitude: input.longitude,
            radius: input.radius.unwrap_or(self.defaults.radius),
            location_type: input.location_type.unwrap_or_default(),
            is_active: true,
            working_hours: input.working_hours,
            timezone: input
                .timezone
                .filter(|tz| !tz.is_empty())
                .unwrap_or_else(|| self.timezone.clone()),
            created_by,
            created_at: now,
            updated_at: now,
        };
        location.validate()?;

        self.store.insert(location.clone())?;
        info!(location_id = %location.id, name = %location.name, radius = location.radius, "Location created");
        Ok(location)
    }

    /// Inserts the configured seed locations.
    pub fn seed(&self, seeds: &[LocationSeed]) -> EngineResult<Vec<Location>> {
        seeds
            .iter()
            .map(|seed| {
                self.create(
                    NewLocation {
                        name: seed.name.clone(),
                        address: seed.address.clone(),
                        latitude: seed.latitude,
                        longitude: seed.longitude,
                        radius: seed.radius,
                        location_type: Some(seed.location_type),
                        working_hours: None,
                        timezone: None,
                    },
                    None,
                )
            })
            .collect()
    }

    /// Applies a partial update.
    pub fn update(&self, id: Uuid, changes: LocationUpdate) -> EngineResult<Location> {
        let mut location = self.get(id)?;

        if let Some(name) = changes.name.filter(|n| !n.is_empty()) {
            location.name = name;
        }
        if let Some(address) = changes.address {
            location.address = address;
        }
        if let Some(latitude) = changes.latitude {
            location.latitude = latitude;
        }
        if let Some(longitude) = changes.longitude {
            location.longitude = longitude;
        }
        if let Some(radius) = changes.radius {
            location.radius = radius;
        }
        if let Some(location_type) = changes.location_type {
            location.location_type = location_type;
        }
        if let Some(is_active) = changes.is_active {
            location.is_active = is_active;
        }
        if let Some(working_hours) = changes.working_hours {
            location.working_hours = Some(working_hours);
        }
        if let Some(timezone) = changes.timezone.filter(|tz| !tz.is_empty()) {
            location.timezone = timezone;
        }
        location.validate()?;
        location.updated_at = self.clock.now();

        self.store.save(&location)?;
        info!(location_id = %id, is_active = location.is_active, "Location updated");
        Ok(location)
    }

    /// Deletes a location.
    pub fn delete(&self, id: Uuid) -> EngineResult<()> {
        if !self.store.delete(id)? {
            return Err(EngineError::LocationNotFound { id });
        }
        info!(location_id = %id, "Location deleted");
        Ok(())
    }

    /// Fetches one location.
    pub fn get(&self, id: Uuid) -> EngineResult<Location> {
        self.store
            .get(id)?
            .ok_or(EngineError::LocationNotFound { id })
    }

    /// Lists locations matching the filter.
    pub fn list(&self, filter: &LocationFilter) -> EngineResult<Vec<Location>> {
        self.store.list(filter)
    }

    /// Active locations, the set check-in validates against.
    pub fn active_locations(&self) -> EngineResult<Vec<Location>> {
        self.store.list(&LocationFilter::active())
    }

    /// Every active location ranked by distance from `point`.
    pub fn nearby(
        &self,
        point: Coordinate,
        search_radius: Option<f64>,
    ) -> EngineResult<Vec<NearbyLocation>> {
        point.validate()?;
        let radius = search_radius.unwrap_or(self.defaults.nearby_search_radius);
        Ok(rank_nearby(point, &self.active_locations()?, radius))
    }

    /// First-match geofence validation of `point`.
    pub fn validate(&self, point: Coordinate) -> EngineResult<LocationValidation> {
        point.validate()?;
        let locations = self.active_locations()?;
        let result = validate_against_locations(point, &locations);
        debug!(
            latitude = point.latitude,
            longitude = point.longitude,
            candidates = locations.len(),
            is_valid = result.is_valid,
            "Validated location"
        );
        Ok(result.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FixedClock, MemoryStore};
    use chrono::{TimeZone, Utc};

    fn service() -> LocationService {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 2, 1, 0, 0).unwrap());
        LocationService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(clock),
            LocationDefaults::default(),
            "Asia/Jakarta",
        )
    }

    fn new_location(name: &str, latitude: f64, longitude: f64) -> NewLocation {
        NewLocation {
            name: name.to_string(),
            address: String::new(),
            latitude,
            longitude,
            radius: None,
            location_type: None,
            working_hours: None,
            timezone: None,
        }
    }

    #[test]
    fn test_create_applies_defaults() {
        let service = service();
        let creator = Uuid::new_v4();
        let location = service
            .create(new_location("Head Office", -6.2088, 106.8456), Some(creator))
            .unwrap();

        assert_eq!(location.radius, 100);
        assert_eq!(location.location_type, LocationType::Office);
        assert_eq!(location.timezone, "Asia/Jakarta");
        assert_eq!(location.created_by, Some(creator));
        assert!(location.is_active);
    }

    #[test]
    fn test_create_rejects_invalid_latitude() {
        let result = service().create(new_location("Nowhere", 120.0, 0.0), None);
        assert!(matches!(
            result,
            Err(EngineError::InvalidCoordinate {
                field: "latitude",
                ..
            })
        ));
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let result = service().create(new_location("  ", 0.0, 0.0), None);
        assert!(matches!(
            result,
            Err(EngineError::InvalidLocation { field: "name", .. })
        ));
    }

    #[test]
    fn test_deactivated_location_no_longer_validates() {
        let service = service();
        let office = service
            .create(new_location("Office", -6.2088, 106.8456), None)
            .unwrap();
        assert!(service.validate(office.center()).unwrap().is_valid);

        service
            .update(
                office.id,
                LocationUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let validation = service.validate(office.center()).unwrap();
        assert!(!validation.is_valid);
        assert_eq!(validation.message, "Location is not within any allowed radius");
    }

    #[test]
    fn test_update_missing_location_is_not_found() {
        let result = service().update(Uuid::new_v4(), LocationUpdate::default());
        assert!(matches!(result, Err(EngineError::LocationNotFound { .. })));
    }

    #[test]
    fn test_delete_twice_is_not_found() {
        let service = service();
        let office = service.create(new_location("Office", 0.0, 0.0), None).unwrap();

        service.delete(office.id).unwrap();
        assert!(matches!(
            service.delete(office.id),
            Err(EngineError::LocationNotFound { .. })
        ));
    }

    #[test]
    fn test_nearby_skips_inactive_and_sorts() {
        let service = service();
        service.create(new_location("Far", 0.005, 0.0), None).unwrap();
        service.create(new_location("Near", 0.0005, 0.0), None).unwrap();
        let closed = service.create(new_location("Closed", 0.0, 0.0), None).unwrap();
        service
            .update(
                closed.id,
                LocationUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let nearby = service.nearby(Coordinate::new(0.0, 0.0), None).unwrap();
        let names: Vec<&str> = nearby.iter().map(|n| n.location.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Far"]);
        assert!(nearby[0].is_within_geofence);
        assert!(nearby[1].is_within_radius);
        assert!(!nearby[1].is_within_geofence);
    }

    #[test]
    fn test_seed_creates_configured_locations() {
        let service = service();
        let seeds = vec![LocationSeed {
            name: "Branch".to_string(),
            address: "Bandung".to_string(),
            latitude: -6.9218,
            longitude: 107.6071,
            radius: Some(150),
            location_type: LocationType::Branch,
        }];

        let created = service.seed(&seeds).unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].radius, 150);
        assert_eq!(service.list(&LocationFilter::default()).unwrap().len(), 1);
    }
}
