//! Geofence validation against a set of locations.

use serde::Serialize;

use crate::models::{Coordinate, Location};

use super::distance;

/// Outcome of checking a point against the active locations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeofenceMatch {
    /// True if the point is inside some location's geofence.
    pub is_valid: bool,
    /// The first location whose geofence contains the point.
    pub location: Option<Location>,
    /// Distance to the matched location, absent when nothing matched.
    pub distance: Option<f64>,
}

impl GeofenceMatch {
    fn outside() -> Self {
        Self {
            is_valid: false,
            location: None,
            distance: None,
        }
    }

    /// Address of the matched location, empty when nothing matched.
    pub fn address(&self) -> &str {
        self.location.as_ref().map_or("", |l| l.address.as_str())
    }
}

/// Returns the first location whose geofence contains `point`.
///
/// Locations are visited in the order given and the scan stops at the first
/// hit, so an earlier, larger geofence wins over a nearer one later in the
/// list. Use [`rank_nearby`] for nearest-first results.
///
/// # Examples
///
/// ```
/// use attendance_engine::geo::validate_against_locations;
/// use attendance_engine::models::{Coordinate, Location, LocationType};
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// let office = Location {
///     id: Uuid::new_v4(),
///     name: "Head Office".to_string(),
///     address: "Jl. Sudirman 1".to_string(),
///     latitude: -6.2088,
///     longitude: 106.8456,
///     radius: 100,
///     location_type: LocationType::Office,
///     is_active: true,
///     working_hours: None,
///     timezone: "Asia/Jakarta".to_string(),
///     created_by: None,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
///
/// let result = validate_against_locations(office.center(), &[office]);
/// assert!(result.is_valid);
/// assert_eq!(result.distance, Some(0.0));
/// ```
pub fn validate_against_locations(point: Coordinate, locations: &[Location]) -> GeofenceMatch {
    for location in locations {
        let meters = distance(point, location.center());
        if meters <= f64::from(location.radius) {
            return GeofenceMatch {
                is_valid: true,
                location: Some(location.clone()),
                distance: Some(meters),
            };
        }
    }
    GeofenceMatch::outside()
}

/// A location with its distance from a query point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyLocation {
    /// The location.
    #[serde(flatten)]
    pub location: Location,
    /// Meters from the query point.
    pub distance: f64,
    /// Whether the location lies inside the requested search radius.
    pub is_within_radius: bool,
    /// Whether the query point lies inside the location's own geofence.
    pub is_within_geofence: bool,
}

/// Computes the distance to every location and sorts nearest first.
pub fn rank_nearby(point: Coordinate, locations: &[Location], search_radius: f64) -> Vec<NearbyLocation> {
    let mut ranked: Vec<NearbyLocation> = locations
        .iter()
        .map(|location| {
            let meters = distance(point, location.center());
            NearbyLocation {
                location: location.clone(),
                distance: meters,
                is_within_radius: meters <= search_radius,
                is_within_geofence: meters <= f64::from(location.radius),
            }
        })
        .collect();
    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked
}
