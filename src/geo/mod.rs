//! Geofence validation.
//!
//! [`distance`] is the Haversine great-circle distance,
//! [`validate_against_locations`] is the first-match geofence check used at
//! check-in, and [`rank_nearby`] is the nearest-first listing. The
//! [`LocationService`] wraps them with location administration over a
//! [`LocationStore`](crate::storage::LocationStore).

mod distance;
mod service;
mod validator;

pub use distance::{EARTH_RADIUS_METERS, distance};
pub use service::{LocationService, LocationUpdate, LocationValidation, NewLocation};
pub use validator::{GeofenceMatch, NearbyLocation, rank_nearby, validate_against_locations};
