//! Great-circle distance.

use crate::models::Coordinate;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two points.
///
/// Returns 0 when either point is outside the latitude/longitude domain or
/// when the result is not a finite number. Callers that must distinguish a
/// bogus point from a coincident one validate the coordinate first.
///
/// # Examples
///
/// ```
/// use attendance_engine::geo::distance;
/// use attendance_engine::models::Coordinate;
///
/// let monas = Coordinate::new(-6.1754, 106.8272);
/// let bundaran_hi = Coordinate::new(-6.1950, 106.8230);
/// let meters = distance(monas, bundaran_hi);
/// assert!((2100.0..2300.0).contains(&meters));
///
/// assert_eq!(distance(monas, Coordinate::new(91.0, 0.0)), 0.0);
/// ```
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    if !a.is_valid() || !b.is_valid() {
        return 0.0;
    }

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlng = b.longitude.to_radians() - a.longitude.to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    let meters = EARTH_RADIUS_METERS * c;

    if meters.is_finite() { meters } else { 0.0 }
}
