//! Great-circle distance and coordinate formatting.
//!
//! Pure functions, shared by the resolver (display names for raw coordinates)
//! and by callers measuring how far a check-in is from a known site.

use crate::location::Coordinates;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in metres between two points given in degrees.
pub fn haversine_distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Distance in metres between two coordinate values.
pub fn distance_between(a: Coordinates, b: Coordinates) -> f64 {
    haversine_distance_meters(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Format as `"<lat>, <lon>"` with six decimals.
pub fn format_coordinates(c: Coordinates) -> String {
    format!("{:.6}, {:.6}", c.latitude, c.longitude)
}
