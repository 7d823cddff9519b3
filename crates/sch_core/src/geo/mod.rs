use crate::domain::Coordinates;

/// Mean Earth radius used by the spherical approximation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in metres between two points given in degrees (haversine).
///
/// Spherical-Earth approximation; error stays well under a metre at the short ranges
/// duplicate detection cares about.
pub fn haversine_distance_m(a: &Coordinates, b: &Coordinates) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    let c = 2.0 * h.min(1.0).sqrt().asin();
    EARTH_RADIUS_M * c
}

/// Point reached by moving `metres` due north. Used to build fixtures at known distances.
pub fn offset_north(from: &Coordinates, metres: f64) -> Coordinates {
    let d_lat = (metres / EARTH_RADIUS_M).to_degrees();
    Coordinates::new(from.latitude + d_lat, from.longitude)
}
