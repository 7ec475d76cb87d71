//! Geographic utilities shared by the point locator and the navigation
//! tracker: haversine distance, path length, bounds.

use crate::{Bounds, LatLng};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in meters (haversine).
pub fn haversine_distance(p1: &LatLng, p2: &LatLng) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlat = (p2.latitude - p1.latitude).to_radians();
    let dlng = (p2.longitude - p1.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Bounding box over a set of coordinates.
pub fn compute_bounds(points: &[LatLng]) -> Option<Bounds> {
    Bounds::from_points(points)
}
