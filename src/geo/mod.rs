// Great-circle geometry shared by the throttle and the tracking view.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine distance between two points, in meters.
pub fn haversine_m(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Haversine distance between two points, in kilometers.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    haversine_m(from, to) / 1000.0
}
