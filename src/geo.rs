//! Great-circle geometry on a spherical Earth.

use crate::error::ScrubError;

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Fails with [`ScrubError::InvalidArgument`] unless both components are
    /// finite and inside their ranges.
    pub fn new(lat: f64, lon: f64) -> Result<Self, ScrubError> {
        let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
        let lon_ok = lon.is_finite() && (-180.0..=180.0).contains(&lon);
        if lat_ok && lon_ok {
            Ok(Self { lat, lon })
        } else {
            Err(ScrubError::InvalidArgument {
                latitude: lat,
                longitude: lon,
            })
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl TryFrom<(f64, f64)> for Coordinate {
    type Error = ScrubError;

    fn try_from((lat, lon): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(lat, lon)
    }
}

/// Haversine distance in meters, rounded to centimeters.
pub fn distance(origin: Coordinate, destination: Coordinate) -> f64 {
    let lat1 = origin.lat.to_radians();
    let lat2 = destination.lat.to_radians();
    let d_lat = (destination.lat - origin.lat).to_radians();
    let d_lon = (destination.lon - origin.lon).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    round2(EARTH_RADIUS_M * c)
}

/// Initial compass bearing from `origin` towards `destination`, in degrees
/// clockwise from true north within [0, 360).
pub fn bearing(origin: Coordinate, destination: Coordinate) -> f64 {
    let lat1 = origin.lat.to_radians();
    let lat2 = destination.lat.to_radians();
    let d_lon = (destination.lon - origin.lon).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    let heading = (y.atan2(x).to_degrees() + 360.0) % 360.0;
    let heading = round2(heading);
    if heading >= 360.0 { 0.0 } else { heading }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
