//! Latitude/longitude pairs.

use serde::Serialize;

/// Decimal places kept when collapsing nearby points into one lookup key.
pub const LOOKUP_PRECISION: i32 = 4;

/// A valid coordinate pair: both components present and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Builds a pair from nullable components. Missing or non-finite values yield `None`.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
                Some(Self {
                    latitude,
                    longitude,
                })
            }
            _ => None,
        }
    }

    /// Rounds both components to [`LOOKUP_PRECISION`] decimals.
    pub fn rounded(&self) -> Self {
        let scale = 10f64.powi(LOOKUP_PRECISION);
        Self {
            latitude: (self.latitude * scale).round() / scale,
            longitude: (self.longitude * scale).round() / scale,
        }
    }

    /// Hashable key of the rounded pair.
    pub fn lookup_key(&self) -> (i64, i64) {
        let scale = 10f64.powi(LOOKUP_PRECISION);
        (
            (self.latitude * scale).round() as i64,
            (self.longitude * scale).round() as i64,
        )
    }

    /// Great-circle distance in kilometres.
    pub fn haversine_km(&self, other: &Coordinate) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}
