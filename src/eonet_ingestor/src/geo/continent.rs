//! Bounding-box continent heuristic.
//!
//! Rules are evaluated in order and the first match wins. All bounds are
//! inclusive. The boxes overlap on purpose (e.g. Central America matches
//! South America before North America), and some areas match nothing: high
//! northern latitudes between 25°W and 45°E above 72°N, the South Atlantic
//! below 35°S, and so on. Those gaps return `None`.

use crate::models::continent::Continent;

/// Wraps a longitude into [-180, 180).
pub fn normalize_longitude(longitude: f64) -> f64 {
    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 { wrapped - 360.0 } else { wrapped }
}

fn within(value: f64, low: f64, high: f64) -> bool {
    (low..=high).contains(&value)
}

/// Classifies a nullable latitude/longitude pair.
pub fn classify_continent(latitude: Option<f64>, longitude: Option<f64>) -> Option<Continent> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => classify_point(lat, lon),
        _ => None,
    }
}

/// Classifies a point. Non-finite input yields `None`.
pub fn classify_point(latitude: f64, longitude: f64) -> Option<Continent> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    let lat = latitude;
    let lon = normalize_longitude(longitude);

    if lat <= -60.0 {
        return Some(Continent::Antarctica);
    }
    if (within(lon, 110.0, 180.0) || within(lon, -180.0, -140.0)) && within(lat, -50.0, 10.0) {
        return Some(Continent::Oceania);
    }
    if within(lon, -82.0, -34.0) && within(lat, -56.0, 13.0) {
        return Some(Continent::SouthAmerica);
    }
    if within(lon, -170.0, -50.0) && within(lat, -15.0, 83.0) {
        return Some(Continent::NorthAmerica);
    }
    if within(lon, -20.0, 60.0) && within(lat, -35.0, 38.0) {
        return Some(Continent::Africa);
    }
    if within(lon, -25.0, 45.0) && within(lat, 36.0, 72.0) {
        return Some(Continent::Europe);
    }
    if lon > 45.0 || lon < -25.0 {
        return Some(Continent::Asia);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn literal_reference_points() {
        assert_eq!(classify_point(-70.0, 0.0), Some(Continent::Antarctica));
        assert_eq!(classify_point(40.0, -100.0), Some(Continent::NorthAmerica));
        assert_eq!(classify_point(50.0, 10.0), Some(Continent::Europe));
        assert_eq!(classify_point(0.0, 150.0), Some(Continent::Oceania));
        assert_eq!(classify_point(48.0, 90.0), Some(Continent::Asia));
        assert_eq!(classify_point(-15.0, -60.0), Some(Continent::SouthAmerica));
        assert_eq!(classify_point(5.0, 20.0), Some(Continent::Africa));
    }

    #[test]
    fn null_inputs_are_unclassified() {
        assert_eq!(classify_continent(None, Some(10.0)), None);
        assert_eq!(classify_continent(Some(10.0), None), None);
        assert_eq!(classify_point(f64::NAN, 10.0), None);
        assert_eq!(classify_point(10.0, f64::INFINITY), None);
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert_eq!(classify_point(-60.0, 0.0), Some(Continent::Antarctica));
        assert_eq!(classify_point(-59.999, 0.0), None);
        // Oceania box corner, before South/North America get a chance.
        assert_eq!(classify_point(10.0, -140.0), Some(Continent::Oceania));
        assert_eq!(classify_point(10.0, -139.999), Some(Continent::NorthAmerica));
        // South America wins the overlap with North America.
        assert_eq!(classify_point(13.0, -82.0), Some(Continent::SouthAmerica));
        assert_eq!(classify_point(13.001, -82.0), Some(Continent::NorthAmerica));
        // Africa's northern edge overlaps Europe's southern one.
        assert_eq!(classify_point(38.0, 10.0), Some(Continent::Africa));
        assert_eq!(classify_point(38.001, 10.0), Some(Continent::Europe));
        assert_eq!(classify_point(72.0, 45.0), Some(Continent::Europe));
    }

    #[test]
    fn unclassified_gaps_stay_null() {
        // Arctic Ocean north of Scandinavia.
        assert_eq!(classify_point(80.0, 0.0), None);
        // South Atlantic between South America and Africa's boxes.
        assert_eq!(classify_point(-40.0, 0.0), None);
    }

    #[test]
    fn longitudes_wrap_around() {
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(180.0), -180.0);
        assert_eq!(classify_point(50.0, 370.0), Some(Continent::Europe));
        assert_eq!(classify_point(0.0, 510.0), Some(Continent::Oceania));
        assert_eq!(classify_point(40.0, 260.0), Some(Continent::NorthAmerica));
    }

    proptest! {
        #[test]
        fn total_and_deterministic(lat in -90.0f64..=90.0, lon in -720.0f64..=720.0) {
            let first = classify_point(lat, lon);
            prop_assert_eq!(first, classify_point(lat, lon));
        }

        #[test]
        fn normalized_longitude_is_in_range(lon in -1.0e6f64..1.0e6) {
            let n = normalize_longitude(lon);
            prop_assert!((-180.0..180.0).contains(&n));
        }
    }
}
