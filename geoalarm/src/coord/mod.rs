//! Coordinate types and the great-circle distance metric.
//!
//! Provides the [`Coordinate`] and [`Location`] value types used throughout
//! the crate, the haversine [`distance_km`] function that drives geofence
//! decisions, and the display helpers used by presentation layers.

mod types;

pub use types::{CoordError, Coordinate, Location, MAX_LAT, MAX_LNG, MIN_LAT, MIN_LNG};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers.
///
/// Uses the haversine formula on a sphere of radius [`EARTH_RADIUS_KM`].
/// The intermediate term is clamped to 1 before `asin` so antipodal points
/// cannot produce NaN through floating-point overshoot.
///
/// # Example
///
/// ```
/// use geoalarm::coord::{distance_km, Coordinate};
///
/// let a = Coordinate::new(0.0, 0.0).unwrap();
/// let b = Coordinate::new(0.0, 0.02).unwrap();
/// let d = distance_km(a, b);
/// assert!((d - 2.224).abs() < 0.001);
/// ```
#[inline]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lng = (d_lng / 2.0).sin();

    let h = sin_lat * sin_lat
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * sin_lng * sin_lng;

    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Format a distance for display.
///
/// Below 1 km the value is shown in whole metres (`"850 m"`), otherwise in
/// kilometers with two decimals (`"2.22 km"`).
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{} m", (km * 1000.0).round() as i64)
    } else {
        format!("{:.2} km", km)
    }
}

/// Format an alarm radius for display.
///
/// Below 1 km the value is shown in whole metres (`"100 m"`), otherwise in
/// kilometers without trailing zeros (`"1 km"`, `"2.5 km"`).
pub fn format_radius(km: f64) -> String {
    if km < 1.0 {
        format!("{} m", (km * 1000.0).round() as i64)
    } else {
        format!("{} km", km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        let a = coord(40.7128, -74.006);
        assert_eq!(distance_km(a, a), 0.0);
    }

    #[test]
    fn test_distance_small_offset_at_equator() {
        // 0.02° of longitude at the equator
        let d = distance_km(coord(0.0, 0.0), coord(0.0, 0.02));
        assert!((d - 2.2239).abs() < 0.001, "got {}", d);
    }

    #[test]
    fn test_distance_new_york_to_london() {
        let nyc = coord(40.7128, -74.0060);
        let london = coord(51.5074, -0.1278);
        let d = distance_km(nyc, london);
        assert!((d - 5570.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn test_distance_antipodal_is_finite() {
        let d = distance_km(coord(0.0, 0.0), coord(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);

        let poles = distance_km(coord(90.0, 0.0), coord(-90.0, 0.0));
        assert!((poles - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_distance_monotonic_with_separation() {
        let origin = coord(10.0, 10.0);
        let mut last = 0.0;
        for step in 1..=10 {
            let d = distance_km(origin, coord(10.0 + step as f64, 10.0));
            assert!(d > last);
            last = d;
        }
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(0.85), "850 m");
        assert_eq!(format_distance(0.9996), "1000 m");
        assert_eq!(format_distance(1.0), "1.00 km");
        assert_eq!(format_distance(2.2239), "2.22 km");
    }

    #[test]
    fn test_format_radius() {
        assert_eq!(format_radius(0.1), "100 m");
        assert_eq!(format_radius(0.5), "500 m");
        assert_eq!(format_radius(1.0), "1 km");
        assert_eq!(format_radius(2.5), "2.5 km");
        assert_eq!(format_radius(10.0), "10 km");
    }

    fn arb_coord() -> impl Strategy<Value = Coordinate> {
        (MIN_LAT..=MAX_LAT, MIN_LNG..=MAX_LNG).prop_map(|(lat, lng)| Coordinate { lat, lng })
    }

    proptest! {
        #[test]
        fn prop_distance_zero_to_self(a in arb_coord()) {
            prop_assert_eq!(distance_km(a, a), 0.0);
        }

        #[test]
        fn prop_distance_symmetric(a in arb_coord(), b in arb_coord()) {
            let ab = distance_km(a, b);
            let ba = distance_km(b, a);
            prop_assert!((ab - ba).abs() < 1e-9, "ab={} ba={}", ab, ba);
        }

        #[test]
        fn prop_distance_bounded(a in arb_coord(), b in arb_coord()) {
            let d = distance_km(a, b);
            prop_assert!(d.is_finite());
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }
    }
}
