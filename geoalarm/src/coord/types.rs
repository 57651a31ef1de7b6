//! Geographic value types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Minimum valid longitude in degrees.
pub const MIN_LNG: f64 = -180.0;
/// Maximum valid longitude in degrees.
pub const MAX_LNG: f64 = 180.0;

/// Errors raised when building or parsing coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude outside [-90, 90] or not a number.
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] or not a number.
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    /// Text could not be read as `lat,lng`.
    #[error("Cannot parse coordinate '{0}': expected LAT,LNG")]
    Parse(String),
}

/// A WGS84 latitude/longitude pair in degrees.
///
/// Immutable value type. Construct with [`Coordinate::new`] to get range
/// validation; the fields stay public for pattern matching and display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl Coordinate {
    /// Create a validated coordinate.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordError> {
        // RangeInclusive::contains is false for NaN
        if !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(CoordError::InvalidLatitude(lat));
        }
        if !(MIN_LNG..=MAX_LNG).contains(&lng) {
            return Err(CoordError::InvalidLongitude(lng));
        }
        Ok(Self { lat, lng })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

impl FromStr for Coordinate {
    type Err = CoordError;

    /// Parse `"lat,lng"`. Whitespace around either number is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| CoordError::Parse(s.to_string()))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| CoordError::Parse(s.to_string()))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| CoordError::Parse(s.to_string()))?;
        Coordinate::new(lat, lng)
    }
}

/// A coordinate with an optional human-readable address.
///
/// Map clicks produce a bare location that may gain an address later via
/// reverse geocoding; place search produces one with the address filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coordinate: Coordinate,
    pub address: Option<String>,
}

impl Location {
    /// A location without an address.
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            address: None,
        }
    }

    /// A location with a known address.
    pub fn with_address(coordinate: Coordinate, address: impl Into<String>) -> Self {
        Self {
            coordinate,
            address: Some(address.into()),
        }
    }

    /// Address if known, otherwise a generic label.
    pub fn label(&self) -> &str {
        self.address.as_deref().unwrap_or("Selected Location")
    }
}

impl From<Coordinate> for Location {
    fn from(coordinate: Coordinate) -> Self {
        Location::new(coordinate)
    }
}
