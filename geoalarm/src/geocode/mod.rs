//! Reverse geocoding port.
//!
//! Turning a clicked coordinate into a street address is best-effort. The
//! destination is usable before an address arrives, and a missing address
//! only affects display.

use futures::future::BoxFuture;

use crate::coord::{distance_km, Coordinate};

/// Resolves coordinates to human-readable addresses.
pub trait ReverseGeocoder: Send + Sync + 'static {
    /// Look up an address for `coordinate`. `None` when nothing is known.
    fn reverse_geocode(&self, coordinate: Coordinate) -> BoxFuture<'_, Option<String>>;
}

/// A geocoder that never knows an address.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeocoder;

impl ReverseGeocoder for NoGeocoder {
    fn reverse_geocode(&self, _coordinate: Coordinate) -> BoxFuture<'_, Option<String>> {
        Box::pin(async { None })
    }
}

/// Default match distance for [`StaticGeocoder`].
pub const DEFAULT_MATCH_RADIUS_KM: f64 = 0.25;

/// A geocoder backed by a fixed list of named places.
///
/// Returns the nearest place within the match radius.
#[derive(Debug, Clone)]
pub struct StaticGeocoder {
    places: Vec<(Coordinate, String)>,
    match_radius_km: f64,
}

impl Default for StaticGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticGeocoder {
    /// Create an empty gazetteer.
    pub fn new() -> Self {
        Self {
            places: Vec::new(),
            match_radius_km: DEFAULT_MATCH_RADIUS_KM,
        }
    }

    /// Add a named place.
    pub fn with_place(mut self, coordinate: Coordinate, address: impl Into<String>) -> Self {
        self.places.push((coordinate, address.into()));
        self
    }

    /// Set how far a coordinate may be from a place and still match.
    pub fn with_match_radius_km(mut self, km: f64) -> Self {
        self.match_radius_km = km;
        self
    }

    /// Synchronous lookup used by the async trait method.
    pub fn lookup(&self, coordinate: Coordinate) -> Option<&str> {
        self.places
            .iter()
            .map(|(place, address)| (distance_km(coordinate, *place), address))
            .filter(|(d, _)| *d <= self.match_radius_km)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, address)| address.as_str())
    }
}

impl ReverseGeocoder for StaticGeocoder {
    fn reverse_geocode(&self, coordinate: Coordinate) -> BoxFuture<'_, Option<String>> {
        let address = self.lookup(coordinate).map(str::to_string);
        Box::pin(async move { address })
    }
}
