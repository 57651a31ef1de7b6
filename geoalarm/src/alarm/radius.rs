//! Alarm radius policy.
//!
//! The geofence radius is user-adjustable between 100 m and 10 km; the
//! slider moves in 0.1 km steps. The lower bound reflects typical consumer GPS accuracy; anything
//! tighter would fire (or fail to fire) on noise alone.

use std::fmt;

use crate::coord::format_radius;

/// Smallest allowed radius in kilometers (100 m).
pub const MIN_RADIUS_KM: f64 = 0.1;

/// Largest allowed radius in kilometers.
pub const MAX_RADIUS_KM: f64 = 10.0;

/// Radius used when nothing else is configured.
pub const DEFAULT_RADIUS_KM: f64 = 1.0;

/// Granularity of the radius slider in kilometers.
pub const RADIUS_STEP_KM: f64 = 0.1;

/// A geofence radius that is always within bounds.
///
/// The only way to build one is [`clamp_radius`] (or [`AlarmRadius::default`]),
/// so holders never need to re-validate.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct AlarmRadius(f64);

impl AlarmRadius {
    /// Radius in kilometers.
    pub fn km(self) -> f64 {
        self.0
    }

    /// Radius in whole metres.
    pub fn meters(self) -> u32 {
        (self.0 * 1000.0).round() as u32
    }
}

impl Default for AlarmRadius {
    fn default() -> Self {
        Self(DEFAULT_RADIUS_KM)
    }
}

impl fmt::Display for AlarmRadius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_radius(self.0))
    }
}

/// Clamp a requested radius into `[MIN_RADIUS_KM, MAX_RADIUS_KM]`.
///
/// In-range values are kept exactly. NaN maps to the default radius.
pub fn clamp_radius(requested: f64) -> AlarmRadius {
    if requested.is_nan() {
        return AlarmRadius::default();
    }
    AlarmRadius(requested.clamp(MIN_RADIUS_KM, MAX_RADIUS_KM))
}
