//! Read-only session view for presentation layers.

use serde::Serialize;

use crate::alarm::{AlarmState, TrackingSession};
use crate::coord::{format_distance, format_radius, Location};
use crate::position::PositionError;

/// Point-in-time copy of the session state.
///
/// Recomputed after every accepted event and published through
/// [`SessionController::subscribe`](super::SessionController::subscribe).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Selected destination.
    pub destination: Option<Location>,

    /// Latest user position.
    pub user_position: Option<Location>,

    /// Distance from user to destination when both are known.
    pub distance_km: Option<f64>,

    /// Whether a position watch is active.
    pub is_tracking: bool,

    /// Current alarm state.
    pub alarm_state: AlarmState,

    /// Geofence radius.
    pub radius_km: f64,

    /// Most recent position failure, cleared by the next good fix.
    pub last_position_error: Option<PositionError>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::from_session(&TrackingSession::default(), None)
    }
}

impl SessionSnapshot {
    /// Capture the state of `session`.
    pub fn from_session(
        session: &TrackingSession,
        last_position_error: Option<PositionError>,
    ) -> Self {
        Self {
            destination: session.destination().cloned(),
            user_position: session.user_position().cloned(),
            distance_km: session.distance_km(),
            is_tracking: session.is_tracking(),
            alarm_state: session.alarm_state(),
            radius_km: session.radius().km(),
            last_position_error,
        }
    }

    /// Distance formatted for display, or `"--"` when unknown.
    pub fn distance_display(&self) -> String {
        self.distance_km
            .map(format_distance)
            .unwrap_or_else(|| "--".to_string())
    }

    /// Radius formatted for display.
    pub fn radius_display(&self) -> String {
        format_radius(self.radius_km)
    }
}
