//! Alarm state for the geofence cycle.

use serde::Serialize;

/// Where the session is in its alarm cycle.
///
/// ```text
/// Idle --start--> Armed --inside radius--> Triggered --dismiss--> Dismissed
///                   ^                                                 |
///                   +------------------ outside radius ---------------+
/// ```
///
/// Any tracking state returns to `Idle` on stop, clear or a new destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    /// Not tracking. A destination may or may not be set.
    #[default]
    Idle,

    /// Tracking and waiting for the user to enter the radius.
    Armed,

    /// Inside the radius; the alarm is sounding and stays latched until
    /// dismissed, even if the user leaves the radius again.
    Triggered,

    /// Alarm silenced by the user. Re-arms once the user is strictly outside
    /// the radius.
    Dismissed,
}

impl AlarmState {
    /// Whether a position watch is active in this state.
    pub fn is_tracking(&self) -> bool {
        !matches!(self, AlarmState::Idle)
    }

    /// Whether the alarm sound should be playing in this state.
    pub fn is_sounding(&self) -> bool {
        matches!(self, AlarmState::Triggered)
    }

    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            AlarmState::Idle => "not tracking",
            AlarmState::Armed => "tracking, alarm armed",
            AlarmState::Triggered => "destination reached",
            AlarmState::Dismissed => "alarm dismissed",
        }
    }
}

impl std::fmt::Display for AlarmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlarmState::Idle => write!(f, "idle"),
            AlarmState::Armed => write!(f, "armed"),
            AlarmState::Triggered => write!(f, "triggered"),
            AlarmState::Dismissed => write!(f, "dismissed"),
        }
    }
}
