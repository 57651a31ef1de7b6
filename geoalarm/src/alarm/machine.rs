//! Geofence state machine.
//!
//! [`TrackingSession`] owns the destination, the latest user position, the
//! radius and the alarm state. Every mutation goes through a transition
//! method which returns the side effects the caller must perform. The
//! session itself performs no I/O, which keeps it synchronous and directly
//! testable.
//!
//! # Transitions
//!
//! ```text
//! *          set_destination    -> Idle       StopSound, StopWatch
//! Idle       start_tracking     -> Armed      StartWatch
//! Armed      update (d <= r)    -> Triggered  StartSound
//! Triggered  dismiss_alarm      -> Dismissed  StopSound
//! Dismissed  update (d > r)     -> Armed
//! tracking   stop_tracking      -> Idle       StopSound, StopWatch
//! *          clear_destination  -> Idle       StopSound, StopWatch
//! ```
//!
//! Stop effects are emitted unconditionally; the sound and watch ports treat
//! a redundant stop as a no-op.

use tracing::{debug, info};

use crate::coord::{distance_km, Coordinate, Location};

use super::error::SessionError;
use super::radius::{clamp_radius, AlarmRadius};
use super::state::AlarmState;

/// A side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Start the alarm sound.
    StartSound,
    /// Stop the alarm sound.
    StopSound,
    /// Open the continuous position watch.
    StartWatch,
    /// Close the continuous position watch.
    StopWatch,
}

/// The aggregate state of one destination-tracking session.
#[derive(Debug, Clone, Default)]
pub struct TrackingSession {
    destination: Option<Location>,
    user_position: Option<Location>,
    radius: AlarmRadius,
    alarm_state: AlarmState,
}

impl TrackingSession {
    /// Create an idle session with no destination.
    pub fn new(radius: AlarmRadius) -> Self {
        Self {
            radius,
            ..Default::default()
        }
    }

    /// The current destination, if any.
    pub fn destination(&self) -> Option<&Location> {
        self.destination.as_ref()
    }

    /// The latest known user position, if any.
    pub fn user_position(&self) -> Option<&Location> {
        self.user_position.as_ref()
    }

    /// The geofence radius.
    pub fn radius(&self) -> AlarmRadius {
        self.radius
    }

    /// The current alarm state.
    pub fn alarm_state(&self) -> AlarmState {
        self.alarm_state
    }

    /// Whether a position watch should be running.
    pub fn is_tracking(&self) -> bool {
        self.alarm_state.is_tracking()
    }

    /// Distance from the user to the destination, when both are known.
    pub fn distance_km(&self) -> Option<f64> {
        let destination = self.destination.as_ref()?;
        let user = self.user_position.as_ref()?;
        Some(distance_km(user.coordinate, destination.coordinate))
    }

    /// Select a new destination.
    ///
    /// Cancels any in-flight alarm and returns to `Idle`, including when
    /// tracking was active.
    pub fn set_destination(&mut self, location: Location) -> Vec<Effect> {
        info!(
            destination = %location.coordinate,
            address = location.address.as_deref().unwrap_or(""),
            "Destination selected"
        );
        self.destination = Some(location);
        self.transition(AlarmState::Idle);
        vec![Effect::StopSound, Effect::StopWatch]
    }

    /// Clear the destination and reset the session.
    ///
    /// The radius and the last known user position are kept; they do not
    /// belong to the destination.
    pub fn clear_destination(&mut self) -> Vec<Effect> {
        if self.destination.take().is_some() {
            info!("Destination cleared");
        }
        self.transition(AlarmState::Idle);
        vec![Effect::StopSound, Effect::StopWatch]
    }

    /// Begin tracking towards the destination.
    ///
    /// The last known position is evaluated straight away, so a user who is
    /// already inside the radius is alarmed without waiting for a new fix.
    pub fn start_tracking(&mut self) -> Result<Vec<Effect>, SessionError> {
        if self.destination.is_none() {
            return Err(SessionError::NoDestination);
        }
        if self.is_tracking() {
            return Err(SessionError::AlreadyTracking);
        }

        self.transition(AlarmState::Armed);
        let mut effects = vec![Effect::StartWatch];
        effects.extend(self.evaluate());
        Ok(effects)
    }

    /// Stop tracking and silence the alarm.
    ///
    /// Always succeeds. From `Idle` nothing transitions, but the stop effects
    /// are still emitted so a stray watch or sound is closed.
    pub fn stop_tracking(&mut self) -> Vec<Effect> {
        if self.is_tracking() {
            self.transition(AlarmState::Idle);
        }
        vec![Effect::StopSound, Effect::StopWatch]
    }

    /// Silence a triggered alarm.
    pub fn dismiss_alarm(&mut self) -> Result<Vec<Effect>, SessionError> {
        if self.alarm_state != AlarmState::Triggered {
            return Err(SessionError::NotTriggered);
        }
        self.transition(AlarmState::Dismissed);
        Ok(vec![Effect::StopSound])
    }

    /// Change the geofence radius. Refused while tracking.
    ///
    /// Returns the radius actually stored after clamping.
    pub fn set_radius(&mut self, requested_km: f64) -> Result<AlarmRadius, SessionError> {
        if self.is_tracking() {
            return Err(SessionError::RadiusLocked);
        }
        self.radius = clamp_radius(requested_km);
        debug!(requested_km, radius = %self.radius, "Alarm radius set");
        Ok(self.radius)
    }

    /// Record a new user position and re-evaluate the geofence.
    ///
    /// The position is always stored, so the distance stays live in every
    /// state. Only `Armed` and `Dismissed` can transition here.
    pub fn position_update(&mut self, position: Coordinate) -> Vec<Effect> {
        self.user_position = Some(Location::new(position));
        self.evaluate()
    }

    /// Attach a resolved address to the destination.
    ///
    /// Applied only if the destination is still at `coordinate`; a late
    /// result for a replaced destination is dropped. Never transitions.
    /// Returns whether the address was applied.
    pub fn set_destination_address(&mut self, coordinate: Coordinate, address: String) -> bool {
        match self.destination.as_mut() {
            Some(destination) if destination.coordinate == coordinate => {
                debug!(%coordinate, address = %address, "Destination address resolved");
                destination.address = Some(address);
                true
            }
            _ => false,
        }
    }

    fn evaluate(&mut self) -> Vec<Effect> {
        let Some(distance) = self.distance_km() else {
            return Vec::new();
        };
        let radius = self.radius.km();

        match self.alarm_state {
            AlarmState::Armed if distance <= radius => {
                self.transition(AlarmState::Triggered);
                vec![Effect::StartSound]
            }
            AlarmState::Dismissed if distance > radius => {
                self.transition(AlarmState::Armed);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn transition(&mut self, to: AlarmState) {
        let from = self.alarm_state;
        if from == to {
            return;
        }
        self.alarm_state = to;

        info!(
            from = %from,
            to = %to,
            distance_km = self.distance_km(),
            radius_km = self.radius.km(),
            "Alarm state transition"
        );
    }
}
