//! Geofence alarm core.
//!
//! This module holds the pure part of the system: the radius policy, the
//! alarm state enum and the [`TrackingSession`] state machine that turns
//! position updates into alarm transitions.
//!
//! # Example
//!
//! ```
//! use geoalarm::alarm::{clamp_radius, AlarmState, Effect, TrackingSession};
//! use geoalarm::coord::{Coordinate, Location};
//!
//! let mut session = TrackingSession::new(clamp_radius(1.0));
//! session.set_destination(Location::new(Coordinate::new(0.0, 0.0).unwrap()));
//! session.start_tracking().unwrap();
//!
//! let effects = session.position_update(Coordinate::new(0.0, 0.001).unwrap());
//! assert_eq!(effects, vec![Effect::StartSound]);
//! assert_eq!(session.alarm_state(), AlarmState::Triggered);
//! ```

mod error;
mod machine;
mod radius;
mod state;

pub use error::SessionError;
pub use machine::{Effect, TrackingSession};
pub use radius::{
    clamp_radius, AlarmRadius, DEFAULT_RADIUS_KM, MAX_RADIUS_KM, MIN_RADIUS_KM, RADIUS_STEP_KM,
};
pub use state::AlarmState;
