//! Refusals raised by session transitions.

use thiserror::Error;

/// A transition was refused because its precondition did not hold.
///
/// Refusals never change session state. They are reported to the caller so
/// the UI can explain why a button did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Tracking requires a destination.
    #[error("No destination selected")]
    NoDestination,

    /// Tracking is already running.
    #[error("Already tracking")]
    AlreadyTracking,

    /// Dismiss was requested while the alarm was not sounding.
    #[error("Alarm is not triggered")]
    NotTriggered,

    /// The radius cannot change while tracking.
    #[error("Stop tracking to adjust radius")]
    RadiusLocked,
}
