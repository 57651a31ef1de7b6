//! Position acquisition port.
//!
//! The session controller reaches the device location through the
//! [`PositionSource`] trait. Two calls are supported:
//!
//! - **One-shot** ([`PositionSource::current_position`]) used to seed the
//!   user position when a session starts.
//! - **Continuous** ([`PositionSource::watch`]) which delivers fixes into a
//!   channel until the returned [`WatchHandle`] is cancelled.
//!
//! Retries, permission prompts and fix timeouts belong to the source. A
//! failed fix is delivered as an `Err` on the same channel and does not end
//! the watch.
//!
//! # Example
//!
//! ```ignore
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let handle = source.watch(&WatchOptions::default(), tx)?;
//!
//! while let Some(fix) = rx.recv().await {
//!     match fix {
//!         Ok(coordinate) => println!("at {}", coordinate),
//!         Err(e) => eprintln!("no fix: {}", e),
//!     }
//! }
//!
//! handle.cancel();
//! ```

mod manual;
mod simulated;

pub use manual::ManualPositionSource;
pub use simulated::{SimulatedPositionSource, DEFAULT_REPLAY_INTERVAL};

use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::coord::Coordinate;

/// Default time a source may take to produce a fix.
pub const DEFAULT_WATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default maximum age of a cached fix.
pub const DEFAULT_MAXIMUM_AGE: Duration = Duration::from_secs(1);

/// Why a position could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionError {
    /// The user or platform denied location access.
    #[error("Location permission denied")]
    PermissionDenied,

    /// No fix could be produced.
    #[error("Position unavailable: {0}")]
    Unavailable(String),

    /// No fix arrived within the configured timeout.
    #[error("Timed out waiting for a position fix")]
    Timeout,

    /// The source has shut down and will deliver nothing more.
    #[error("Position source closed")]
    SourceClosed,
}

/// Result of a single fix.
pub type PositionFix = Result<Coordinate, PositionError>;

/// Requested behaviour for position acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Prefer GPS over coarse network location.
    pub high_accuracy: bool,
    /// How long the source may take to produce a fix.
    pub timeout: Duration,
    /// How old a cached fix may be and still be delivered.
    pub maximum_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: DEFAULT_WATCH_TIMEOUT,
            maximum_age: DEFAULT_MAXIMUM_AGE,
        }
    }
}

impl WatchOptions {
    /// Set high accuracy mode.
    pub fn with_high_accuracy(mut self, high_accuracy: bool) -> Self {
        self.high_accuracy = high_accuracy;
        self
    }

    /// Set the fix timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum fix age.
    pub fn with_maximum_age(mut self, maximum_age: Duration) -> Self {
        self.maximum_age = maximum_age;
        self
    }
}

/// Handle to an open position watch.
///
/// Cancelling is idempotent and takes effect immediately: the source stops
/// producing and consumers holding [`WatchHandle::token`] can stop waiting.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    token: CancellationToken,
}

impl WatchHandle {
    /// Create a handle around a cancellation token.
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Close the watch. Closing an already-closed watch does nothing.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the watch has been closed.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The token observed by the watch.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// An external provider of device positions.
pub trait PositionSource: Send + Sync + 'static {
    /// Obtain a single fix.
    fn current_position(&self, options: &WatchOptions) -> BoxFuture<'_, PositionFix>;

    /// Start delivering fixes into `fixes` until the handle is cancelled.
    ///
    /// Returns an error when the watch cannot be opened at all (for
    /// example, when permission is denied up front).
    fn watch(
        &self,
        options: &WatchOptions,
        fixes: mpsc::UnboundedSender<PositionFix>,
    ) -> Result<WatchHandle, PositionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_options_default() {
        let options = WatchOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.maximum_age, Duration::from_secs(1));
    }

    #[test]
    fn test_watch_options_builder() {
        let options = WatchOptions::default()
            .with_high_accuracy(false)
            .with_timeout(Duration::from_secs(30))
            .with_maximum_age(Duration::ZERO);
        assert!(!options.high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.maximum_age, Duration::ZERO);
    }

    #[test]
    fn test_watch_handle_cancel_is_idempotent() {
        let handle = WatchHandle::new(CancellationToken::new());
        assert!(!handle.is_cancelled());
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(handle.token().is_cancelled());
    }

    #[test]
    fn test_position_error_display() {
        assert_eq!(
            PositionError::PermissionDenied.to_string(),
            "Location permission denied"
        );
        assert_eq!(
            PositionError::Unavailable("no satellites".into()).to_string(),
            "Position unavailable: no satellites"
        );
    }
}
