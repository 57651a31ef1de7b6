//! Tracking session orchestration.
//!
//! The [`SessionController`] owns a [`TrackingSession`](crate::alarm::TrackingSession)
//! and connects it to a [`PositionSource`](crate::position::PositionSource),
//! an [`AlarmSink`](crate::sound::AlarmSink) and a
//! [`ReverseGeocoder`](crate::geocode::ReverseGeocoder).
//!
//! # Example
//!
//! ```ignore
//! use geoalarm::session::SessionController;
//!
//! let controller = SessionController::builder()
//!     .with_config(&config)
//!     .with_position_source(source)
//!     .with_alarm_sink(sink)
//!     .build()?;
//!
//! controller.seed_initial_position().await.ok();
//! controller.set_destination_from_click(destination);
//! controller.start_tracking()?;
//!
//! let mut snapshots = controller.subscribe();
//! while snapshots.changed().await.is_ok() {
//!     let snapshot = snapshots.borrow().clone();
//!     println!("{} to go", snapshot.distance_display());
//! }
//! ```

mod controller;
mod error;
mod snapshot;

pub use controller::{SessionController, SessionControllerBuilder};
pub use error::ControllerError;
pub use snapshot::SessionSnapshot;
