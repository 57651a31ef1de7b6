//! GeoAlarm - proximity alarm for a chosen destination
//!
//! This library watches a live position and sounds an alarm when the user
//! comes within a configurable radius of a destination.
//!
//! # Modules
//!
//! - [`coord`] - coordinates, haversine distance, display formatting
//! - [`alarm`] - radius policy and the geofence state machine
//! - [`session`] - controller wiring the state machine to its collaborators
//! - [`position`] - position source port and built-in sources
//! - [`sound`] - alarm sound port
//! - [`geocode`] - reverse geocoding port
//! - [`config`] - INI configuration file
//! - [`logging`] - tracing subscriber setup

pub mod alarm;
pub mod config;
pub mod coord;
pub mod geocode;
pub mod logging;
pub mod position;
pub mod session;
pub mod sound;
