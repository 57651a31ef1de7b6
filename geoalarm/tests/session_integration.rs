//! Integration tests for the session controller.
//!
//! These tests drive the complete flow:
//! - position source → watch task → state machine → alarm sink
//! - snapshot publication after every accepted event
//! - watch cancellation and stale-fix rejection
//! - best-effort reverse geocoding
//!
//! Run with: `cargo test --test session_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{watch, Semaphore};

use geoalarm::alarm::AlarmState;
use geoalarm::coord::{Coordinate, Location};
use geoalarm::geocode::{ReverseGeocoder, StaticGeocoder};
use geoalarm::position::{ManualPositionSource, PositionError, SimulatedPositionSource};
use geoalarm::session::{SessionController, SessionSnapshot};
use geoalarm::sound::AlarmSink;

// ============================================================================
// Helper Types
// ============================================================================

const WAIT: Duration = Duration::from_secs(2);

/// Alarm sink that counts calls.
#[derive(Default)]
struct RecordingSink {
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl RecordingSink {
    fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl AlarmSink for RecordingSink {
    fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Geocoder that waits for a permit before answering.
struct GatedGeocoder {
    gate: Semaphore,
    address: String,
}

impl ReverseGeocoder for GatedGeocoder {
    fn reverse_geocode(&self, _coordinate: Coordinate) -> BoxFuture<'_, Option<String>> {
        Box::pin(async move {
            let _permit = self.gate.acquire().await.ok()?;
            Some(self.address.clone())
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

/// Destination used by most tests.
fn destination() -> Location {
    Location::new(coord(0.0, 0.0))
}

/// ~2.2 km east of the destination.
fn outside() -> Coordinate {
    coord(0.0, 0.02)
}

/// ~110 m east of the destination.
fn inside() -> Coordinate {
    coord(0.0, 0.001)
}

fn setup() -> (SessionController, Arc<ManualPositionSource>, Arc<RecordingSink>) {
    let source = Arc::new(ManualPositionSource::new());
    let sink = Arc::new(RecordingSink::default());
    let controller = SessionController::builder()
        .with_position_source(source.clone())
        .with_alarm_sink(sink.clone())
        .build()
        .expect("controller should build inside a runtime");
    (controller, source, sink)
}

async fn wait_until<F>(rx: &mut watch::Receiver<SessionSnapshot>, mut predicate: F) -> SessionSnapshot
where
    F: FnMut(&SessionSnapshot) -> bool,
{
    tokio::time::timeout(WAIT, rx.wait_for(|s| predicate(s)))
        .await
        .expect("timed out waiting for snapshot")
        .expect("snapshot channel closed")
        .clone()
}

async fn wait_for_position(
    rx: &mut watch::Receiver<SessionSnapshot>,
    position: Coordinate,
) -> SessionSnapshot {
    wait_until(rx, |s| {
        s.user_position.as_ref().map(|l| l.coordinate) == Some(position)
    })
    .await
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Arrive, dismiss, leave, stop.
#[tokio::test]
async fn test_arrival_scenario() {
    let (controller, source, sink) = setup();
    let mut rx = controller.subscribe();

    controller.set_destination(destination());
    controller.start_tracking().unwrap();

    source.push(Ok(outside()));
    let snapshot = wait_for_position(&mut rx, outside()).await;
    assert_eq!(snapshot.alarm_state, AlarmState::Armed);
    assert!((snapshot.distance_km.unwrap() - 2.22).abs() < 0.01);

    source.push(Ok(coord(0.0, 0.0)));
    let snapshot = wait_until(&mut rx, |s| s.alarm_state == AlarmState::Triggered).await;
    assert_eq!(snapshot.distance_km, Some(0.0));
    assert_eq!(sink.starts(), 1);
    assert!(controller.is_alarm_playing());

    controller.dismiss_alarm().unwrap();
    assert_eq!(controller.snapshot().alarm_state, AlarmState::Dismissed);
    assert_eq!(sink.stops(), 1);

    // Still inside: no re-trigger while dismissed
    source.push(Ok(inside()));
    let snapshot = wait_for_position(&mut rx, inside()).await;
    assert_eq!(snapshot.alarm_state, AlarmState::Dismissed);
    assert_eq!(sink.starts(), 1);

    source.push(Ok(outside()));
    let snapshot = wait_for_position(&mut rx, outside()).await;
    assert_eq!(snapshot.alarm_state, AlarmState::Armed);

    // Re-entering after re-arming fires again
    source.push(Ok(inside()));
    wait_until(&mut rx, |s| s.alarm_state == AlarmState::Triggered).await;
    assert_eq!(sink.starts(), 2);

    controller.stop_tracking();
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.alarm_state, AlarmState::Idle);
    assert!(!snapshot.is_tracking);
    assert_eq!(sink.stops(), 2);
    assert_eq!(source.active_watches(), 0);
}

/// Stopping twice, or before ever tracking, is a quiet no-op.
#[tokio::test]
async fn test_repeated_stop_is_noop() {
    let (controller, source, sink) = setup();
    let mut rx = controller.subscribe();

    controller.stop_tracking();
    assert_eq!(sink.stops(), 0);

    controller.set_destination(destination());
    controller.start_tracking().unwrap();
    source.push(Ok(inside()));
    wait_until(&mut rx, |s| s.alarm_state == AlarmState::Triggered).await;

    controller.stop_tracking();
    assert_eq!(sink.stops(), 1);
    assert_eq!(source.active_watches(), 0);

    controller.stop_tracking();
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.alarm_state, AlarmState::Idle);
    assert!(snapshot.destination.is_some());
    assert_eq!(sink.stops(), 1);
    assert!(!controller.is_watching());
}

/// A triggered alarm stays latched after the user leaves the radius.
#[tokio::test]
async fn test_alarm_latched_outside_radius() {
    let (controller, source, sink) = setup();
    let mut rx = controller.subscribe();

    controller.set_destination(destination());
    controller.start_tracking().unwrap();

    source.push(Ok(inside()));
    wait_until(&mut rx, |s| s.alarm_state == AlarmState::Triggered).await;

    source.push(Ok(outside()));
    let snapshot = wait_for_position(&mut rx, outside()).await;
    assert_eq!(snapshot.alarm_state, AlarmState::Triggered);
    assert!(controller.is_alarm_playing());
    assert_eq!(sink.stops(), 0);
}

/// A fix queued before stop_tracking returns must not reach the session.
#[tokio::test]
async fn test_fix_in_flight_discarded_after_stop() {
    let (controller, source, sink) = setup();
    let mut rx = controller.subscribe();

    controller.set_destination(destination());
    controller.start_tracking().unwrap();

    source.push(Ok(outside()));
    wait_for_position(&mut rx, outside()).await;

    // Queue a fix, then stop before the watch task gets to run
    assert_eq!(source.push(Ok(inside())), 1);
    controller.stop_tracking();

    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.alarm_state, AlarmState::Idle);
    assert_eq!(
        snapshot.user_position.map(|l| l.coordinate),
        Some(outside())
    );
    assert_eq!(sink.starts(), 0);

    // The closed watch receives nothing more
    assert_eq!(source.push(Ok(inside())), 0);
}

/// Failed fixes are reported but do not end tracking.
#[tokio::test]
async fn test_watch_error_keeps_tracking() {
    let (controller, source, _sink) = setup();
    let mut rx = controller.subscribe();

    controller.set_destination(destination());
    controller.start_tracking().unwrap();

    source.push(Err(PositionError::Timeout));
    let snapshot = wait_until(&mut rx, |s| s.last_position_error.is_some()).await;
    assert_eq!(snapshot.last_position_error, Some(PositionError::Timeout));
    assert!(snapshot.is_tracking);
    assert_eq!(snapshot.alarm_state, AlarmState::Armed);

    // The watch recovers
    source.push(Ok(inside()));
    let snapshot = wait_until(&mut rx, |s| s.alarm_state == AlarmState::Triggered).await;
    assert!(snapshot.last_position_error.is_none());
}

/// Choosing a new destination mid-alarm cancels everything.
#[tokio::test]
async fn test_new_destination_cancels_alarm_and_watch() {
    let (controller, source, sink) = setup();
    let mut rx = controller.subscribe();

    controller.set_destination(destination());
    controller.start_tracking().unwrap();
    source.push(Ok(inside()));
    wait_until(&mut rx, |s| s.alarm_state == AlarmState::Triggered).await;

    controller.set_destination(Location::with_address(coord(1.0, 1.0), "Elsewhere"));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.alarm_state, AlarmState::Idle);
    assert!(!snapshot.is_tracking);
    assert_eq!(snapshot.destination.unwrap().label(), "Elsewhere");
    assert!(!controller.is_alarm_playing());
    assert_eq!(sink.stops(), 1);
    assert_eq!(source.active_watches(), 0);

    // Tracking can be restarted against the new destination
    controller.start_tracking().unwrap();
    assert_eq!(source.active_watches(), 1);
    assert_eq!(source.watches_opened(), 2);
}

/// Clearing resets the session but keeps the radius.
#[tokio::test]
async fn test_clear_destination() {
    let (controller, source, sink) = setup();
    let mut rx = controller.subscribe();

    controller.set_radius(0.5).unwrap();
    controller.set_destination(destination());
    controller.start_tracking().unwrap();
    source.push(Ok(coord(0.0, 0.0)));
    wait_until(&mut rx, |s| s.alarm_state == AlarmState::Triggered).await;

    controller.clear_destination();

    let snapshot = controller.snapshot();
    assert!(snapshot.destination.is_none());
    assert!(snapshot.distance_km.is_none());
    assert_eq!(snapshot.alarm_state, AlarmState::Idle);
    assert_eq!(snapshot.radius_km, 0.5);
    assert_eq!(sink.stops(), 1);
    assert_eq!(source.active_watches(), 0);

    // Clearing twice is harmless
    controller.clear_destination();
    assert_eq!(sink.stops(), 1);
}

/// The one-shot seed populates the user position.
#[tokio::test]
async fn test_seed_initial_position() {
    let (controller, source, _sink) = setup();
    source.set_current(Ok(outside()));

    let position = controller.seed_initial_position().await.unwrap();
    assert_eq!(position, outside());

    controller.set_destination(destination());
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.alarm_state, AlarmState::Idle);
    assert!((snapshot.distance_km.unwrap() - 2.22).abs() < 0.01);
}

/// A failed seed leaves the user position unknown and is not retried.
#[tokio::test]
async fn test_seed_initial_position_denied() {
    let (controller, source, _sink) = setup();
    source.set_current(Err(PositionError::PermissionDenied));

    let err = controller.seed_initial_position().await.unwrap_err();
    assert_eq!(err, PositionError::PermissionDenied);

    let snapshot = controller.snapshot();
    assert!(snapshot.user_position.is_none());
    assert_eq!(
        snapshot.last_position_error,
        Some(PositionError::PermissionDenied)
    );
    assert_eq!(source.watches_opened(), 0);
}

/// Starting while already inside the radius alarms immediately.
#[tokio::test]
async fn test_start_inside_radius_triggers() {
    let (controller, source, sink) = setup();
    source.set_current(Ok(inside()));
    controller.seed_initial_position().await.unwrap();

    controller.set_destination(destination());
    controller.start_tracking().unwrap();

    assert_eq!(controller.snapshot().alarm_state, AlarmState::Triggered);
    assert_eq!(sink.starts(), 1);
}

/// A clicked destination gains its address asynchronously.
#[tokio::test]
async fn test_click_destination_resolves_address() {
    let source = Arc::new(ManualPositionSource::new());
    let geocoder = StaticGeocoder::new().with_place(coord(0.0, 0.0), "Null Island");
    let controller = SessionController::builder()
        .with_position_source(source)
        .with_geocoder(Arc::new(geocoder))
        .build()
        .unwrap();

    let task = controller.set_destination_from_click(coord(0.0, 0.0));

    // Usable before the address arrives
    assert!(controller.snapshot().destination.is_some());

    assert!(task.await.unwrap());
    let destination = controller.snapshot().destination.unwrap();
    assert_eq!(destination.address.as_deref(), Some("Null Island"));
    assert_eq!(controller.snapshot().alarm_state, AlarmState::Idle);
}

/// A late address for a replaced destination is dropped.
#[tokio::test]
async fn test_late_address_for_replaced_destination_dropped() {
    let source = Arc::new(ManualPositionSource::new());
    let geocoder = Arc::new(GatedGeocoder {
        gate: Semaphore::new(0),
        address: "Old Place".to_string(),
    });
    let controller = SessionController::builder()
        .with_position_source(source)
        .with_geocoder(geocoder.clone())
        .build()
        .unwrap();

    let task = controller.set_destination_from_click(coord(0.0, 0.0));
    controller.set_destination(Location::new(coord(5.0, 5.0)));

    geocoder.gate.add_permits(1);
    assert!(!task.await.unwrap());

    let destination = controller.snapshot().destination.unwrap();
    assert_eq!(destination.coordinate, coord(5.0, 5.0));
    assert!(destination.address.is_none());
}

/// Replay a recorded approach through the simulated source.
#[tokio::test]
async fn test_simulated_track_triggers_alarm() {
    let track = vec![
        coord(0.0, 0.03),
        coord(0.0, 0.02),
        coord(0.0, 0.01),
        coord(0.0, 0.005),
        coord(0.0, 0.0),
    ];
    let source = Arc::new(SimulatedPositionSource::new(track, Duration::from_millis(5)));
    let sink = Arc::new(RecordingSink::default());
    let controller = SessionController::builder()
        .with_position_source(source)
        .with_alarm_sink(sink.clone())
        .build()
        .unwrap();
    let mut rx = controller.subscribe();

    controller.seed_initial_position().await.unwrap();
    controller.set_destination(destination());
    controller.start_tracking().unwrap();

    let snapshot = wait_until(&mut rx, |s| s.alarm_state == AlarmState::Triggered).await;
    assert!(snapshot.distance_km.unwrap() <= 1.0);
    assert_eq!(sink.starts(), 1);

    wait_for_position(&mut rx, coord(0.0, 0.0)).await;
    assert_eq!(sink.starts(), 1);
}
