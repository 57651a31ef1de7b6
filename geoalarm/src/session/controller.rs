//! Session controller.
//!
//! Bridges the [`TrackingSession`] state machine to the outside world:
//! executes the effects it requests, owns the position watch, and publishes
//! a [`SessionSnapshot`] after every accepted event.
//!
//! # Architecture
//!
//! ```text
//!  UI calls ─────────────┐
//!                        ▼
//!                ┌───────────────┐  effects   ┌────────────┐
//!                │ Mutex<State>  │──────────► │ AlarmSound │
//!  watch task ──►│  session      │            └────────────┘
//!  (per watch)   │  watch handle │──────────► PositionSource::watch / cancel
//!                │  generation   │
//!                └───────┬───────┘
//!                        ▼
//!              watch::Sender<SessionSnapshot>
//! ```
//!
//! # Single writer
//!
//! All transitions happen under one mutex. Each open watch carries the
//! generation number that was current when it opened; closing a watch bumps
//! the generation under the same lock. A fix that is already in flight when
//! tracking stops is therefore discarded, and nothing mutates the session
//! after `stop_tracking` returns.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::alarm::{AlarmRadius, Effect, SessionError, TrackingSession};
use crate::config::ConfigFile;
use crate::coord::{Coordinate, Location};
use crate::geocode::{NoGeocoder, ReverseGeocoder};
use crate::position::{PositionError, PositionFix, PositionSource, WatchHandle, WatchOptions};
use crate::sound::{AlarmSink, AlarmSound, SilentSink};

use super::error::ControllerError;
use super::snapshot::SessionSnapshot;

#[derive(Debug)]
struct ControllerState {
    session: TrackingSession,
    watch: Option<WatchHandle>,
    generation: u64,
    last_position_error: Option<PositionError>,
}

impl ControllerState {
    fn close_watch(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.watch.take() {
            handle.cancel();
            debug!(generation = self.generation, "Position watch closed");
        }
    }
}

/// State shared between the controller and its watch tasks.
struct Shared {
    state: Mutex<ControllerState>,
    sound: AlarmSound,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl Shared {
    fn publish(&self, state: &ControllerState) {
        self.snapshot_tx.send_replace(SessionSnapshot::from_session(
            &state.session,
            state.last_position_error.clone(),
        ));
    }

    /// Execute effects that need no position source.
    fn run_effects(&self, state: &mut ControllerState, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::StartSound => self.sound.start(),
                Effect::StopSound => self.sound.stop(),
                Effect::StopWatch => state.close_watch(),
                Effect::StartWatch => {}
            }
        }
    }

    fn apply_position(&self, state: &mut ControllerState, coordinate: Coordinate) {
        state.last_position_error = None;
        let effects = state.session.position_update(coordinate);
        self.run_effects(state, &effects);
    }

    /// Apply a fix from the watch opened at `generation`.
    ///
    /// Returns false once that watch is stale, telling the task to exit.
    fn apply_fix(&self, generation: u64, fix: PositionFix) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.generation != generation {
            return false;
        }

        match fix {
            Ok(coordinate) => self.apply_position(state, coordinate),
            Err(e) => {
                // A single failed fix does not end tracking; watches recover
                warn!(error = %e, "Position fix failed");
                state.last_position_error = Some(e);
            }
        }
        self.publish(state);
        true
    }

    fn apply_initial(&self, fix: &PositionFix) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match fix {
            Ok(coordinate) => {
                info!(position = %coordinate, "Initial position acquired");
                self.apply_position(state, *coordinate);
            }
            Err(e) => {
                warn!(error = %e, "Could not get initial position");
                state.last_position_error = Some(e.clone());
            }
        }
        self.publish(state);
    }

    fn apply_address(&self, coordinate: Coordinate, address: String) -> bool {
        let mut guard = self.state.lock();
        let applied = guard.session.set_destination_address(coordinate, address);
        if applied {
            self.publish(&guard);
        }
        applied
    }
}

/// Forward fixes from one watch into the session until it goes stale.
async fn run_watch(
    shared: Arc<Shared>,
    generation: u64,
    token: CancellationToken,
    mut fixes: mpsc::UnboundedReceiver<PositionFix>,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            fix = fixes.recv() => match fix {
                Some(fix) => {
                    if !shared.apply_fix(generation, fix) {
                        break;
                    }
                }
                None => {
                    debug!(generation, "Position source ended watch");
                    break;
                }
            }
        }
    }
}

/// Drives a [`TrackingSession`] against external collaborators.
///
/// All public operations are synchronous and never block on I/O; only the
/// position watch and reverse geocoding run on background tasks.
pub struct SessionController {
    shared: Arc<Shared>,
    source: Arc<dyn PositionSource>,
    geocoder: Arc<dyn ReverseGeocoder>,
    options: WatchOptions,
    runtime: Handle,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("options", &self.options)
            .field("state", &*self.shared.state.lock())
            .field("sound", &self.shared.sound)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Start building a controller.
    pub fn builder() -> SessionControllerBuilder {
        SessionControllerBuilder::default()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot_tx.borrow().clone()
    }

    /// Subscribe to snapshots published after each accepted event.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    /// Whether the alarm sound is playing.
    pub fn is_alarm_playing(&self) -> bool {
        self.shared.sound.is_playing()
    }

    /// Whether a position watch is open.
    pub fn is_watching(&self) -> bool {
        self.shared.state.lock().watch.is_some()
    }

    /// Select a destination (for example from place search).
    ///
    /// Cancels any alarm and closes the watch.
    pub fn set_destination(&self, location: Location) {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        let effects = state.session.set_destination(location);
        self.shared.run_effects(state, &effects);
        self.shared.publish(state);
    }

    /// Select a destination from a raw map click.
    ///
    /// The destination is set immediately; its address is resolved in the
    /// background and attached only if the destination has not changed in
    /// the meantime. The returned task yields whether an address was applied.
    pub fn set_destination_from_click(&self, coordinate: Coordinate) -> JoinHandle<bool> {
        self.set_destination(Location::new(coordinate));

        let geocoder = Arc::clone(&self.geocoder);
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            match geocoder.reverse_geocode(coordinate).await {
                Some(address) => shared.apply_address(coordinate, address),
                None => false,
            }
        })
    }

    /// Clear the destination and reset the session.
    pub fn clear_destination(&self) {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        let effects = state.session.clear_destination();
        self.shared.run_effects(state, &effects);
        self.shared.publish(state);
    }

    /// Change the geofence radius. Refused while tracking.
    pub fn set_radius(&self, requested_km: f64) -> Result<AlarmRadius, SessionError> {
        let mut guard = self.shared.state.lock();
        let radius = guard.session.set_radius(requested_km)?;
        self.shared.publish(&guard);
        Ok(radius)
    }

    /// Start tracking and open the position watch.
    ///
    /// If the watch cannot be opened the session is returned to `Idle` and
    /// the source's error is reported.
    pub fn start_tracking(&self) -> Result<(), ControllerError> {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        let effects = state.session.start_tracking()?;

        for effect in &effects {
            if *effect != Effect::StartWatch {
                self.shared.run_effects(state, std::slice::from_ref(effect));
                continue;
            }

            if let Err(e) = self.open_watch(state) {
                warn!(error = %e, "Could not open position watch");
                let undo = state.session.stop_tracking();
                self.shared.run_effects(state, &undo);
                state.last_position_error = Some(e.clone());
                self.shared.publish(state);
                return Err(e.into());
            }
        }

        self.shared.publish(state);
        Ok(())
    }

    /// Stop tracking, silence the alarm and close the watch.
    ///
    /// No fix delivered after this returns can change the session. Calling
    /// it while not tracking is a no-op.
    pub fn stop_tracking(&self) {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        let effects = state.session.stop_tracking();
        self.shared.run_effects(state, &effects);
        self.shared.publish(state);
    }

    /// Silence a triggered alarm.
    pub fn dismiss_alarm(&self) -> Result<(), SessionError> {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        let effects = state.session.dismiss_alarm()?;
        self.shared.run_effects(state, &effects);
        self.shared.publish(state);
        Ok(())
    }

    /// Feed a position directly, bypassing the watch.
    pub fn position_update(&self, coordinate: Coordinate) {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        self.shared.apply_position(state, coordinate);
        self.shared.publish(state);
    }

    /// Request a one-shot fix and record it as the user position.
    ///
    /// On failure the user position is left unchanged and the error is
    /// returned; there is no automatic retry.
    pub async fn seed_initial_position(&self) -> Result<Coordinate, PositionError> {
        let fix = self.source.current_position(&self.options).await;
        self.shared.apply_initial(&fix);
        fix
    }

    fn open_watch(&self, state: &mut ControllerState) -> Result<(), PositionError> {
        state.close_watch();
        let generation = state.generation;

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.source.watch(&self.options, tx)?;
        let token = handle.token();
        state.watch = Some(handle);

        self.runtime
            .spawn(run_watch(Arc::clone(&self.shared), generation, token, rx));

        info!(
            generation,
            high_accuracy = self.options.high_accuracy,
            timeout_ms = self.options.timeout.as_millis() as u64,
            "Position watch opened"
        );
        Ok(())
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.close_watch();
        self.shared.sound.stop();
    }
}

/// Builder for [`SessionController`].
#[derive(Default)]
pub struct SessionControllerBuilder {
    radius: AlarmRadius,
    options: WatchOptions,
    source: Option<Arc<dyn PositionSource>>,
    sink: Option<Arc<dyn AlarmSink>>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
    runtime: Option<Handle>,
}

impl SessionControllerBuilder {
    /// Apply radius and watch settings from a configuration file.
    pub fn with_config(mut self, config: &ConfigFile) -> Self {
        self.radius = config.radius();
        self.options = config.watch_options();
        self
    }

    /// Set the initial radius.
    pub fn with_radius(mut self, radius: AlarmRadius) -> Self {
        self.radius = radius;
        self
    }

    /// Set the position watch options.
    pub fn with_watch_options(mut self, options: WatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the position source (required).
    pub fn with_position_source(mut self, source: Arc<dyn PositionSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the alarm sink. Defaults to [`SilentSink`].
    pub fn with_alarm_sink(mut self, sink: Arc<dyn AlarmSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the reverse geocoder. Defaults to [`NoGeocoder`].
    pub fn with_geocoder(mut self, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Run background tasks on `runtime` instead of the current one.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the controller.
    ///
    /// Fails without a position source, or when no runtime was given and
    /// none is current.
    pub fn build(self) -> Result<SessionController, ControllerError> {
        let source = self.source.ok_or(ControllerError::MissingSource)?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|e| ControllerError::NoRuntime(e.to_string()))?,
        };

        let session = TrackingSession::new(self.radius);
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::from_session(&session, None));

        let shared = Arc::new(Shared {
            state: Mutex::new(ControllerState {
                session,
                watch: None,
                generation: 0,
                last_position_error: None,
            }),
            sound: AlarmSound::new(self.sink.unwrap_or_else(|| Arc::new(SilentSink))),
            snapshot_tx,
        });

        Ok(SessionController {
            shared,
            source,
            geocoder: self.geocoder.unwrap_or_else(|| Arc::new(NoGeocoder)),
            options: self.options,
            runtime,
        })
    }
}
