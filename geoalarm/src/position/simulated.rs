//! Position source that replays a recorded track.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::coord::Coordinate;

use super::{PositionError, PositionFix, PositionSource, WatchHandle, WatchOptions};

/// Default delay between replayed fixes.
pub const DEFAULT_REPLAY_INTERVAL: Duration = Duration::from_secs(1);

/// Replays a fixed list of positions at a steady interval.
///
/// Each call to [`watch`](PositionSource::watch) replays the track from the
/// start on its own task. The watch closes its channel after the last fix.
/// The one-shot position is the first track point unless overridden.
#[derive(Debug, Clone)]
pub struct SimulatedPositionSource {
    track: Arc<Vec<Coordinate>>,
    interval: Duration,
    initial: Option<PositionFix>,
}

impl SimulatedPositionSource {
    /// Create a source replaying `track` with `interval` between fixes.
    pub fn new(track: Vec<Coordinate>, interval: Duration) -> Self {
        Self {
            track: Arc::new(track),
            interval,
            initial: None,
        }
    }

    /// Override the one-shot result.
    pub fn with_initial(mut self, initial: PositionFix) -> Self {
        self.initial = Some(initial);
        self
    }

    /// Number of fixes in the track.
    pub fn len(&self) -> usize {
        self.track.len()
    }

    /// Whether the track is empty.
    pub fn is_empty(&self) -> bool {
        self.track.is_empty()
    }

    /// Time needed to replay the full track.
    pub fn duration(&self) -> Duration {
        self.interval * self.track.len() as u32
    }
}

impl PositionSource for SimulatedPositionSource {
    fn current_position(&self, _options: &WatchOptions) -> BoxFuture<'_, PositionFix> {
        let fix = match &self.initial {
            Some(fix) => fix.clone(),
            None => self
                .track
                .first()
                .copied()
                .ok_or_else(|| PositionError::Unavailable("empty track".to_string())),
        };
        Box::pin(async move { fix })
    }

    fn watch(
        &self,
        options: &WatchOptions,
        fixes: mpsc::UnboundedSender<PositionFix>,
    ) -> Result<WatchHandle, PositionError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PositionError::Unavailable(format!("no async runtime: {}", e)))?;

        let token = CancellationToken::new();
        let cancel = token.clone();
        let track = Arc::clone(&self.track);
        let interval = self.interval;

        info!(
            fixes = track.len(),
            interval_ms = interval.as_millis() as u64,
            high_accuracy = options.high_accuracy,
            "Replaying simulated track"
        );

        runtime.spawn(async move {
            for (index, coordinate) in track.iter().enumerate() {
                if index > 0 {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
                if cancel.is_cancelled() || fixes.send(Ok(*coordinate)).is_err() {
                    break;
                }
            }
            debug!("Simulated track finished");
        });

        Ok(WatchHandle::new(token))
    }
}
