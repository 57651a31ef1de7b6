//! Position source driven by explicit calls.
//!
//! Useful wherever fixes come from somewhere other than a device: tests,
//! scripted demos, or a UI that forwards positions it already has.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{PositionError, PositionFix, PositionSource, WatchHandle, WatchOptions};

#[derive(Debug)]
struct Watcher {
    token: CancellationToken,
    fixes: mpsc::UnboundedSender<PositionFix>,
}

impl Watcher {
    fn is_open(&self) -> bool {
        !self.token.is_cancelled() && !self.fixes.is_closed()
    }
}

#[derive(Debug)]
struct ManualInner {
    current: PositionFix,
    watch_error: Option<PositionError>,
    watchers: Vec<Watcher>,
    watches_opened: usize,
}

/// A [`PositionSource`] whose fixes are pushed by the caller.
#[derive(Debug)]
pub struct ManualPositionSource {
    inner: Mutex<ManualInner>,
}

impl Default for ManualPositionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualPositionSource {
    /// Create a source with no current position.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ManualInner {
                current: Err(PositionError::Unavailable("no position yet".to_string())),
                watch_error: None,
                watchers: Vec::new(),
                watches_opened: 0,
            }),
        }
    }

    /// Set the result returned by the next one-shot request.
    pub fn set_current(&self, fix: PositionFix) {
        self.inner.lock().current = fix;
    }

    /// Make subsequent `watch` calls fail with `error` (or succeed with `None`).
    pub fn fail_watches(&self, error: Option<PositionError>) {
        self.inner.lock().watch_error = error;
    }

    /// Deliver a fix to every open watch.
    ///
    /// Returns how many watches received it.
    pub fn push(&self, fix: PositionFix) -> usize {
        let mut inner = self.inner.lock();
        if let Ok(coordinate) = &fix {
            inner.current = Ok(*coordinate);
        }

        inner.watchers.retain(Watcher::is_open);
        let mut delivered = 0;
        for watcher in &inner.watchers {
            if watcher.fixes.send(fix.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of watches that are still open.
    pub fn active_watches(&self) -> usize {
        self.inner
            .lock()
            .watchers
            .iter()
            .filter(|w| w.is_open())
            .count()
    }

    /// Total number of watches ever opened.
    pub fn watches_opened(&self) -> usize {
        self.inner.lock().watches_opened
    }
}

impl PositionSource for ManualPositionSource {
    fn current_position(&self, _options: &WatchOptions) -> BoxFuture<'_, PositionFix> {
        let fix = self.inner.lock().current.clone();
        Box::pin(async move { fix })
    }

    fn watch(
        &self,
        options: &WatchOptions,
        fixes: mpsc::UnboundedSender<PositionFix>,
    ) -> Result<WatchHandle, PositionError> {
        let mut inner = self.inner.lock();
        if let Some(error) = inner.watch_error.clone() {
            return Err(error);
        }

        let token = CancellationToken::new();
        inner.watchers.push(Watcher {
            token: token.clone(),
            fixes,
        });
        inner.watches_opened += 1;

        debug!(
            high_accuracy = options.high_accuracy,
            watches_opened = inner.watches_opened,
            "Manual position watch opened"
        );

        Ok(WatchHandle::new(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;

    #[tokio::test]
    async fn test_current_position_defaults_to_unavailable() {
        let source = ManualPositionSource::new();
        let fix = source.current_position(&WatchOptions::default()).await;
        assert!(matches!(fix, Err(PositionError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_push_updates_current_position() {
        let source = ManualPositionSource::new();
        let c = Coordinate::new(1.0, 2.0).unwrap();
        source.push(Ok(c));
        assert_eq!(source.current_position(&WatchOptions::default()).await, Ok(c));
    }

    #[tokio::test]
    async fn test_push_reaches_open_watch_only() {
        let source = ManualPositionSource::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = source.watch(&WatchOptions::default(), tx).unwrap();
        assert_eq!(source.active_watches(), 1);

        let c = Coordinate::new(1.0, 2.0).unwrap();
        assert_eq!(source.push(Ok(c)), 1);
        assert_eq!(rx.recv().await, Some(Ok(c)));

        handle.cancel();
        assert_eq!(source.active_watches(), 0);
        assert_eq!(source.push(Ok(c)), 0);
        assert_eq!(source.watches_opened(), 1);
    }

    #[test]
    fn test_failed_watch() {
        let source = ManualPositionSource::new();
        source.fail_watches(Some(PositionError::PermissionDenied));
        let (tx, _rx) = mpsc::unbounded_channel();
        assert_eq!(
            source.watch(&WatchOptions::default(), tx).unwrap_err(),
            PositionError::PermissionDenied
        );
        assert_eq!(source.watches_opened(), 0);
    }
}
