//! Alarm sound output.
//!
//! The session never plays audio itself. It asks an [`AlarmSound`] to start
//! or stop, and the sound forwards the request to an [`AlarmSink`] that owns
//! the actual device. Requests are one-way: the sink reports nothing back.
//!
//! [`AlarmSound`] makes both operations idempotent, so sinks only ever see
//! alternating `start`/`stop` calls.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use geoalarm::sound::{AlarmSound, SilentSink};
//!
//! let sound = AlarmSound::new(Arc::new(SilentSink));
//! sound.start();
//! sound.start(); // no-op
//! assert!(sound.is_playing());
//! sound.stop();
//! assert!(!sound.is_playing());
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

/// Default alarm sound file.
pub const DEFAULT_SOUND_PATH: &str = "loud.mp3";

/// Default playback volume (0.0 - 1.0).
pub const DEFAULT_VOLUME: f32 = 0.8;

/// Something that can play and silence the alarm.
///
/// Implementations should not block; playback failures are theirs to log.
pub trait AlarmSink: Send + Sync {
    /// Begin playing the alarm.
    fn start(&self);

    /// Stop playing the alarm.
    fn stop(&self);
}

/// Playback settings handed to sinks that play a real sound file.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundConfig {
    /// Sound file to play.
    pub path: PathBuf,
    /// Playback volume, clamped to 0.0 - 1.0.
    pub volume: f32,
    /// Repeat until stopped.
    pub looped: bool,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SOUND_PATH),
            volume: DEFAULT_VOLUME,
            looped: true,
        }
    }
}

impl SoundConfig {
    /// Set the sound file.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the volume. Values outside 0.0 - 1.0 are clamped.
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = if volume.is_nan() {
            DEFAULT_VOLUME
        } else {
            volume.clamp(0.0, 1.0)
        };
        self
    }

    /// Enable or disable looping.
    pub fn with_looped(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }
}

/// Idempotent front for an [`AlarmSink`].
pub struct AlarmSound {
    sink: Arc<dyn AlarmSink>,
    playing: AtomicBool,
}

impl std::fmt::Debug for AlarmSound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlarmSound")
            .field("playing", &self.is_playing())
            .finish_non_exhaustive()
    }
}

impl AlarmSound {
    /// Wrap a sink. The sound starts silent.
    pub fn new(sink: Arc<dyn AlarmSink>) -> Self {
        Self {
            sink,
            playing: AtomicBool::new(false),
        }
    }

    /// Start the alarm. No-op if already playing.
    pub fn start(&self) {
        if !self.playing.swap(true, Ordering::AcqRel) {
            warn!("Alarm sounding");
            self.sink.start();
        }
    }

    /// Stop the alarm. No-op if already silent.
    pub fn stop(&self) {
        if self.playing.swap(false, Ordering::AcqRel) {
            debug!("Alarm silenced");
            self.sink.stop();
        }
    }

    /// Whether the alarm is currently playing.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }
}

/// A sink that plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl AlarmSink for SilentSink {
    fn start(&self) {}

    fn stop(&self) {}
}
