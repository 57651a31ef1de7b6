//! Configuration file handling.
//!
//! Settings live in an INI file at `<config dir>/geoalarm/config.ini`:
//!
//! ```ini
//! [alarm]
//! radius_km = 1
//! sound_path = loud.mp3
//! volume = 0.8
//! loop = true
//!
//! [position]
//! high_accuracy = true
//! timeout_secs = 10
//! maximum_age_ms = 1000
//!
//! [map]
//! default_lat = 40.7128
//! default_lng = -74.006
//! ```
//!
//! Missing files and missing keys fall back to defaults. Values are
//! validated through [`ConfigKey::set`].

mod keys;

pub use keys::ConfigKey;

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::alarm::{clamp_radius, AlarmRadius, DEFAULT_RADIUS_KM};
use crate::coord::Coordinate;
use crate::position::WatchOptions;
use crate::sound::{SoundConfig, DEFAULT_SOUND_PATH, DEFAULT_VOLUME};

/// Application directory name under the platform config directory.
pub const APP_DIR_NAME: &str = "geoalarm";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading or writing the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid INI.
    #[error("Failed to parse config file: {0}")]
    Parse(String),

    /// A value failed validation.
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// No such `section.key`.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

impl From<ini::Error> for ConfigError {
    fn from(e: ini::Error) -> Self {
        match e {
            ini::Error::Io(e) => ConfigError::Io(e),
            ini::Error::Parse(e) => ConfigError::Parse(e.to_string()),
        }
    }
}

/// `[alarm]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmSettings {
    pub radius_km: f64,
    pub sound_path: PathBuf,
    pub volume: f32,
    pub looped: bool,
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            sound_path: PathBuf::from(DEFAULT_SOUND_PATH),
            volume: DEFAULT_VOLUME,
            looped: true,
        }
    }
}

/// `[position]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSettings {
    pub high_accuracy: bool,
    pub timeout_secs: u64,
    pub maximum_age_ms: u64,
}

impl Default for PositionSettings {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_secs: 10,
            maximum_age_ms: 1000,
        }
    }
}

/// `[map]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub default_lat: f64,
    pub default_lng: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        // New York City
        Self {
            default_lat: 40.7128,
            default_lng: -74.006,
        }
    }
}

/// The full configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub alarm: AlarmSettings,
    pub position: PositionSettings,
    pub map: MapSettings,
}

/// Path of the user's configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

impl ConfigFile {
    /// Load from the default location, or defaults if the file is missing.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, or defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        let mut config = Self::default();

        for (section, properties) in ini.iter() {
            let Some(section) = section else { continue };
            for (key, value) in properties.iter() {
                match format!("{}.{}", section, key).parse::<ConfigKey>() {
                    Ok(config_key) => config_key.set(&mut config, value)?,
                    Err(_) => debug!(section, key, "Ignoring unknown config key"),
                }
            }
        }

        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Save to the default location, creating its directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini.write_to_file(path)?;

        debug!(path = %path.display(), "Saved config file");
        Ok(())
    }

    /// Configured alarm radius.
    pub fn radius(&self) -> AlarmRadius {
        clamp_radius(self.alarm.radius_km)
    }

    /// Configured position watch options.
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions::default()
            .with_high_accuracy(self.position.high_accuracy)
            .with_timeout(Duration::from_secs(self.position.timeout_secs))
            .with_maximum_age(Duration::from_millis(self.position.maximum_age_ms))
    }

    /// Configured alarm playback.
    pub fn sound_config(&self) -> SoundConfig {
        SoundConfig::default()
            .with_path(self.alarm.sound_path.clone())
            .with_volume(self.alarm.volume)
            .with_looped(self.alarm.looped)
    }

    /// Map center used before the user position is known.
    ///
    /// Falls back to the built-in default if the stored values are out of
    /// range.
    pub fn default_center(&self) -> Coordinate {
        Coordinate::new(self.map.default_lat, self.map.default_lng).unwrap_or(Coordinate {
            lat: MapSettings::default().default_lat,
            lng: MapSettings::default().default_lng,
        })
    }
}
