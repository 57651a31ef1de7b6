//! Addressable configuration keys.
//!
//! Every setting in `config.ini` has a [`ConfigKey`] that knows its
//! `section.key` name and how to read, validate and write it. The INI loader
//! and the `config get/set/list` commands both go through these keys, so a
//! value accepted from the command line is exactly a value accepted from
//! the file.

use std::path::PathBuf;
use std::str::FromStr;

use crate::alarm::clamp_radius;
use crate::coord::{MAX_LAT, MAX_LNG, MIN_LAT, MIN_LNG};

use super::{ConfigError, ConfigFile};

/// A single configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    AlarmRadiusKm,
    AlarmSoundPath,
    AlarmVolume,
    AlarmLoop,
    PositionHighAccuracy,
    PositionTimeoutSecs,
    PositionMaximumAgeMs,
    MapDefaultLat,
    MapDefaultLng,
}

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::AlarmRadiusKm,
            ConfigKey::AlarmSoundPath,
            ConfigKey::AlarmVolume,
            ConfigKey::AlarmLoop,
            ConfigKey::PositionHighAccuracy,
            ConfigKey::PositionTimeoutSecs,
            ConfigKey::PositionMaximumAgeMs,
            ConfigKey::MapDefaultLat,
            ConfigKey::MapDefaultLng,
        ]
    }

    /// INI section name.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::AlarmRadiusKm
            | ConfigKey::AlarmSoundPath
            | ConfigKey::AlarmVolume
            | ConfigKey::AlarmLoop => "alarm",
            ConfigKey::PositionHighAccuracy
            | ConfigKey::PositionTimeoutSecs
            | ConfigKey::PositionMaximumAgeMs => "position",
            ConfigKey::MapDefaultLat | ConfigKey::MapDefaultLng => "map",
        }
    }

    /// Key name within its section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::AlarmRadiusKm => "radius_km",
            ConfigKey::AlarmSoundPath => "sound_path",
            ConfigKey::AlarmVolume => "volume",
            ConfigKey::AlarmLoop => "loop",
            ConfigKey::PositionHighAccuracy => "high_accuracy",
            ConfigKey::PositionTimeoutSecs => "timeout_secs",
            ConfigKey::PositionMaximumAgeMs => "maximum_age_ms",
            ConfigKey::MapDefaultLat => "default_lat",
            ConfigKey::MapDefaultLng => "default_lng",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value rendered as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::AlarmRadiusKm => config.alarm.radius_km.to_string(),
            ConfigKey::AlarmSoundPath => config.alarm.sound_path.display().to_string(),
            ConfigKey::AlarmVolume => config.alarm.volume.to_string(),
            ConfigKey::AlarmLoop => config.alarm.looped.to_string(),
            ConfigKey::PositionHighAccuracy => config.position.high_accuracy.to_string(),
            ConfigKey::PositionTimeoutSecs => config.position.timeout_secs.to_string(),
            ConfigKey::PositionMaximumAgeMs => config.position.maximum_age_ms.to_string(),
            ConfigKey::MapDefaultLat => config.map.default_lat.to_string(),
            ConfigKey::MapDefaultLng => config.map.default_lng.to_string(),
        }
    }

    /// Validate `value` and store it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::AlarmRadiusKm => {
                let km: f64 = self.parse(value)?;
                if !km.is_finite() {
                    return Err(self.invalid(value, "must be a finite number"));
                }
                config.alarm.radius_km = clamp_radius(km).km();
            }
            ConfigKey::AlarmSoundPath => {
                if value.is_empty() {
                    return Err(self.invalid(value, "must not be empty"));
                }
                config.alarm.sound_path = PathBuf::from(value);
            }
            ConfigKey::AlarmVolume => {
                let volume: f32 = self.parse(value)?;
                if !(0.0..=1.0).contains(&volume) {
                    return Err(self.invalid(value, "must be between 0.0 and 1.0"));
                }
                config.alarm.volume = volume;
            }
            ConfigKey::AlarmLoop => config.alarm.looped = self.parse_bool(value)?,
            ConfigKey::PositionHighAccuracy => {
                config.position.high_accuracy = self.parse_bool(value)?
            }
            ConfigKey::PositionTimeoutSecs => {
                let secs: u64 = self.parse(value)?;
                if secs == 0 {
                    return Err(self.invalid(value, "must be at least 1"));
                }
                config.position.timeout_secs = secs;
            }
            ConfigKey::PositionMaximumAgeMs => {
                config.position.maximum_age_ms = self.parse(value)?;
            }
            ConfigKey::MapDefaultLat => {
                let lat: f64 = self.parse(value)?;
                if !(MIN_LAT..=MAX_LAT).contains(&lat) {
                    return Err(self.invalid(value, "must be between -90 and 90"));
                }
                config.map.default_lat = lat;
            }
            ConfigKey::MapDefaultLng => {
                let lng: f64 = self.parse(value)?;
                if !(MIN_LNG..=MAX_LNG).contains(&lng) {
                    return Err(self.invalid(value, "must be between -180 and 180"));
                }
                config.map.default_lng = lng;
            }
        }
        Ok(())
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigError> {
        value
            .parse()
            .map_err(|_| self.invalid(value, "not a valid number"))
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (section, key) = s
            .split_once('.')
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))?;
        ConfigKey::all()
            .iter()
            .copied()
            .find(|k| k.section() == section && k.key_name() == key)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        let key: ConfigKey = "alarm.radius_km".parse().unwrap();
        assert_eq!(key, ConfigKey::AlarmRadiusKm);
        assert_eq!(key.name(), "alarm.radius_km");

        assert!(matches!(
            "alarm.nope".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            "radius_km".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_all_keys_round_trip_names() {
        for key in ConfigKey::all() {
            let parsed: ConfigKey = key.name().parse().unwrap();
            assert_eq!(parsed, *key);
        }
    }

    #[test]
    fn test_set_radius_is_clamped() {
        let mut config = ConfigFile::default();
        ConfigKey::AlarmRadiusKm.set(&mut config, "25").unwrap();
        assert_eq!(config.alarm.radius_km, 10.0);
        ConfigKey::AlarmRadiusKm.set(&mut config, "0.44").unwrap();
        assert_eq!(config.alarm.radius_km, 0.44);
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::AlarmRadiusKm.set(&mut config, "far").is_err());
        assert!(ConfigKey::AlarmRadiusKm.set(&mut config, "NaN").is_err());
        assert!(ConfigKey::AlarmVolume.set(&mut config, "1.5").is_err());
        assert!(ConfigKey::AlarmLoop.set(&mut config, "maybe").is_err());
        assert!(ConfigKey::PositionTimeoutSecs.set(&mut config, "0").is_err());
        assert!(ConfigKey::MapDefaultLat.set(&mut config, "91").is_err());
        assert!(ConfigKey::MapDefaultLng.set(&mut config, "-181").is_err());
        assert!(ConfigKey::AlarmSoundPath.set(&mut config, "  ").is_err());

        // Nothing changed
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ConfigFile::default();
        ConfigKey::AlarmLoop.set(&mut config, "no").unwrap();
        ConfigKey::PositionMaximumAgeMs.set(&mut config, "0").unwrap();
        ConfigKey::AlarmSoundPath.set(&mut config, "/tmp/bell.wav").unwrap();

        assert_eq!(ConfigKey::AlarmLoop.get(&config), "false");
        assert_eq!(ConfigKey::PositionMaximumAgeMs.get(&config), "0");
        assert_eq!(ConfigKey::AlarmSoundPath.get(&config), "/tmp/bell.wav");
    }

    #[test]
    fn test_invalid_value_message() {
        let mut config = ConfigFile::default();
        let err = ConfigKey::AlarmVolume.set(&mut config, "2").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value '2' for alarm.volume: must be between 0.0 and 1.0"
        );
    }
}
