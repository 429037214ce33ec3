//! Configuration management for the desk signal-conditioning layer
//!
//! Runtime configuration is loaded from a JSON file so thresholds, smoothing
//! and debounce timings can be tuned per desk without recompiling. Values are
//! taken as-is here; every component clamps out-of-range settings when it is
//! built from this configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::conditioning::classifier::Polarity;
use crate::conditioning::presence::ToggleMode;
use crate::hal::ADC_MAX;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub light: LightConfig,
    #[serde(default)]
    pub distance: DistanceConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
    #[serde(default)]
    pub sound: SoundConfig,
}

/// Light classifier and auto-calibration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Smoothing factor; lower is smoother and slower to react
    pub alpha: f32,
    /// Trip point in raw ADC counts (meaning depends on `polarity`)
    pub low_trip: i32,
    /// Trip point in raw ADC counts (meaning depends on `polarity`)
    pub high_trip: i32,
    /// Dead-zone width in raw ADC counts
    pub hysteresis: i32,
    /// Which trip point marks `Above`
    pub polarity: Polarity,
    /// Full-scale raw value of the sensor
    pub adc_max: u16,
    /// Length of the auto-calibration sweep
    pub calibration_window_ms: u64,
    /// Delay between reads during the sweep
    pub calibration_interval_ms: u64,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            alpha: 0.20,
            // Indoor desk defaults for a 10k divider
            low_trip: 650,
            high_trip: 350,
            hysteresis: 20,
            polarity: Polarity::Inverted,
            adc_max: ADC_MAX,
            calibration_window_ms: 3000,
            calibration_interval_ms: 10,
        }
    }
}

impl LightConfig {
    pub fn calibration_window(&self) -> Duration {
        Duration::from_millis(self.calibration_window_ms)
    }

    pub fn calibration_interval(&self) -> Duration {
        Duration::from_millis(self.calibration_interval_ms)
    }
}

/// Median distance sampler parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    /// Attempts per measurement, clamped into [1, 15]
    pub samples: u8,
    /// Pause between attempts
    pub inter_sample_delay_ms: u64,
    /// Maximum wait for each echo
    pub per_sample_timeout_us: u64,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            samples: 5,
            inter_sample_delay_ms: 50,
            per_sample_timeout_us: 30_000,
        }
    }
}

impl DistanceConfig {
    pub fn inter_sample_delay(&self) -> Duration {
        Duration::from_millis(self.inter_sample_delay_ms)
    }

    pub fn per_sample_timeout(&self) -> Duration {
        Duration::from_micros(self.per_sample_timeout_us)
    }
}

/// Presence toggle parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Absence required before the tag counts as removed
    pub removal_timeout_ms: u64,
    /// UID bytes of the authorized tag
    pub authorized_uid: Vec<u8>,
    /// Momentary or latched toggle behaviour
    pub mode: ToggleMode,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            removal_timeout_ms: 1000,
            authorized_uid: vec![0xDE, 0xAD, 0xBE, 0xEF],
            mode: ToggleMode::MomentaryOn,
        }
    }
}

impl PresenceConfig {
    pub fn removal_timeout(&self) -> Duration {
        Duration::from_millis(self.removal_timeout_ms)
    }
}

/// Sound level reader parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    /// Reads averaged per level sample
    pub average_count: u16,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self { average_count: 10 }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// not valid JSON. A controller with no operator present keeps running.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.light.alpha, 0.20);
        assert_eq!(config.light.low_trip, 650);
        assert_eq!(config.light.high_trip, 350);
        assert_eq!(config.light.polarity, Polarity::Inverted);
        assert_eq!(config.distance.samples, 5);
        assert_eq!(config.presence.removal_timeout(), Duration::from_millis(1000));
        assert_eq!(config.sound.average_count, 10);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.light.hysteresis, config.light.hysteresis);
        assert_eq!(parsed.presence.authorized_uid, config.presence.authorized_uid);
        assert_eq!(parsed.presence.mode, config.presence.mode);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "light": { "alpha": 0.5 }, "presence": { "mode": "latched_toggle" } }"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.light.alpha, 0.5);
        assert_eq!(parsed.light.low_trip, 650);
        assert_eq!(parsed.presence.mode, ToggleMode::LatchedToggle);
        assert_eq!(parsed.distance.per_sample_timeout_us, 30_000);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/desk_signals.json");
        assert_eq!(config.light.hysteresis, 20);
    }
}
