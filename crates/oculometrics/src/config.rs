//! Engine configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected configuration values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a positive finite number, got {value}")]
    InvalidThreshold { field: &'static str, value: f32 },

    #[error("ear_threshold ({close}) must be below ear_open_threshold ({open})")]
    ThresholdOrder { close: f32, open: f32 },

    #[error("min_blink_frames must be at least 1")]
    MinBlinkFrames,

    #[error("window_size must be at least 1")]
    WindowSize,

    #[error("ui_update_interval_ms must be at least 1")]
    UpdateInterval,

    #[error("blink_rate_window_ms must be at least 1")]
    RateWindow,

    #[error("max_blink_duration_ms must be at least 1 when set")]
    BlinkTimeout,

    #[error("normal blink-rate band is inverted: [{low}, {high}]")]
    RateBand { low: u32, high: u32 },
}

/// Oculometric engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// EAR below which a frame counts as closed
    pub ear_threshold: f32,

    /// EAR at or above which a blink is complete
    pub ear_open_threshold: f32,

    /// Consecutive closed frames before a closure counts as a blink
    pub min_blink_frames: u32,

    /// Closure window capacity in frames (PERCLOS)
    pub window_size: usize,

    /// Snapshot publication period (milliseconds)
    pub ui_update_interval_ms: u64,

    /// Abandon a blink stuck between thresholds after this long (None = never)
    pub max_blink_duration_ms: Option<u64>,

    /// Blink-rate lookback (milliseconds)
    pub blink_rate_window_ms: u64,

    /// Normal blink rate band (blinks per minute, inclusive)
    pub normal_blink_rate: (u32, u32),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.25,
            ear_open_threshold: 0.30,
            min_blink_frames: 3,
            window_size: 1800,
            ui_update_interval_ms: 1000,
            max_blink_duration_ms: None,
            blink_rate_window_ms: 60_000,
            normal_blink_rate: (10, 30),
        }
    }
}

impl EngineConfig {
    /// Catch shallower, shorter closures
    pub fn sensitive() -> Self {
        Self {
            ear_threshold: 0.27,
            ear_open_threshold: 0.31,
            min_blink_frames: 2,
            ..Default::default()
        }
    }

    /// Ignore all but deep, sustained closures
    pub fn relaxed() -> Self {
        Self {
            ear_threshold: 0.21,
            ear_open_threshold: 0.28,
            min_blink_frames: 4,
            ..Default::default()
        }
    }

    /// Reject values that would leave the state machine stuck or meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("ear_threshold", self.ear_threshold),
            ("ear_open_threshold", self.ear_open_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidThreshold { field, value });
            }
        }
        if self.ear_threshold >= self.ear_open_threshold {
            return Err(ConfigError::ThresholdOrder {
                close: self.ear_threshold,
                open: self.ear_open_threshold,
            });
        }
        if self.min_blink_frames == 0 {
            return Err(ConfigError::MinBlinkFrames);
        }
        if self.window_size == 0 {
            return Err(ConfigError::WindowSize);
        }
        if self.ui_update_interval_ms == 0 {
            return Err(ConfigError::UpdateInterval);
        }
        if self.blink_rate_window_ms == 0 {
            return Err(ConfigError::RateWindow);
        }
        if self.max_blink_duration_ms == Some(0) {
            return Err(ConfigError::BlinkTimeout);
        }
        let (low, high) = self.normal_blink_rate;
        if low > high {
            return Err(ConfigError::RateBand { low, high });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::sensitive().validate().is_ok());
        assert!(EngineConfig::relaxed().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_blink_frames() {
        let config = EngineConfig {
            min_blink_frames: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MinBlinkFrames));
    }

    #[test]
    fn test_rejects_zero_window() {
        let config = EngineConfig {
            window_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::WindowSize));
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let config = EngineConfig {
            ear_threshold: 0.30,
            ear_open_threshold: 0.25,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ThresholdOrder { .. })));
    }

    #[test]
    fn test_rejects_nan_threshold() {
        let config = EngineConfig {
            ear_threshold: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold { field: "ear_threshold", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_interval_and_timeout() {
        let config = EngineConfig {
            ui_update_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::UpdateInterval));

        let config = EngineConfig {
            max_blink_duration_ms: Some(0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::BlinkTimeout));
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"window_size": 900}"#).unwrap();
        assert_eq!(config.window_size, 900);
        assert_eq!(config.min_blink_frames, 3);
        assert_eq!(config.ear_open_threshold, 0.30);
    }
}
