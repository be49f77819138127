//! Published metrics

use serde::{Deserialize, Serialize};

use crate::state::{EyeState, FatigueLevel};

/// Immutable metrics record published once per UI tick
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Blink state machine state
    pub eye_state: EyeState,

    /// Blinks completed since tracking started
    pub blink_count: u64,

    /// Blinks in the trailing minute
    pub blink_rate: u32,

    /// Blink rate outside the normal band
    pub is_blink_rate_abnormal: bool,

    /// PERCLOS over the closure window (0-100)
    pub drowsiness_index: f64,

    /// Classified fatigue
    pub fatigue_level: FatigueLevel,

    /// Seconds since tracking started
    pub session_duration: f64,

    /// Whether a session is running
    pub is_tracking: bool,

    /// Frames processed per second over the last tick
    pub fps: f64,

    /// Last average EAR
    pub avg_ear: f32,
}

/// Aggregate bio-signal input for the downstream intervention engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BioSignals {
    /// PERCLOS scaled to 0-1
    pub fatigue_index: f64,
    /// Blinks per minute, once a full minute has been observed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blink_rate: Option<f64>,
}

impl MetricsSnapshot {
    /// Snapshot published the moment a session starts
    pub fn session_started() -> Self {
        Self {
            is_tracking: true,
            ..Default::default()
        }
    }

    /// Reduce to the bio-signal aggregate
    pub fn bio_signals(&self) -> BioSignals {
        BioSignals {
            fatigue_index: (self.drowsiness_index / 100.0).clamp(0.0, 1.0),
            blink_rate: (self.session_duration >= 60.0).then_some(self.blink_rate as f64),
        }
    }

    /// Whether the drowsiness signal warrants attention
    pub fn is_fatigued(&self) -> bool {
        self.fatigue_level >= FatigueLevel::Moderate
    }
}
