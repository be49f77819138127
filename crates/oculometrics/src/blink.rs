//! Blink detection with hysteresis

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::state::EyeState;

/// A completed close -> open cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkEvent {
    /// Time the eye re-opened (milliseconds)
    pub timestamp_ms: u64,
    /// Time from first closed frame to re-open (milliseconds)
    pub duration_ms: u64,
    /// Frames spent below the close threshold
    pub closed_frames: u32,
}

/// Two-threshold blink state machine
///
/// OPEN -> BLINKING after `min_blink_frames` consecutive frames below the
/// close threshold; BLINKING -> OPEN (emitting a blink) on the first frame at
/// or above the open threshold. Readings between the thresholds hold state.
///
/// With `max_blink_duration_ms` set, a BLINKING phase that outlasts the limit
/// is abandoned: the detector returns to OPEN and ignores closed frames until
/// the eye clearly re-opens, so a long closure never turns into a blink.
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    close_threshold: f32,
    open_threshold: f32,
    min_blink_frames: u32,
    max_blink_duration_ms: Option<u64>,
    state: EyeState,
    closed_frames: u32,
    closure_started_ms: Option<u64>,
    blinking_since_ms: Option<u64>,
    awaiting_reopen: bool,
}

impl BlinkDetector {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            close_threshold: config.ear_threshold,
            open_threshold: config.ear_open_threshold,
            min_blink_frames: config.min_blink_frames,
            max_blink_duration_ms: config.max_blink_duration_ms,
            state: EyeState::Open,
            closed_frames: 0,
            closure_started_ms: None,
            blinking_since_ms: None,
            awaiting_reopen: false,
        }
    }

    /// Feed one frame's average EAR; returns the blink completed on this frame, if any
    pub fn update(&mut self, avg_ear: f32, now_ms: u64) -> Option<BlinkEvent> {
        match self.state {
            EyeState::Open if self.awaiting_reopen => {
                if avg_ear >= self.open_threshold {
                    self.awaiting_reopen = false;
                }
                None
            }
            EyeState::Open => {
                if avg_ear < self.close_threshold {
                    if self.closed_frames == 0 {
                        self.closure_started_ms = Some(now_ms);
                    }
                    self.closed_frames += 1;
                    if self.closed_frames >= self.min_blink_frames {
                        debug!("Blink onset after {} closed frames", self.closed_frames);
                        self.state = EyeState::Blinking;
                        self.blinking_since_ms = Some(now_ms);
                    }
                } else {
                    self.closed_frames = 0;
                    self.closure_started_ms = None;
                }
                None
            }
            EyeState::Blinking => {
                if avg_ear >= self.open_threshold {
                    let started = self.closure_started_ms.unwrap_or(now_ms);
                    let event = BlinkEvent {
                        timestamp_ms: now_ms,
                        duration_ms: now_ms.saturating_sub(started),
                        closed_frames: self.closed_frames,
                    };
                    self.reopen();
                    return Some(event);
                }

                if avg_ear < self.close_threshold {
                    self.closed_frames = self.closed_frames.saturating_add(1);
                }

                if let (Some(limit), Some(since)) =
                    (self.max_blink_duration_ms, self.blinking_since_ms)
                {
                    let held = now_ms.saturating_sub(since);
                    if held > limit {
                        debug!("Blink abandoned after {}ms without a clear re-open", held);
                        self.reopen();
                        self.awaiting_reopen = true;
                    }
                }
                None
            }
        }
    }

    pub fn state(&self) -> EyeState {
        self.state
    }

    /// Consecutive frames below the close threshold in the current closure
    pub fn closed_frames(&self) -> u32 {
        self.closed_frames
    }

    pub fn reset(&mut self) {
        self.reopen();
        self.awaiting_reopen = false;
    }

    fn reopen(&mut self) {
        self.state = EyeState::Open;
        self.closed_frames = 0;
        self.closure_started_ms = None;
        self.blinking_since_ms = None;
    }
}
