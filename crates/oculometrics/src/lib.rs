//! Oculometric Fatigue Sensing
//!
//! Turns a stream of facial-landmark frames into a fatigue signal:
//! - Eye aspect ratio (EAR) per eye from six landmarks
//! - Blink detection with hysteresis and a minimum-duration filter
//! - PERCLOS over a fixed-capacity closure window
//! - Rolling blink rate with an abnormal-band flag
//! - Fatigue classification from PERCLOS
//!
//! `FatigueAnalyzer` is the synchronous per-frame path. It does a handful of
//! distance computations and O(1) buffer updates per frame and never blocks.

pub mod analysis;
pub mod blink;
pub mod config;
pub mod geometry;
pub mod rate;
pub mod state;

pub use analysis::{BioSignals, MetricsSnapshot};
pub use blink::{BlinkDetector, BlinkEvent};
pub use config::{ConfigError, EngineConfig};
pub use geometry::{eye_aspect_ratio, frame_ratios, EarReading};
pub use rate::BlinkRateTracker;
pub use state::{EyeState, FatigueLevel};

use landmarks::LandmarkFrame;
use ring_buffer::ClosureWindow;
use tracing::debug;

/// Per-frame fatigue analyzer
pub struct FatigueAnalyzer {
    config: EngineConfig,
    blink_detector: BlinkDetector,
    window: ClosureWindow,
    rate_tracker: BlinkRateTracker,
    blink_count: u64,
    frames_since_tick: u32,
    frames_processed: u64,
    last_reading: EarReading,
}

impl FatigueAnalyzer {
    /// Create an analyzer; invalid configuration is rejected, never clamped
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let window = ClosureWindow::new(config.window_size).map_err(|_| ConfigError::WindowSize)?;

        Ok(Self {
            blink_detector: BlinkDetector::new(&config),
            rate_tracker: BlinkRateTracker::new(&config),
            window,
            blink_count: 0,
            frames_since_tick: 0,
            frames_processed: 0,
            last_reading: EarReading::default(),
            config,
        })
    }

    /// Analyze one landmark frame observed at `now_ms`
    pub fn process_frame(&mut self, frame: &LandmarkFrame, now_ms: u64) -> Option<BlinkEvent> {
        let reading = geometry::frame_ratios(frame);
        self.process_reading(reading, now_ms)
    }

    /// Analyze one pair of eye aspect ratios
    pub fn process_reading(&mut self, reading: EarReading, now_ms: u64) -> Option<BlinkEvent> {
        let avg_ear = reading.average();
        self.last_reading = reading;
        self.frames_since_tick = self.frames_since_tick.saturating_add(1);
        self.frames_processed += 1;

        self.window.push(avg_ear < self.config.ear_threshold);

        let event = self.blink_detector.update(avg_ear, now_ms);
        if let Some(blink) = &event {
            self.blink_count += 1;
            self.rate_tracker.record(blink.timestamp_ms);
            debug!(
                "Blink #{} at {}ms ({}ms, {} frames)",
                self.blink_count, blink.timestamp_ms, blink.duration_ms, blink.closed_frames
            );
        }
        event
    }

    /// Assemble the tick's snapshot and restart the per-tick frame count
    pub fn snapshot(&mut self, now_ms: u64, session_duration_secs: f64) -> MetricsSnapshot {
        let frames = std::mem::take(&mut self.frames_since_tick);
        let fps = frames as f64 * 1000.0 / self.config.ui_update_interval_ms as f64;
        let blink_rate = self.rate_tracker.rate(now_ms);
        let perclos = self.window.perclos();

        MetricsSnapshot {
            eye_state: self.blink_detector.state(),
            blink_count: self.blink_count,
            blink_rate,
            is_blink_rate_abnormal: self.rate_tracker.is_abnormal(blink_rate),
            drowsiness_index: perclos,
            fatigue_level: FatigueLevel::classify(perclos),
            session_duration: session_duration_secs,
            is_tracking: true,
            fps,
            avg_ear: self.last_reading.average(),
        }
    }

    /// PERCLOS over the closure window (0-100)
    pub fn perclos(&self) -> f64 {
        self.window.perclos()
    }

    pub fn fatigue_level(&self) -> FatigueLevel {
        FatigueLevel::classify(self.window.perclos())
    }

    pub fn eye_state(&self) -> EyeState {
        self.blink_detector.state()
    }

    /// Blinks completed since creation or the last reset
    pub fn blink_count(&self) -> u64 {
        self.blink_count
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn last_reading(&self) -> EarReading {
        self.last_reading
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Discard all tracking state
    pub fn reset(&mut self) {
        self.blink_detector.reset();
        self.window.clear();
        self.rate_tracker.clear();
        self.blink_count = 0;
        self.frames_since_tick = 0;
        self.frames_processed = 0;
        self.last_reading = EarReading::default();
    }
}
