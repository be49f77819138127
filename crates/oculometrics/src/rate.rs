//! Rolling blink-rate tracker

use std::collections::VecDeque;

use crate::config::EngineConfig;

/// Blink timestamps within a trailing window
#[derive(Debug, Clone)]
pub struct BlinkRateTracker {
    timestamps: VecDeque<u64>,
    window_ms: u64,
    normal_range: (u32, u32),
}

impl BlinkRateTracker {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(64),
            window_ms: config.blink_rate_window_ms,
            normal_range: config.normal_blink_rate,
        }
    }

    /// Record a blink and drop anything that has aged out relative to it
    pub fn record(&mut self, timestamp_ms: u64) {
        self.timestamps.push_back(timestamp_ms);
        self.evict(timestamp_ms);
    }

    /// Blinks within the window ending at `now_ms`.
    ///
    /// With the default one-minute window this is blinks per minute.
    pub fn rate(&mut self, now_ms: u64) -> u32 {
        self.evict(now_ms);
        self.timestamps.len() as u32
    }

    /// Outside the normal physiological band
    pub fn is_abnormal(&self, rate: u32) -> bool {
        let (low, high) = self.normal_range;
        rate < low || rate > high
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
    }

    fn evict(&mut self, now_ms: u64) {
        while let Some(&oldest) = self.timestamps.front() {
            if now_ms.saturating_sub(oldest) > self.window_ms {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> BlinkRateTracker {
        BlinkRateTracker::new(&EngineConfig::default())
    }

    #[test]
    fn test_only_last_minute_counts() {
        let mut tracker = tracker();
        // 40 blinks evenly over 120s
        for i in 0..40u64 {
            tracker.record(i * 3000);
        }
        assert_eq!(tracker.rate(120_000), 20);
    }

    #[test]
    fn test_old_blinks_expire_without_new_ones() {
        let mut tracker = tracker();
        tracker.record(1_000);
        tracker.record(2_000);
        assert_eq!(tracker.rate(30_000), 2);
        assert_eq!(tracker.rate(61_500), 1);
        assert_eq!(tracker.rate(70_000), 0);
    }

    #[test]
    fn test_record_trims_buffer() {
        let mut tracker = tracker();
        tracker.record(0);
        tracker.record(90_000);
        assert_eq!(tracker.timestamps.len(), 1);
    }

    #[test]
    fn test_abnormal_band() {
        let tracker = tracker();
        assert!(tracker.is_abnormal(0));
        assert!(tracker.is_abnormal(9));
        assert!(!tracker.is_abnormal(10));
        assert!(!tracker.is_abnormal(17));
        assert!(!tracker.is_abnormal(30));
        assert!(tracker.is_abnormal(31));
    }

    #[test]
    fn test_clear() {
        let mut tracker = tracker();
        tracker.record(5);
        tracker.clear();
        assert_eq!(tracker.rate(10), 0);
    }
}
