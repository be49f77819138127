//! Fatigue Monitor Implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use landmarks::{LandmarkFrame, LandmarkSource};
use metrics::{counter, gauge};
use oculometrics::{EngineConfig, FatigueAnalyzer, FatigueLevel, MetricsSnapshot};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::MonitorError;

/// Frames buffered between the source and the session task
pub const FRAME_CHANNEL_CAPACITY: usize = 64;

/// End-of-session report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Wall time from start to stop (seconds)
    pub duration_secs: f64,
    /// Blinks as of the last published tick
    pub total_blinks: u64,
    /// Frames analyzed as of the last published tick
    pub frames_processed: u64,
    /// Highest fatigue level published
    pub peak_fatigue: FatigueLevel,
    /// Mean PERCLOS across published ticks
    pub mean_perclos: f64,
}

/// Running aggregates, published by the session task on each tick
#[derive(Debug, Clone, Default)]
struct SessionTotals {
    ticks: u64,
    perclos_sum: f64,
    peak_fatigue: FatigueLevel,
    blinks: u64,
    frames: u64,
}

impl SessionTotals {
    fn record(&mut self, snapshot: &MetricsSnapshot, frames: u64) {
        self.ticks += 1;
        self.perclos_sum += snapshot.drowsiness_index;
        self.peak_fatigue = self.peak_fatigue.max(snapshot.fatigue_level);
        self.blinks = snapshot.blink_count;
        self.frames = frames;
    }

    fn mean_perclos(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.perclos_sum / self.ticks as f64
        }
    }
}

/// Handles to a running session
struct ActiveSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    started: Instant,
    /// Cleared on stop; the task publishes nothing once it reads false
    active: Arc<AtomicBool>,
    task: JoinHandle<()>,
    totals: watch::Receiver<SessionTotals>,
}

/// Fatigue tracking lifecycle around an injected landmark source
pub struct FatigueMonitor<S: LandmarkSource> {
    config: EngineConfig,
    source: S,
    snapshots: watch::Sender<MetricsSnapshot>,
    session: Option<ActiveSession>,
}

impl<S: LandmarkSource> FatigueMonitor<S> {
    /// Create a monitor; configuration errors are reported here, not at start
    pub fn new(config: EngineConfig, source: S) -> Result<Self, MonitorError> {
        config.validate()?;
        let (snapshots, _) = watch::channel(MetricsSnapshot::default());

        info!(
            "Creating fatigue monitor (source={}, window={}, interval={}ms)",
            source.name(),
            config.window_size,
            config.ui_update_interval_ms
        );

        Ok(Self {
            config,
            source,
            snapshots,
            session: None,
        })
    }

    /// Start a fresh session, tearing down any previous one first.
    ///
    /// On failure the monitor is left not tracking with nothing running.
    pub fn start(&mut self) -> Result<(), MonitorError> {
        if self.session.is_some() {
            info!("Restarting tracking session");
            self.stop();
        }

        let runtime = Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;
        let analyzer = FatigueAnalyzer::new(self.config.clone())?;
        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);

        if let Err(e) = self.source.start(frame_tx) {
            error!("Failed to start landmark source '{}': {}", self.source.name(), e);
            self.source.stop();
            return Err(e.into());
        }

        let id = Uuid::new_v4();
        let active = Arc::new(AtomicBool::new(true));
        let (totals_tx, totals_rx) = watch::channel(SessionTotals::default());
        let started = Instant::now();

        self.snapshots.send_replace(MetricsSnapshot::session_started());

        let task = SessionTask {
            analyzer,
            frames: frame_rx,
            snapshots: self.snapshots.clone(),
            totals: totals_tx,
            active: Arc::clone(&active),
            started,
            interval: Duration::from_millis(self.config.ui_update_interval_ms),
        };

        info!("Tracking session {} started", id);

        self.session = Some(ActiveSession {
            id,
            started_at: Utc::now(),
            started,
            active,
            task: runtime.spawn(task.run()),
            totals: totals_rx,
        });

        Ok(())
    }

    /// Stop tracking. Idempotent, never blocks.
    ///
    /// The last published snapshot is kept, flagged not tracking.
    pub fn stop(&mut self) -> Option<SessionSummary> {
        self.source.stop();

        let session = self.session.take();
        if let Some(session) = &session {
            session.active.store(false, Ordering::SeqCst);
            session.task.abort();
        }

        self.snapshots.send_if_modified(|snapshot| {
            let was_tracking = snapshot.is_tracking;
            snapshot.is_tracking = false;
            was_tracking
        });

        let session = session?;
        let totals = session.totals.borrow().clone();
        let summary = SessionSummary {
            session_id: session.id,
            started_at: session.started_at,
            duration_secs: session.started.elapsed().as_secs_f64(),
            total_blinks: totals.blinks,
            frames_processed: totals.frames,
            peak_fatigue: totals.peak_fatigue,
            mean_perclos: totals.mean_perclos(),
        };

        info!(
            "Tracking session {} stopped after {:.1}s ({} blinks, peak {})",
            summary.session_id, summary.duration_secs, summary.total_blinks, summary.peak_fatigue
        );

        Some(summary)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<MetricsSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: LandmarkSource> Drop for FatigueMonitor<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Owner of all mutable tracking state for one session
struct SessionTask {
    analyzer: FatigueAnalyzer,
    frames: mpsc::Receiver<LandmarkFrame>,
    snapshots: watch::Sender<MetricsSnapshot>,
    totals: watch::Sender<SessionTotals>,
    active: Arc<AtomicBool>,
    started: Instant,
    interval: Duration,
}

impl SessionTask {
    async fn run(mut self) {
        let mut ticker = time::interval_at(self.started + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stream_open = true;

        loop {
            tokio::select! {
                frame = self.frames.recv(), if stream_open => match frame {
                    Some(frame) => self.on_frame(&frame),
                    None => {
                        debug!("Landmark stream ended; publishing continues");
                        stream_open = false;
                    }
                },
                _ = ticker.tick() => {
                    if !self.on_tick() {
                        break;
                    }
                }
            }
        }

        debug!("Session task exiting");
    }

    fn on_frame(&mut self, frame: &LandmarkFrame) {
        let now_ms = self.started.elapsed().as_millis() as u64;
        counter!("oculometrics_frames_total").increment(1);

        if self.analyzer.process_frame(frame, now_ms).is_some() {
            counter!("oculometrics_blinks_total").increment(1);
        }
    }

    /// Publish one snapshot; false once the session has been stopped
    fn on_tick(&mut self) -> bool {
        let elapsed = self.started.elapsed();
        let snapshot = self
            .analyzer
            .snapshot(elapsed.as_millis() as u64, elapsed.as_secs_f64());

        gauge!("oculometrics_perclos").set(snapshot.drowsiness_index);
        gauge!("oculometrics_fps").set(snapshot.fps);
        debug!(
            "Tick {:.1}s: fps={:.0} blinks={} rate={} perclos={:.1} level={}",
            snapshot.session_duration,
            snapshot.fps,
            snapshot.blink_count,
            snapshot.blink_rate,
            snapshot.drowsiness_index,
            snapshot.fatigue_level
        );

        let frames = self.analyzer.frames_processed();
        self.totals.send_modify(|totals| totals.record(&snapshot, frames));

        let active = &self.active;
        self.snapshots.send_if_modified(|current| {
            // Checked under the channel lock so stop() always wins
            if !active.load(Ordering::SeqCst) {
                return false;
            }
            *current = snapshot;
            true
        });

        self.active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landmarks::{SourceConfig, SourceError, SyntheticSource, UnavailableSource};

    fn steady_source() -> SyntheticSource {
        SyntheticSource::constant(SourceConfig::default(), 0.32)
    }

    /// Four-frame closure starting at frame 10 of every 30
    fn blinking_source() -> SyntheticSource {
        SyntheticSource::new(SourceConfig::default(), |i| {
            let ear = if (10..14).contains(&(i % 30)) { 0.1 } else { 0.32 };
            (ear, ear)
        })
    }

    async fn next_snapshot(rx: &mut watch::Receiver<MetricsSnapshot>) -> MetricsSnapshot {
        rx.changed().await.unwrap();
        rx.borrow_and_update().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_cadence_without_blinks() {
        let mut monitor = FatigueMonitor::new(EngineConfig::default(), steady_source()).unwrap();
        monitor.start().unwrap();
        let mut rx = monitor.subscribe();

        for tick in 1..=3 {
            let snapshot = next_snapshot(&mut rx).await;
            assert!(snapshot.is_tracking);
            assert!((29.0..=31.0).contains(&snapshot.fps), "fps = {}", snapshot.fps);
            assert_eq!(snapshot.blink_count, 0);
            assert_eq!(snapshot.fatigue_level, FatigueLevel::Normal);
            assert!((snapshot.session_duration - tick as f64).abs() < 0.05);
        }

        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_blinks_reach_snapshot() {
        let mut monitor = FatigueMonitor::new(EngineConfig::default(), blinking_source()).unwrap();
        monitor.start().unwrap();
        let mut rx = monitor.subscribe();

        let mut last = MetricsSnapshot::default();
        for _ in 0..3 {
            last = next_snapshot(&mut rx).await;
        }

        assert_eq!(last.blink_count, 3);
        assert_eq!(last.blink_rate, 3);
        assert!(last.is_blink_rate_abnormal);
        // 4 closed frames in every 30 is ~13% PERCLOS
        assert_eq!(last.fatigue_level, FatigueLevel::Normal);

        let summary = monitor.stop().unwrap();
        assert_eq!(summary.total_blinks, 3);
        assert!(summary.frames_processed >= 89);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_start_is_noop() {
        let mut monitor = FatigueMonitor::new(EngineConfig::default(), steady_source()).unwrap();

        assert!(monitor.stop().is_none());
        assert!(monitor.stop().is_none());
        assert!(!monitor.is_tracking());
        assert!(!monitor.snapshot().is_tracking);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_immediately_after_start() {
        let mut monitor = FatigueMonitor::new(EngineConfig::default(), steady_source()).unwrap();
        monitor.start().unwrap();
        assert!(monitor.snapshot().is_tracking);

        let summary = monitor.stop().unwrap();
        assert_eq!(summary.frames_processed, 0);
        assert_eq!(summary.peak_fatigue, FatigueLevel::Normal);
        assert!(monitor.stop().is_none());
        assert!(!monitor.is_tracking());
        assert!(!monitor.snapshot().is_tracking);
        assert!(!monitor.source().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_keeps_last_snapshot() {
        let mut monitor = FatigueMonitor::new(EngineConfig::default(), blinking_source()).unwrap();
        monitor.start().unwrap();
        let mut rx = monitor.subscribe();
        next_snapshot(&mut rx).await;
        let published = next_snapshot(&mut rx).await;

        monitor.stop();
        time::sleep(Duration::from_secs(3)).await;

        let after = monitor.snapshot();
        assert!(!after.is_tracking);
        assert_eq!(after.blink_count, published.blink_count);
        assert_eq!(after.session_duration, published.session_duration);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_state() {
        let mut monitor = FatigueMonitor::new(EngineConfig::default(), blinking_source()).unwrap();
        monitor.start().unwrap();
        let mut rx = monitor.subscribe();
        for _ in 0..2 {
            next_snapshot(&mut rx).await;
        }
        assert_eq!(monitor.snapshot().blink_count, 2);

        // start() on a running monitor tears the old session down first
        monitor.start().unwrap();
        let fresh = monitor.snapshot();
        assert!(fresh.is_tracking);
        assert_eq!(fresh.blink_count, 0);

        let mut rx = monitor.subscribe();
        let first = next_snapshot(&mut rx).await;
        assert_eq!(first.blink_count, 1);
        assert!((first.session_duration - 1.0).abs() < 0.05);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_source_holds_metrics() {
        let source = SyntheticSource::new(
            SourceConfig {
                fps: 30,
                max_frames: Some(30),
            },
            |_| (0.1, 0.1),
        );
        let mut monitor = FatigueMonitor::new(EngineConfig::default(), source).unwrap();
        monitor.start().unwrap();
        let mut rx = monitor.subscribe();

        let first = next_snapshot(&mut rx).await;
        let mut second = next_snapshot(&mut rx).await;
        if first.fps < 30.0 {
            // last frame landed after the first tick
            second = next_snapshot(&mut rx).await;
        }

        assert_eq!(second.fps, 0.0);
        assert_eq!(second.drowsiness_index, 100.0);
        assert_eq!(second.fatigue_level, FatigueLevel::Severe);
        assert!(second.is_tracking);
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_failure_leaves_clean_state() {
        let source = UnavailableSource::new(SourceError::PermissionDenied("camera".into()));
        let mut monitor = FatigueMonitor::new(EngineConfig::default(), source).unwrap();

        let err = monitor.start().unwrap_err();
        assert_eq!(
            err,
            MonitorError::Source(SourceError::PermissionDenied("camera".into()))
        );
        assert!(!monitor.is_tracking());
        assert!(!monitor.snapshot().is_tracking);
        assert!(monitor.stop().is_none());
    }

    #[test]
    fn test_start_without_runtime() {
        let mut monitor = FatigueMonitor::new(EngineConfig::default(), steady_source()).unwrap();
        assert_eq!(monitor.start().unwrap_err(), MonitorError::NoRuntime);
        assert!(!monitor.is_tracking());
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = EngineConfig {
            min_blink_frames: 0,
            ..Default::default()
        };
        assert!(matches!(
            FatigueMonitor::new(config, steady_source()),
            Err(MonitorError::Config(_))
        ));
    }
}
