//! Landmark sources
//!
//! A source owns whatever produces landmarks (camera + detector, a replay
//! file, a script) and pushes frames into the channel handed to `start`.
//! The tracking engine never knows how or when the detector was loaded.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::frame::LandmarkFrame;
use crate::{SourceConfig, SourceError};

/// Producer of landmark frames
pub trait LandmarkSource: Send + 'static {
    /// Human-readable source name for logs
    fn name(&self) -> &str;

    /// Begin delivering frames. Must not block; fails if the capture
    /// device or detector cannot be brought up.
    fn start(&mut self, frames: mpsc::Sender<LandmarkFrame>) -> Result<(), SourceError>;

    /// Release the capture device. Idempotent and non-blocking.
    fn stop(&mut self);
}

/// Per-frame eye aspect ratios (left, right) keyed by frame index
pub type EarScript = Arc<dyn Fn(u64) -> (f32, f32) + Send + Sync>;

/// Source that synthesizes Face Mesh frames from an EAR script
pub struct SyntheticSource {
    config: SourceConfig,
    script: EarScript,
    task: Option<JoinHandle<()>>,
}

impl SyntheticSource {
    /// Create a source driven by `script(frame_index) -> (left_ear, right_ear)`
    pub fn new<F>(config: SourceConfig, script: F) -> Self
    where
        F: Fn(u64) -> (f32, f32) + Send + Sync + 'static,
    {
        Self {
            config,
            script: Arc::new(script),
            task: None,
        }
    }

    /// Source whose eyes never move
    pub fn constant(config: SourceConfig, ear: f32) -> Self {
        Self::new(config, move |_| (ear, ear))
    }

    /// Whether the producer task is alive
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl LandmarkSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn start(&mut self, frames: mpsc::Sender<LandmarkFrame>) -> Result<(), SourceError> {
        if self.is_running() {
            return Err(SourceError::AlreadyRunning);
        }

        let runtime = Handle::try_current()
            .map_err(|e| SourceError::Unavailable(format!("no async runtime: {}", e)))?;

        let interval = self.config.frame_interval();
        let max_frames = self.config.max_frames;
        let script = Arc::clone(&self.script);

        info!(
            "Starting synthetic landmark source at {} fps (max_frames={:?})",
            self.config.fps, max_frames
        );

        self.task = Some(runtime.spawn(async move {
            let started = Instant::now();
            let mut ticker = time::interval_at(started + interval, interval);
            let mut sequence = 0u64;

            loop {
                if max_frames.is_some_and(|max| sequence >= max) {
                    debug!("Synthetic source exhausted after {} frames", sequence);
                    break;
                }

                ticker.tick().await;

                let (left, right) = script(sequence);
                let timestamp_ms = started.elapsed().as_millis() as u64;
                let frame = LandmarkFrame::synthetic(sequence, timestamp_ms, left, right);

                match frames.try_send(frame) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        debug!("Frame {} dropped: consumer busy", sequence);
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!("Frame receiver dropped");
                        break;
                    }
                }

                sequence += 1;
            }
        }));

        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Synthetic landmark source stopped");
        }
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Source that always fails to start (missing device, denied permission)
pub struct UnavailableSource {
    error: SourceError,
}

impl UnavailableSource {
    pub fn new(error: SourceError) -> Self {
        Self { error }
    }
}

impl LandmarkSource for UnavailableSource {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn start(&mut self, _frames: mpsc::Sender<LandmarkFrame>) -> Result<(), SourceError> {
        warn!("Landmark source failed to start: {}", self.error);
        Err(self.error.clone())
    }

    fn stop(&mut self) {}
}
