//! Facial Landmark Frames and Sources
//!
//! Provides the data model consumed by the oculometric engine:
//! - 3D landmark points in normalized image coordinates
//! - Per-frame landmark sets with the Face Mesh eye index convention
//! - The `LandmarkSource` trait through which a detector pushes frames
//! - A synthetic source for demos and deterministic tests

pub mod frame;
pub mod source;

pub use frame::{EyeLandmarks, EyeSide, LandmarkFrame, Point3};
pub use source::{EarScript, LandmarkSource, SyntheticSource, UnavailableSource};

use thiserror::Error;

/// Landmark source error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Capture source unavailable: {0}")]
    Unavailable(String),

    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("Landmark detector failed to initialize: {0}")]
    DetectorInit(String),

    #[error("Source already running")]
    AlreadyRunning,
}

/// Frame source configuration
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Target frames per second
    pub fps: u32,
    /// Stop after this many frames (None = run until stopped)
    pub max_frames: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            max_frames: None,
        }
    }
}

impl SourceConfig {
    /// Interval between frames
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}
