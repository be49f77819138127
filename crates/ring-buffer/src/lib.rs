//! Eye-Closure Ring Buffer
//!
//! Provides a fixed-capacity FIFO of per-frame closed/open flags with an
//! incrementally maintained closed count, from which PERCLOS is read in O(1).

mod buffer;

pub use buffer::{ClosureWindow, DEFAULT_CAPACITY};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Window construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("Window capacity must be at least 1")]
    ZeroCapacity,
}

/// Point-in-time view of the window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Frames currently retained
    pub len: usize,
    /// Retained frames flagged closed
    pub closed_count: usize,
    /// Percentage of retained frames flagged closed (0-100)
    pub perclos: f64,
}
