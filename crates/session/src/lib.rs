//! Tracking Session Controller
//!
//! Separates two timing domains:
//! - every landmark frame updates the analyzer immediately, with no observable effect
//! - on a fixed interval a `MetricsSnapshot` is assembled and published
//!
//! Both run inside one task that owns all mutable tracking state.

mod monitor;

pub use monitor::{FatigueMonitor, SessionSummary, FRAME_CHANNEL_CAPACITY};

use landmarks::SourceError;
use oculometrics::ConfigError;
use thiserror::Error;

/// Lifecycle errors surfaced from `FatigueMonitor`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Landmark source failed: {0}")]
    Source(#[from] SourceError),

    #[error("Tracking requires a running tokio runtime")]
    NoRuntime,
}
