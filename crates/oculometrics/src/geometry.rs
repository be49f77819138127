//! Eye aspect ratio from landmark geometry

use landmarks::{EyeLandmarks, EyeSide, LandmarkFrame};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-frame EAR for both eyes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EarReading {
    pub left: f32,
    pub right: f32,
}

impl EarReading {
    /// Mean of both eyes
    pub fn average(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

/// EAR = (|p2-p6| + |p3-p5|) / (2 |p1-p4|)
///
/// Degenerate geometry (zero or non-finite eye width) yields 0.0.
pub fn eye_aspect_ratio(eye: &EyeLandmarks) -> f32 {
    let vertical_outer = eye.upper_outer.distance(&eye.lower_outer);
    let vertical_inner = eye.upper_inner.distance(&eye.lower_inner);
    let horizontal = eye.outer_corner.distance(&eye.inner_corner);

    if horizontal <= f32::EPSILON || !horizontal.is_finite() {
        return 0.0;
    }

    let ear = (vertical_outer + vertical_inner) / (2.0 * horizontal);
    if ear.is_finite() {
        ear
    } else {
        0.0
    }
}

/// EAR of one eye in a frame; 0.0 when any of its landmarks is missing
pub fn frame_eye_ratio(frame: &LandmarkFrame, side: EyeSide) -> f32 {
    match frame.eye(side) {
        Some(eye) => eye_aspect_ratio(&eye),
        None => {
            debug!("Frame {}: {:?} eye landmarks missing", frame.sequence, side);
            0.0
        }
    }
}

/// EAR of both eyes in a frame
pub fn frame_ratios(frame: &LandmarkFrame) -> EarReading {
    EarReading {
        left: frame_eye_ratio(frame, EyeSide::Left),
        right: frame_eye_ratio(frame, EyeSide::Right),
    }
}
