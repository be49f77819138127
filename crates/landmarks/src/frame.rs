//! Landmark frame types and the eye index convention

use serde::{Deserialize, Serialize};

/// Number of points in a Face Mesh landmark set
pub const FACE_MESH_POINTS: usize = 468;

/// Left eye indices in p1..p6 order (outer corner, upper lid x2, inner corner, lower lid x2)
pub const LEFT_EYE_INDICES: [usize; 6] = [33, 160, 158, 133, 153, 144];

/// Right eye indices in p1..p6 order
pub const RIGHT_EYE_INDICES: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// A landmark in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in 3D
    pub fn distance(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Uniformly scale about the origin
    pub fn scaled(&self, k: f32) -> Point3 {
        Point3::new(self.x * k, self.y * k, self.z * k)
    }
}

/// Eye selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EyeSide {
    Left,
    Right,
}

impl EyeSide {
    /// Face Mesh indices for this eye
    pub const fn indices(self) -> [usize; 6] {
        match self {
            EyeSide::Left => LEFT_EYE_INDICES,
            EyeSide::Right => RIGHT_EYE_INDICES,
        }
    }
}

/// The six landmarks of one eye
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarks {
    /// p1
    pub outer_corner: Point3,
    /// p2
    pub upper_outer: Point3,
    /// p3
    pub upper_inner: Point3,
    /// p4
    pub inner_corner: Point3,
    /// p5, below p3
    pub lower_inner: Point3,
    /// p6, below p2
    pub lower_outer: Point3,
}

impl EyeLandmarks {
    /// Build an eye outline centred on `center` whose aspect ratio is exactly `ear`.
    ///
    /// Horizontal width is `width`; both lid pairs open by `ear * width`.
    pub fn with_aspect_ratio(center: Point3, width: f32, ear: f32) -> Self {
        let half_w = width / 2.0;
        let quarter_w = width / 4.0;
        let half_h = ear.max(0.0) * width / 2.0;
        let at = |dx: f32, dy: f32| Point3::new(center.x + dx, center.y + dy, center.z);

        Self {
            outer_corner: at(-half_w, 0.0),
            upper_outer: at(-quarter_w, -half_h),
            upper_inner: at(quarter_w, -half_h),
            inner_corner: at(half_w, 0.0),
            lower_inner: at(quarter_w, half_h),
            lower_outer: at(-quarter_w, half_h),
        }
    }

    /// Points in p1..p6 order
    pub fn points(&self) -> [Point3; 6] {
        [
            self.outer_corner,
            self.upper_outer,
            self.upper_inner,
            self.inner_corner,
            self.lower_inner,
            self.lower_outer,
        ]
    }

    /// Uniformly scale every point
    pub fn scaled(&self, k: f32) -> Self {
        let [p1, p2, p3, p4, p5, p6] = self.points().map(|p| p.scaled(k));
        Self {
            outer_corner: p1,
            upper_outer: p2,
            upper_inner: p3,
            inner_corner: p4,
            lower_inner: p5,
            lower_outer: p6,
        }
    }
}

/// One detector output: every landmark for a single video frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Frame sequence number assigned by the source
    pub sequence: u64,
    /// Source timestamp (milliseconds)
    pub timestamp_ms: u64,
    /// Landmarks indexed by the Face Mesh convention
    pub points: Vec<Point3>,
}

impl LandmarkFrame {
    pub fn new(sequence: u64, timestamp_ms: u64, points: Vec<Point3>) -> Self {
        Self {
            sequence,
            timestamp_ms,
            points,
        }
    }

    /// Full Face Mesh frame whose eyes have the requested aspect ratios
    pub fn synthetic(sequence: u64, timestamp_ms: u64, left_ear: f32, right_ear: f32) -> Self {
        let mut points = vec![Point3::default(); FACE_MESH_POINTS];
        let left = EyeLandmarks::with_aspect_ratio(Point3::new(0.40, 0.42, -0.02), 0.08, left_ear);
        let right = EyeLandmarks::with_aspect_ratio(Point3::new(0.60, 0.42, -0.02), 0.08, right_ear);

        for (idx, p) in LEFT_EYE_INDICES.iter().zip(left.points()) {
            points[*idx] = p;
        }
        for (idx, p) in RIGHT_EYE_INDICES.iter().zip(right.points()) {
            points[*idx] = p;
        }

        Self::new(sequence, timestamp_ms, points)
    }

    /// Landmark at a Face Mesh index
    pub fn point(&self, index: usize) -> Option<&Point3> {
        self.points.get(index)
    }

    /// Extract one eye; `None` if any of its six indices is absent
    pub fn eye(&self, side: EyeSide) -> Option<EyeLandmarks> {
        let [i1, i2, i3, i4, i5, i6] = side.indices();
        Some(EyeLandmarks {
            outer_corner: *self.point(i1)?,
            upper_outer: *self.point(i2)?,
            upper_inner: *self.point(i3)?,
            inner_corner: *self.point(i4)?,
            lower_inner: *self.point(i5)?,
            lower_outer: *self.point(i6)?,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 12.0);
        assert!((a.distance(&b) - 13.0).abs() < 1e-6);
    }

    #[test]
    fn test_eye_extraction() {
        let frame = LandmarkFrame::synthetic(0, 0, 0.3, 0.3);
        assert_eq!(frame.len(), FACE_MESH_POINTS);

        let left = frame.eye(EyeSide::Left).unwrap();
        assert_eq!(left.outer_corner, frame.points[33]);
        assert_eq!(left.lower_outer, frame.points[144]);

        let right = frame.eye(EyeSide::Right).unwrap();
        assert_eq!(right.inner_corner, frame.points[263]);
    }

    #[test]
    fn test_truncated_frame_has_no_right_eye() {
        let mut frame = LandmarkFrame::synthetic(0, 0, 0.3, 0.3);
        frame.points.truncate(300);

        assert!(frame.eye(EyeSide::Left).is_some());
        assert!(frame.eye(EyeSide::Right).is_none());
    }

    #[test]
    fn test_empty_frame() {
        let frame = LandmarkFrame::default();
        assert!(frame.is_empty());
        assert!(frame.eye(EyeSide::Left).is_none());
    }

    #[test]
    fn test_synthetic_geometry() {
        let eye = EyeLandmarks::with_aspect_ratio(Point3::default(), 1.0, 0.3);
        assert!((eye.outer_corner.distance(&eye.inner_corner) - 1.0).abs() < 1e-6);
        assert!((eye.upper_outer.distance(&eye.lower_outer) - 0.3).abs() < 1e-6);
        assert!((eye.upper_inner.distance(&eye.lower_inner) - 0.3).abs() < 1e-6);
    }
}
