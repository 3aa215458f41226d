use anyhow::{bail, Result};
use image::GrayImage;

/// Number of points in the facial landmark convention this crate expects.
pub const LANDMARK_COUNT: usize = 68;

/// Landmark indices for the left eye, corner-first clockwise.
pub const LEFT_EYE: [usize; 6] = [36, 37, 38, 39, 40, 41];
/// Landmark indices for the right eye, corner-first clockwise.
pub const RIGHT_EYE: [usize; 6] = [42, 43, 44, 45, 46, 47];

/// Pixel position of one landmark. Coordinates are signed because a
/// detector may place points slightly outside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One detected face as a full 68-point landmark set.
#[derive(Debug, Clone)]
pub struct FaceLandmarks {
    points: Vec<Point>,
}

impl FaceLandmarks {
    pub fn from_points(points: Vec<Point>) -> Result<Self> {
        if points.len() != LANDMARK_COUNT {
            bail!(
                "expected {} landmarks, detector produced {}",
                LANDMARK_COUNT,
                points.len()
            );
        }
        Ok(Self { points })
    }

    pub fn landmark(&self, index: usize) -> Point {
        self.points[index]
    }

    /// Collect the six points of one eye in index order.
    pub fn eye(&self, indices: &[usize; 6]) -> [Point; 6] {
        indices.map(|index| self.points[index])
    }
}

/// External landmark detection capability. Implementations wrap whatever
/// model backend the host application links against.
pub trait LandmarkDetector: Send {
    /// Detect faces in a grayscale frame. An empty result means no face;
    /// per-frame detection itself does not fail.
    fn detect_faces(&mut self, frame: &GrayImage) -> Vec<FaceLandmarks>;
}
