use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of points in the standard facial landmark convention.
///
/// Jaw 0-16, eyebrows 17-26, nose 27-35, eyes 36-47, mouth 48-67.
pub const NUM_LANDMARKS: usize = 68;

/// One landmark position, in pixels of the analyzed photo with the origin at
/// the top-left corner and `y` growing downward.
///
/// The operators exist for the anchor math in the extractor: midpoints of
/// brow landmarks and the forehead point projected above the nose bridge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<f32> for Point {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

/// The 68 landmarks of a single detected face.
///
/// Index meaning is fixed; the set is never reordered or resized after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    /// Wrap detector output, rejecting anything that is not exactly 68 points.
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() != NUM_LANDMARKS {
            return Err(Error::InvalidLandmarks {
                expected: NUM_LANDMARKS,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

impl std::ops::Index<usize> for LandmarkSet {
    type Output = Point;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.points[idx]
    }
}

// Detector output is exchanged as `[[x, y], ...]`.
impl Serialize for LandmarkSet {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.points.iter().map(|p| [p.x, p.y]))
    }
}

impl<'de> Deserialize<'de> for LandmarkSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: Vec<[f32; 2]> = Vec::deserialize(deserializer)?;
        let points = raw.into_iter().map(Point::from).collect();
        LandmarkSet::new(points).map_err(serde::de::Error::custom)
    }
}
