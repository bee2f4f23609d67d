//! Facial measurements derived from the 68 landmark points.
//!
//! Every measurement that corresponds to a line on the face is described by
//! one row of [`SEGMENTS`]: which two points it spans, which legend number
//! labels it and which color draws it. The extractor and the overlay both read
//! that table, so a number in the results always matches a line on the image.

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::{angle_degrees, distance, extrapolate, midpoint};
use crate::types::{LandmarkSet, Point};

/// Left/right landmark pairs averaged into the symmetry score:
/// brows, eyes, nose base, mouth, and jaw contour.
pub const SYMMETRY_PAIRS: [(usize, usize); 18] = [
    (17, 26),
    (18, 25),
    (19, 24),
    (20, 23),
    (21, 22),
    (36, 45),
    (37, 44),
    (38, 43),
    (39, 42),
    (40, 47),
    (41, 46),
    (31, 35),
    (32, 34),
    (48, 54),
    (49, 53),
    (50, 52),
    (3, 13),
    (4, 12),
];

/// How far past the nose bridge the forehead point sits, as a fraction of
/// the chin-to-bridge distance.
pub const FOREHEAD_EXTENSION: f32 = 0.25;

/// One of the fourteen landmark-derived measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measurement {
    SymmetryScore,
    RollDiff,
    LeftEyeWidth,
    LeftEyeHeight,
    RightEyeWidth,
    RightEyeHeight,
    EyeInnerDist,
    PhiltrumLength,
    NoseLength,
    NoseWidth,
    ForeheadHeight,
    ChinLipLength,
    FaceLength,
    FaceWidth,
}

impl Measurement {
    /// All measurements, in submission column order.
    pub const ALL: [Measurement; 14] = [
        Measurement::SymmetryScore,
        Measurement::RollDiff,
        Measurement::LeftEyeWidth,
        Measurement::LeftEyeHeight,
        Measurement::RightEyeWidth,
        Measurement::RightEyeHeight,
        Measurement::EyeInnerDist,
        Measurement::PhiltrumLength,
        Measurement::NoseLength,
        Measurement::NoseWidth,
        Measurement::ForeheadHeight,
        Measurement::ChinLipLength,
        Measurement::FaceLength,
        Measurement::FaceWidth,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Measurement::SymmetryScore => "symmetry_score",
            Measurement::RollDiff => "roll_diff",
            Measurement::LeftEyeWidth => "left_eye_width",
            Measurement::LeftEyeHeight => "left_eye_height",
            Measurement::RightEyeWidth => "right_eye_width",
            Measurement::RightEyeHeight => "right_eye_height",
            Measurement::EyeInnerDist => "eye_inner_dist",
            Measurement::PhiltrumLength => "philtrum_length",
            Measurement::NoseLength => "nose_length",
            Measurement::NoseWidth => "nose_width",
            Measurement::ForeheadHeight => "forehead_height",
            Measurement::ChinLipLength => "chin_lip_length",
            Measurement::FaceLength => "face_length",
            Measurement::FaceWidth => "face_width",
        }
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A point a segment starts or ends at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// A detected landmark by index.
    Landmark(usize),
    /// Midpoint of the inner brow ends (21, 22).
    BrowCenter,
    /// Estimated forehead point, extrapolated from the chin (8) through the
    /// nose bridge (27). Approximate: it is not a detected feature.
    Forehead,
}

impl Anchor {
    pub fn resolve(self, landmarks: &LandmarkSet) -> Point {
        match self {
            Anchor::Landmark(i) => landmarks[i],
            Anchor::BrowCenter => midpoint(landmarks[21], landmarks[22]),
            Anchor::Forehead => extrapolate(landmarks[8], landmarks[27], FOREHEAD_EXTENSION),
        }
    }
}

/// Which side of a segment its legend number is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSide {
    Above,
    Right,
    Left,
}

impl LabelSide {
    /// Pixel offset from the segment midpoint.
    pub fn offset(self) -> Point {
        match self {
            LabelSide::Above => Point::new(0.0, -10.0),
            LabelSide::Right => Point::new(5.0, 0.0),
            LabelSide::Left => Point::new(-10.0, 0.0),
        }
    }
}

/// A measurement drawn as a line between two anchors.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub measurement: Measurement,
    pub from: Anchor,
    pub to: Anchor,
    /// Legend number printed next to the line.
    pub label: &'static str,
    pub color: [u8; 3],
    pub side: LabelSide,
}

impl Segment {
    pub fn endpoints(&self, landmarks: &LandmarkSet) -> (Point, Point) {
        (self.from.resolve(landmarks), self.to.resolve(landmarks))
    }

    pub fn length(&self, landmarks: &LandmarkSet) -> f32 {
        let (a, b) = self.endpoints(landmarks);
        distance(a, b)
    }

    /// Where the legend number goes: the midpoint pushed off the line.
    pub fn label_position(&self, landmarks: &LandmarkSet) -> Point {
        let (a, b) = self.endpoints(landmarks);
        midpoint(a, b) + self.side.offset()
    }
}

const fn seg(
    measurement: Measurement,
    from: Anchor,
    to: Anchor,
    label: &'static str,
    color: [u8; 3],
    side: LabelSide,
) -> Segment {
    Segment {
        measurement,
        from,
        to,
        label,
        color,
        side,
    }
}

use self::Anchor::{BrowCenter, Forehead, Landmark as L};
use self::LabelSide::{Above, Left, Right};

/// Line measurements in legend order ("6" through "17").
pub const SEGMENTS: [Segment; 12] = [
    seg(Measurement::LeftEyeWidth, L(36), L(39), "6", [255, 0, 0], Above), // red
    seg(Measurement::LeftEyeHeight, L(37), L(41), "7", [0, 0, 255], Right), // blue
    seg(Measurement::RightEyeWidth, L(42), L(45), "8", [0, 128, 0], Above), // green
    seg(Measurement::RightEyeHeight, L(43), L(47), "9", [255, 165, 0], Right), // orange
    seg(Measurement::EyeInnerDist, L(39), L(42), "10", [128, 0, 128], Above), // purple
    seg(Measurement::PhiltrumLength, L(33), L(51), "11", [0, 255, 255], Right), // cyan
    seg(Measurement::NoseLength, L(27), L(33), "12", [255, 0, 255], Right), // magenta
    seg(Measurement::NoseWidth, L(31), L(35), "13", [255, 215, 0], Above), // gold
    seg(Measurement::ForeheadHeight, Forehead, BrowCenter, "14", [0, 191, 255], Right), // deepskyblue
    seg(Measurement::ChinLipLength, L(57), L(8), "15", [250, 128, 114], Right), // salmon
    seg(Measurement::FaceLength, Forehead, L(8), "16", [0, 255, 0], Left), // lime
    seg(Measurement::FaceWidth, L(1), L(15), "17", [238, 130, 238], Above), // violet
];

/// Landmark-derived measurements plus the user's satisfaction score.
///
/// Distances are in pixels of the analyzed image; `roll_diff` is in degrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureResult {
    /// Mean distance between the [`SYMMETRY_PAIRS`].
    pub symmetry_score: f32,
    /// Tilt of the outer-eye-corner line (36 -> 45).
    pub roll_diff: f32,
    pub left_eye_width: f32,
    pub left_eye_height: f32,
    pub right_eye_width: f32,
    pub right_eye_height: f32,
    pub eye_inner_dist: f32,
    pub philtrum_length: f32,
    pub nose_length: f32,
    pub nose_width: f32,
    pub forehead_height: f32,
    pub chin_lip_length: f32,
    pub face_length: f32,
    pub face_width: f32,

    /// User-supplied, not derived from landmarks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfaction: Option<f64>,
}

impl FeatureResult {
    pub fn get(&self, m: Measurement) -> f32 {
        match m {
            Measurement::SymmetryScore => self.symmetry_score,
            Measurement::RollDiff => self.roll_diff,
            Measurement::LeftEyeWidth => self.left_eye_width,
            Measurement::LeftEyeHeight => self.left_eye_height,
            Measurement::RightEyeWidth => self.right_eye_width,
            Measurement::RightEyeHeight => self.right_eye_height,
            Measurement::EyeInnerDist => self.eye_inner_dist,
            Measurement::PhiltrumLength => self.philtrum_length,
            Measurement::NoseLength => self.nose_length,
            Measurement::NoseWidth => self.nose_width,
            Measurement::ForeheadHeight => self.forehead_height,
            Measurement::ChinLipLength => self.chin_lip_length,
            Measurement::FaceLength => self.face_length,
            Measurement::FaceWidth => self.face_width,
        }
    }

    fn slot_mut(&mut self, m: Measurement) -> &mut f32 {
        match m {
            Measurement::SymmetryScore => &mut self.symmetry_score,
            Measurement::RollDiff => &mut self.roll_diff,
            Measurement::LeftEyeWidth => &mut self.left_eye_width,
            Measurement::LeftEyeHeight => &mut self.left_eye_height,
            Measurement::RightEyeWidth => &mut self.right_eye_width,
            Measurement::RightEyeHeight => &mut self.right_eye_height,
            Measurement::EyeInnerDist => &mut self.eye_inner_dist,
            Measurement::PhiltrumLength => &mut self.philtrum_length,
            Measurement::NoseLength => &mut self.nose_length,
            Measurement::NoseWidth => &mut self.nose_width,
            Measurement::ForeheadHeight => &mut self.forehead_height,
            Measurement::ChinLipLength => &mut self.chin_lip_length,
            Measurement::FaceLength => &mut self.face_length,
            Measurement::FaceWidth => &mut self.face_width,
        }
    }

    /// Measurements paired with their values, in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Measurement, f32)> + '_ {
        Measurement::ALL.iter().map(move |&m| (m, self.get(m)))
    }

    pub fn with_satisfaction(mut self, satisfaction: Option<f64>) -> Self {
        self.satisfaction = satisfaction;
        self
    }
}

/// Compute every measurement for one face.
///
/// Fails with [`Error::NonFiniteFeature`] if any value comes out NaN or
/// infinite, which only happens for non-finite input coordinates.
pub fn extract(landmarks: &LandmarkSet) -> Result<FeatureResult> {
    let mut result = FeatureResult {
        symmetry_score: symmetry_score(landmarks),
        roll_diff: angle_degrees(landmarks[36], landmarks[45]),
        ..Default::default()
    };

    for segment in &SEGMENTS {
        *result.slot_mut(segment.measurement) = segment.length(landmarks);
    }

    for (m, value) in result.iter() {
        if !value.is_finite() {
            return Err(Error::NonFiniteFeature(m.key()));
        }
        debug!(measurement = m.key(), value, "measured");
    }

    Ok(result)
}

fn symmetry_score(landmarks: &LandmarkSet) -> f32 {
    let total: f32 = SYMMETRY_PAIRS
        .iter()
        .map(|&(i, j)| distance(landmarks[i], landmarks[j]))
        .sum();
    total / SYMMETRY_PAIRS.len() as f32
}
