//! The landmark detector seam.
//!
//! Detection itself happens outside this crate. [`LandmarksFile`] reads the
//! output of an external 68-point detector saved as JSON; [`FixedDetector`]
//! returns a preset answer for tests.

use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{LandmarkSet, Point};

/// Anything that can find facial landmarks in an RGB image.
pub trait LandmarkDetector {
    /// Landmarks of the first face found, or `None` when there is no face.
    fn detect(&mut self, image: &RgbImage) -> Result<Option<LandmarkSet>>;
}

type RawFace = Vec<[f32; 2]>;

/// Detector output on disk.
///
/// Accepts `{"faces": [face, ...]}`, a bare `[face, ...]`, or `null`, where
/// each face is `[[x, y], ...]`. Point counts are checked after parsing so a
/// short face reports its size instead of a shape mismatch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectionFile {
    Wrapped { faces: Option<Vec<RawFace>> },
    Bare(Option<Vec<RawFace>>),
}

impl DetectionFile {
    fn into_faces(self) -> Vec<RawFace> {
        match self {
            DetectionFile::Wrapped { faces } | DetectionFile::Bare(faces) => {
                faces.unwrap_or_default()
            }
        }
    }
}

/// Reads pre-computed landmarks produced by an external detector.
#[derive(Debug, Clone)]
pub struct LandmarksFile {
    path: PathBuf,
}

impl LandmarksFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse detector output, keeping only the first face.
    pub fn parse(json: &str) -> Result<Option<LandmarkSet>> {
        let file: DetectionFile = serde_json::from_str(json)?;
        let faces = file.into_faces();
        if faces.len() > 1 {
            info!(faces = faces.len(), "multiple faces detected, using the first");
        }
        faces
            .into_iter()
            .next()
            .map(|face| LandmarkSet::new(face.into_iter().map(Point::from).collect()))
            .transpose()
    }
}

impl LandmarkDetector for LandmarksFile {
    fn detect(&mut self, image: &RgbImage) -> Result<Option<LandmarkSet>> {
        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::DetectionUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        let (width, height) = image.dimensions();
        debug!(path = %self.path.display(), width, height, "reading detector output");
        Self::parse(&json)
    }
}

/// Returns the same answer for every image.
#[derive(Debug, Clone, Default)]
pub struct FixedDetector {
    landmarks: Option<LandmarkSet>,
    calls: usize,
}

impl FixedDetector {
    pub fn new(landmarks: Option<LandmarkSet>) -> Self {
        Self {
            landmarks,
            calls: 0,
        }
    }

    /// How many times `detect` has run.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl LandmarkDetector for FixedDetector {
    fn detect(&mut self, _image: &RgbImage) -> Result<Option<LandmarkSet>> {
        self.calls += 1;
        Ok(self.landmarks.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_json(offset: f32) -> String {
        let pts: Vec<[f32; 2]> = (0..68).map(|i| [i as f32 + offset, 1.0]).collect();
        serde_json::to_string(&pts).unwrap()
    }

    #[test]
    fn parses_wrapped_and_bare_forms() {
        let wrapped = format!("{{\"faces\": [{}]}}", face_json(0.0));
        let face = LandmarksFile::parse(&wrapped).unwrap().unwrap();
        assert_eq!(face[3], Point::new(3.0, 1.0));

        let bare = format!("[{}]", face_json(0.0));
        assert!(LandmarksFile::parse(&bare).unwrap().is_some());
    }

    #[test]
    fn no_face_is_none() {
        assert!(LandmarksFile::parse("null").unwrap().is_none());
        assert!(LandmarksFile::parse("[]").unwrap().is_none());
        assert!(LandmarksFile::parse("{\"faces\": null}").unwrap().is_none());
        assert!(LandmarksFile::parse("{\"faces\": []}").unwrap().is_none());
    }

    #[test]
    fn first_face_wins() {
        let json = format!("[{}, {}]", face_json(0.0), face_json(500.0));
        let face = LandmarksFile::parse(&json).unwrap().unwrap();
        assert_eq!(face[0], Point::new(0.0, 1.0));
    }

    #[test]
    fn short_face_is_rejected() {
        for json in [
            "[[[1.0, 2.0], [3.0, 4.0]]]",
            "{\"faces\": [[[1.0, 2.0], [3.0, 4.0]]]}",
        ] {
            let err = LandmarksFile::parse(json).unwrap_err();
            assert!(
                matches!(err, Error::InvalidLandmarks { expected: 68, actual: 2 }),
                "{err:?}"
            );
        }
    }

    #[test]
    fn malformed_output_is_a_json_error() {
        let err = LandmarksFile::parse("{\"faces\": [[[1.0]]]}").unwrap_err();
        assert!(matches!(err, Error::Json(_)), "{err:?}");
    }

    #[test]
    fn missing_file_is_unavailable() {
        let mut detector = LandmarksFile::new("/nonexistent/landmarks.json");
        let err = detector.detect(&RgbImage::new(4, 4)).unwrap_err();
        assert!(matches!(err, Error::DetectionUnavailable(_)));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("landmarks.json");
        std::fs::write(&path, format!("{{\"faces\": [{}]}}", face_json(2.0))).unwrap();

        let mut detector = LandmarksFile::new(&path);
        let face = detector.detect(&RgbImage::new(4, 4)).unwrap().unwrap();
        assert_eq!(face[0], Point::new(2.0, 1.0));
    }

    #[test]
    fn fixed_detector_counts_calls() {
        let mut detector = FixedDetector::new(None);
        assert!(detector.detect(&RgbImage::new(1, 1)).unwrap().is_none());
        assert!(detector.detect(&RgbImage::new(1, 1)).unwrap().is_none());
        assert_eq!(detector.calls(), 2);
    }
}
