//! One user's analyze-then-submit flow.
//!
//! Detection and persistence are blocking calls made once each, with no
//! retries. An [`Analysis`] is only ever borrowed by [`Session::submit`], so
//! after a validation or sink failure the caller still holds it and can
//! resubmit with corrected answers.

use image::RgbImage;
use tracing::{info, warn};

use crate::detector::LandmarkDetector;
use crate::error::{Error, Result};
use crate::measure::{extract, FeatureResult};
use crate::overlay::{render, LabelFont};
use crate::sink::RowSink;
use crate::submission::{serialize, SubmissionInput, SubmissionRow};
use crate::types::LandmarkSet;

/// Results for one analyzed photo.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub landmarks: LandmarkSet,
    pub features: FeatureResult,
    /// Overlay drawn on a copy of the photo.
    pub annotated: RgbImage,
}

pub struct Session<D, S> {
    detector: D,
    sink: S,
    font: LabelFont,
}

impl<D: LandmarkDetector, S: RowSink> Session<D, S> {
    pub fn new(detector: D, sink: S, font: LabelFont) -> Self {
        Self {
            detector,
            sink,
            font,
        }
    }

    /// Detect, measure and annotate one photo.
    ///
    /// Fails with [`Error::NoFaceDetected`] without measuring or drawing
    /// anything when the detector finds no face.
    pub fn analyze(&mut self, image: &RgbImage, satisfaction: Option<f64>) -> Result<Analysis> {
        let Some(landmarks) = self.detector.detect(image)? else {
            warn!("no face detected");
            return Err(Error::NoFaceDetected);
        };

        let features = extract(&landmarks)?.with_satisfaction(satisfaction);
        let annotated = render(image, &landmarks, &features, &self.font);
        info!(
            symmetry_score = features.symmetry_score,
            roll_diff = features.roll_diff,
            "analysis complete"
        );

        Ok(Analysis {
            landmarks,
            features,
            annotated,
        })
    }

    /// Validate the answers and append the row. Nothing is appended if
    /// validation fails.
    pub fn submit(&mut self, analysis: &Analysis, input: &SubmissionInput) -> Result<SubmissionRow> {
        let row = serialize(input, &analysis.features).map_err(|e| {
            warn!(field = e.field(), error = %e, "submission rejected");
            Error::from(e)
        })?;
        self.sink.append_row(&row)?;
        info!(id = %input.id, "submission recorded");
        Ok(row)
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::FixedDetector;
    use crate::measure::tests::synthetic_face;
    use crate::sink::MemorySink;
    use crate::submission::ValidationError;

    fn answers() -> SubmissionInput {
        SubmissionInput {
            id: "54321".into(),
            angle: Some(12.5),
            satisfaction: Some(9.0),
            reason: "natural smile".into(),
        }
    }

    #[test]
    fn no_face_stops_before_measuring() {
        let mut session = Session::new(FixedDetector::new(None), MemorySink::new(), LabelFont::Builtin);
        let err = session.analyze(&RgbImage::new(200, 200), Some(5.0)).unwrap_err();
        assert!(matches!(err, Error::NoFaceDetected));
        assert_eq!(session.detector().calls(), 1);
        assert!(session.sink().rows().is_empty());
    }

    #[test]
    fn analyze_then_submit() {
        let mut session = Session::new(
            FixedDetector::new(Some(synthetic_face())),
            MemorySink::new(),
            LabelFont::Builtin,
        );
        let image = RgbImage::new(200, 200);
        let analysis = session.analyze(&image, Some(9.0)).unwrap();
        assert_eq!(analysis.features.satisfaction, Some(9.0));
        assert_ne!(analysis.annotated, image);

        let row = session.submit(&analysis, &answers()).unwrap();
        assert_eq!(session.sink().rows(), &[row]);
    }

    #[test]
    fn rejected_submission_keeps_analysis_for_retry() {
        let mut session = Session::new(
            FixedDetector::new(Some(synthetic_face())),
            MemorySink::new(),
            LabelFont::Builtin,
        );
        let analysis = session.analyze(&RgbImage::new(200, 200), Some(9.0)).unwrap();

        let mut bad = answers();
        bad.id = "5432".into();
        let err = session.submit(&analysis, &bad).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidId(_))
        ));
        assert!(session.sink().rows().is_empty());

        session.submit(&analysis, &answers()).unwrap();
        assert_eq!(session.sink().rows().len(), 1);
        assert_eq!(session.detector().calls(), 1);
    }

    #[test]
    fn sink_failure_is_surfaced() {
        let mut session = Session::new(
            FixedDetector::new(Some(synthetic_face())),
            MemorySink::failing("offline"),
            LabelFont::Builtin,
        );
        let analysis = session.analyze(&RgbImage::new(200, 200), None).unwrap();
        let err = session.submit(&analysis, &answers()).unwrap_err();
        assert!(matches!(err, Error::SinkWrite(_)));
    }
}
