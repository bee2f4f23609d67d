//! # selfie-metrics
//!
//! Facial geometry measurements from 68-point landmarks, an annotated
//! overlay of those measurements, and export of the results as survey rows.
//!
//! This crate provides:
//! - **Measurements**: symmetry score, eye geometry, nose and forehead
//!   proportions, face length/width and head roll from one landmark set
//! - **Overlay**: each measurement drawn as a colored, numbered line on a
//!   copy of the photo
//! - **Submission rows**: the measurements plus the participant's answers,
//!   validated and flattened into a fixed column layout
//!
//! Landmark detection and row storage sit behind the [`LandmarkDetector`]
//! and [`RowSink`] traits.
//!
//! ## Landmark Convention
//!
//! Points follow the standard 68-point layout: jaw 0-16, eyebrows 17-26,
//! nose 27-35, eyes 36-47, mouth 48-67.
//!
//! ## Quick Start
//!
//! ```rust
//! use selfie_metrics::{extract, render, LabelFont, LandmarkSet, Point};
//! use image::RgbImage;
//!
//! // Landmarks normally come from a detector.
//! let points: Vec<Point> = (0..68)
//!     .map(|i| Point::new(40.0 + i as f32, 60.0 + (i % 17) as f32 * 5.0))
//!     .collect();
//! let landmarks = LandmarkSet::new(points).unwrap();
//!
//! let features = extract(&landmarks).unwrap().with_satisfaction(Some(7.5));
//! println!("face width: {:.1}px", features.face_width);
//!
//! let photo = RgbImage::new(200, 200);
//! let annotated = render(&photo, &landmarks, &features, &LabelFont::Builtin);
//! assert_eq!(annotated.dimensions(), photo.dimensions());
//! ```

pub mod detector;
mod error;
pub mod geometry;
mod measure;
mod overlay;
pub mod session;
pub mod sink;
mod submission;
mod types;

pub use detector::{FixedDetector, LandmarkDetector, LandmarksFile};
pub use error::{Error, Result};
pub use measure::{
    extract, Anchor, FeatureResult, LabelSide, Measurement, Segment, FOREHEAD_EXTENSION,
    SEGMENTS, SYMMETRY_PAIRS,
};
pub use overlay::{render, LabelFont};
pub use session::{Analysis, Session};
pub use sink::{CsvSink, JsonLinesSink, MemorySink, RowSink};
pub use submission::{
    serialize, CellValue, SubmissionInput, SubmissionRow, ValidationError, COLUMNS,
};
pub use types::{LandmarkSet, Point, NUM_LANDMARKS};
