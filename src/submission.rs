//! Flattening an analysis plus the user's answers into one survey row.

use serde::Serialize;
use thiserror::Error;

use crate::measure::{FeatureResult, Measurement};

/// Column header of the survey sheet, in row order.
pub const COLUMNS: [&str; 18] = [
    "id",
    "angle",
    "satisfaction",
    "symmetry_score",
    "roll_diff",
    "left_eye_width",
    "left_eye_height",
    "right_eye_width",
    "right_eye_height",
    "eye_inner_dist",
    "philtrum_length",
    "nose_length",
    "nose_width",
    "forehead_height",
    "chin_lip_length",
    "face_length",
    "face_width",
    "reason",
];

/// Length of a participant identifier.
pub const ID_DIGITS: usize = 5;

/// A submission field that failed validation. Nothing is persisted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("identifier {0:?} must be exactly 5 digits")]
    InvalidId(String),

    #[error("capture angle is required")]
    MissingAngle,

    #[error("satisfaction score is required")]
    MissingSatisfaction,

    #[error("a reason is required")]
    EmptyReason,
}

impl ValidationError {
    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidId(_) => "id",
            ValidationError::MissingAngle => "angle",
            ValidationError::MissingSatisfaction => "satisfaction",
            ValidationError::EmptyReason => "reason",
        }
    }
}

/// What the user typed alongside the photo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionInput {
    pub id: String,
    /// Capture angle in degrees, up positive.
    pub angle: Option<f64>,
    pub satisfaction: Option<f64>,
    pub reason: String,
}

/// One cell of a submission row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            CellValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Number(_) => None,
        }
    }
}

impl From<f32> for CellValue {
    fn from(v: f32) -> Self {
        CellValue::Number(f64::from(v))
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_owned())
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(v) => write!(f, "{v}"),
        }
    }
}

/// The persisted row, laid out as [`COLUMNS`]. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubmissionRow {
    cells: Vec<CellValue>,
}

impl SubmissionRow {
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Look up a cell by column name.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        COLUMNS
            .iter()
            .position(|&c| c == column)
            .and_then(|i| self.cells.get(i))
    }
}

/// Validate the user's answers and build the row for `features`.
///
/// Measurements are widened to plain `f64` cells here; this is the only
/// place values cross into the sink's representation. The user's angle and
/// satisfaction are already `f64` and pass through unchanged.
pub fn serialize(
    input: &SubmissionInput,
    features: &FeatureResult,
) -> Result<SubmissionRow, ValidationError> {
    validate_id(&input.id)?;
    let angle = input.angle.ok_or(ValidationError::MissingAngle)?;
    let satisfaction = input
        .satisfaction
        .ok_or(ValidationError::MissingSatisfaction)?;
    if input.reason.trim().is_empty() {
        return Err(ValidationError::EmptyReason);
    }

    let mut cells = Vec::with_capacity(COLUMNS.len());
    cells.push(CellValue::from(input.id.as_str()));
    cells.push(CellValue::from(angle));
    cells.push(CellValue::from(satisfaction));
    cells.extend(
        Measurement::ALL
            .iter()
            .map(|&m| CellValue::from(features.get(m))),
    );
    cells.push(CellValue::from(input.reason.as_str()));
    debug_assert_eq!(cells.len(), COLUMNS.len());

    Ok(SubmissionRow { cells })
}

fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.len() == ID_DIGITS && id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidId(id.to_owned()))
    }
}
