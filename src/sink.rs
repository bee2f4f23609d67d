//! Append-only destinations for submission rows.
//!
//! The sink is handed to the session already opened; any failure to append
//! is reported as [`Error::SinkWrite`] and never retried.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::submission::{CellValue, SubmissionRow, COLUMNS};

pub trait RowSink {
    /// Append one row, preserving column order.
    fn append_row(&mut self, row: &SubmissionRow) -> Result<()>;
}

/// Rejects rows holding NaN or infinite numbers, which neither format can
/// store faithfully (JSON would write `null`).
fn check_finite(row: &SubmissionRow) -> Result<()> {
    for (column, cell) in COLUMNS.iter().zip(row.cells()) {
        if let CellValue::Number(v) = cell {
            if !v.is_finite() {
                return Err(Error::SinkWrite(format!("{column} is not a finite number ({v})")));
            }
        }
    }
    Ok(())
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::SinkWrite(format!("{}: {}", path.display(), e)))
}

/// One JSON array per line.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RowSink for JsonLinesSink {
    fn append_row(&mut self, row: &SubmissionRow) -> Result<()> {
        check_finite(row)?;
        let mut line = serde_json::to_string(row)?;
        line.push('\n');

        let mut file = open_append(&self.path)?;
        file.write_all(line.as_bytes())
            .map_err(|e| Error::SinkWrite(format!("{}: {}", self.path.display(), e)))?;
        info!(path = %self.path.display(), "appended row");
        Ok(())
    }
}

/// Comma-separated rows under a [`COLUMNS`] header.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RowSink for CsvSink {
    fn append_row(&mut self, row: &SubmissionRow) -> Result<()> {
        check_finite(row)?;
        let mut file = open_append(&self.path)?;
        let needs_header = file
            .metadata()
            .map(|m| m.len() == 0)
            .map_err(|e| Error::SinkWrite(format!("{}: {}", self.path.display(), e)))?;

        let mut out = String::new();
        if needs_header {
            out.push_str(&COLUMNS.join(","));
            out.push('\n');
        }
        let fields: Vec<String> = row.cells().iter().map(csv_field).collect();
        out.push_str(&fields.join(","));
        out.push('\n');

        file.write_all(out.as_bytes())
            .map_err(|e| Error::SinkWrite(format!("{}: {}", self.path.display(), e)))?;
        info!(path = %self.path.display(), "appended row");
        Ok(())
    }
}

fn csv_field(cell: &CellValue) -> String {
    match cell {
        CellValue::Number(v) => v.to_string(),
        CellValue::Text(s) if s.contains([',', '"', '\n', '\r']) => {
            format!("\"{}\"", s.replace('"', "\"\""))
        }
        CellValue::Text(s) => s.clone(),
    }
}

/// Keeps rows in memory. Can be told to fail to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    rows: Vec<SubmissionRow>,
    fail_with: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every append fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            fail_with: Some(message.into()),
        }
    }

    pub fn rows(&self) -> &[SubmissionRow] {
        &self.rows
    }
}

impl RowSink for MemorySink {
    fn append_row(&mut self, row: &SubmissionRow) -> Result<()> {
        if let Some(ref message) = self.fail_with {
            return Err(Error::SinkWrite(message.clone()));
        }
        self.rows.push(row.clone());
        Ok(())
    }
}

impl<S: RowSink + ?Sized> RowSink for Box<S> {
    fn append_row(&mut self, row: &SubmissionRow) -> Result<()> {
        (**self).append_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::FeatureResult;
    use crate::submission::{serialize, SubmissionInput};

    fn row(reason: &str) -> SubmissionRow {
        let input = SubmissionInput {
            id: "12345".into(),
            angle: Some(20.0),
            satisfaction: Some(6.5),
            reason: reason.into(),
        };
        let features = FeatureResult {
            nose_length: 40.5,
            ..Default::default()
        };
        serialize(&input, &features).unwrap()
    }

    #[test]
    fn json_lines_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        let mut sink = JsonLinesSink::new(&path);

        sink.append_row(&row("first")).unwrap();
        sink.append_row(&row("second")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.len(), 18);
        assert_eq!(parsed[0], "12345");
        assert_eq!(parsed[17], "second");
    }

    #[test]
    fn csv_writes_header_once_and_quotes_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let mut sink = CsvSink::new(&path);

        sink.append_row(&row("bright, \"soft\" light")).unwrap();
        sink.append_row(&row("plain")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], COLUMNS.join(","));
        assert!(lines[1].starts_with("12345,20,6.5,"));
        assert!(lines[1].ends_with(",\"bright, \"\"soft\"\" light\""));
        assert!(lines[2].ends_with(",plain"));
    }

    #[test]
    fn non_finite_numbers_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let input = SubmissionInput {
            id: "12345".into(),
            angle: Some(20.0),
            satisfaction: Some(6.5),
            reason: "x".into(),
        };
        let features = FeatureResult {
            nose_width: f32::NAN,
            ..Default::default()
        };
        let bad = serialize(&input, &features).unwrap();

        let csv_path = dir.path().join("rows.csv");
        let err = CsvSink::new(&csv_path).append_row(&bad).unwrap_err();
        assert!(matches!(err, Error::SinkWrite(ref m) if m.starts_with("nose_width")));
        assert!(!csv_path.exists());

        let json_path = dir.path().join("rows.jsonl");
        let err = JsonLinesSink::new(&json_path).append_row(&bad).unwrap_err();
        assert!(matches!(err, Error::SinkWrite(_)));
        assert!(!json_path.exists());
    }

    #[test]
    fn unwritable_path_is_sink_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("rows.jsonl");
        let err = JsonLinesSink::new(&path).append_row(&row("x")).unwrap_err();
        assert!(matches!(err, Error::SinkWrite(_)));
    }

    #[test]
    fn memory_sink_records_or_fails() {
        let mut ok = MemorySink::new();
        ok.append_row(&row("x")).unwrap();
        assert_eq!(ok.rows().len(), 1);

        let mut broken = MemorySink::failing("quota exceeded");
        let err = broken.append_row(&row("x")).unwrap_err();
        assert!(matches!(err, Error::SinkWrite(ref m) if m == "quota exceeded"));
        assert!(broken.rows().is_empty());
    }
}
