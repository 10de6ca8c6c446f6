//! Cleveland heart-disease file reader.
//!
//! The file has no header and 14 comma-separated positional columns: the 13
//! clinical features in canonical order followed by the severity score.
//! Missing values are written as `?`; rows containing one are dropped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::domain::{ClinicalFeatures, LabeledRecord, FEATURE_COUNT};

/// Features plus target.
pub const COLUMN_COUNT: usize = FEATURE_COUNT + 1;

const MISSING_MARKER: &str = "?";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Dataset not found at {0}")]
    NotFound(PathBuf),

    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed dataset line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Dataset contains no complete rows")]
    Empty,
}

/// Row counts before and after dropping incomplete rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningSummary {
    pub total_rows: usize,
    pub dropped_rows: usize,
}

impl CleaningSummary {
    #[must_use]
    pub fn kept_rows(&self) -> usize {
        self.total_rows - self.dropped_rows
    }
}

#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub records: Vec<LabeledRecord>,
    pub summary: CleaningSummary,
}

/// Parse one line; `Ok(None)` means the row has a missing value.
fn parse_line(line_no: usize, line: &str) -> Result<Option<LabeledRecord>, DatasetError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() > COLUMN_COUNT {
        return Err(DatasetError::Malformed {
            line: line_no,
            reason: format!("expected {COLUMN_COUNT} columns, found {}", fields.len()),
        });
    }
    if fields.len() < COLUMN_COUNT {
        return Ok(None);
    }

    let mut values = [0.0; COLUMN_COUNT];
    for (slot, field) in values.iter_mut().zip(&fields) {
        if field.is_empty() || *field == MISSING_MARKER {
            return Ok(None);
        }
        let value: f64 = field.parse().map_err(|_| DatasetError::Malformed {
            line: line_no,
            reason: format!("non-numeric value {field:?}"),
        })?;
        if !value.is_finite() {
            return Err(DatasetError::Malformed {
                line: line_no,
                reason: format!("non-finite value {field:?}"),
            });
        }
        *slot = value;
    }

    let mut features = [0.0; FEATURE_COUNT];
    features.copy_from_slice(&values[..FEATURE_COUNT]);
    Ok(Some(LabeledRecord {
        features: ClinicalFeatures::from_array(features),
        severity: values[FEATURE_COUNT],
    }))
}

/// Parse and clean records from any reader. Blank lines are ignored.
///
/// # Errors
/// Returns error on read failure, a malformed row, or if no complete row
/// remains.
pub fn parse_records<R: BufRead>(reader: R) -> Result<LoadedDataset, DatasetError> {
    let mut records = Vec::new();
    let mut summary = CleaningSummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        summary.total_rows += 1;
        match parse_line(index + 1, &line)? {
            Some(record) => records.push(record),
            None => summary.dropped_rows += 1,
        }
    }

    if records.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(LoadedDataset { records, summary })
}

/// Read and clean the dataset file at `path`.
///
/// # Errors
/// Returns `DatasetError::NotFound` if the file does not exist, otherwise as
/// `parse_records`.
pub fn read_dataset(path: &Path) -> Result<LoadedDataset, DatasetError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DatasetError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    let loaded = parse_records(BufReader::new(file))?;
    tracing::info!(
        "Loaded {} rows from {:?} ({} dropped for missing values)",
        loaded.summary.kept_rows(),
        path,
        loaded.summary.dropped_rows
    );
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
63.0,1.0,1.0,145.0,233.0,1.0,2.0,150.0,0.0,2.3,3.0,0.0,6.0,0
67.0,1.0,4.0,160.0,286.0,0.0,2.0,108.0,1.0,1.5,2.0,3.0,3.0,2
67.0,1.0,4.0,120.0,229.0,0.0,2.0,129.0,1.0,2.6,2.0,2.0,7.0,1
53.0,0.0,3.0,128.0,216.0,0.0,2.0,115.0,0.0,0.0,1.0,0.0,?,0
38.0,1.0,3.0,138.0,175.0,0.0,0.0,173.0,0.0,0.0,1.0,?,3.0,0
";

    #[test]
    fn test_rows_with_missing_values_are_dropped() {
        let loaded = parse_records(Cursor::new(SAMPLE)).expect("parse");
        assert_eq!(loaded.summary.total_rows, 5);
        assert_eq!(loaded.summary.dropped_rows, 2);
        assert_eq!(loaded.records.len(), 3);
        assert!(loaded.records.len() < loaded.summary.total_rows);
        assert_eq!(loaded.records[0].features.age, 63.0);
        assert_eq!(loaded.records[1].severity, 2.0);
    }

    #[test]
    fn test_short_rows_count_as_missing() {
        let text = "63,1,1,145,233,1,2,150,0,2.3,3,0,6,0\n40,1,2\n\n";
        let loaded = parse_records(Cursor::new(text)).expect("parse");
        assert_eq!(loaded.summary.dropped_rows, 1);
        assert_eq!(loaded.records.len(), 1);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let text = "63,1,1,145,233,1,2,150,0,2.3,3,0,6,0\n63,1,x,145,233,1,2,150,0,2.3,3,0,6,0\n";
        match parse_records(Cursor::new(text)) {
            Err(DatasetError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed error, got {other:?}"),
        }

        let too_wide = "63,1,1,145,233,1,2,150,0,2.3,3,0,6,0,9\n";
        assert!(matches!(
            parse_records(Cursor::new(too_wide)),
            Err(DatasetError::Malformed { .. })
        ));
    }

    #[test]
    fn test_all_rows_incomplete() {
        let text = "?,1,1,145,233,1,2,150,0,2.3,3,0,6,0\n";
        assert!(matches!(parse_records(Cursor::new(text)), Err(DatasetError::Empty)));
    }

    #[test]
    fn test_missing_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("processed.cleveland.data");
        assert!(matches!(read_dataset(&missing), Err(DatasetError::NotFound(_))));
    }

    #[test]
    fn test_read_from_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("processed.cleveland.data");
        std::fs::write(&path, SAMPLE).expect("write");
        let loaded = read_dataset(&path).expect("read");
        assert_eq!(loaded.summary.kept_rows(), 3);
    }
}
