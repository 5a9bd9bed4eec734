//! CSV loader for exam and report score tables.
//!
//! Header names are compacted (spaces and line breaks removed) before the
//! configured columns are looked up, so `"M D S"` and `"MDS"` match. Scores
//! accept either `.` or `,` as decimal separator; empty cells are missing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::{debug, info};

use crate::analyzers::types::{RawTable, StudentRow, TableSource};
use crate::error::AnalysisError;
use crate::subjects::SubjectSet;

pub const DEFAULT_DELIMITER: u8 = b';';

/// Errors raised while turning a file into a [`RawTable`].
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("column '{column}' not found in {table} table header")]
    MissingColumn { column: String, table: TableSource },

    #[error("row {row}, column '{column}': '{value}' is not a number")]
    MalformedValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row} has an empty student identifier")]
    MissingIdentifier { row: usize },

    #[error(transparent)]
    Table(#[from] AnalysisError),
}

/// Reads a score table from a CSV file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display(), table = %source))]
pub fn load_table(
    path: impl AsRef<Path>,
    source: TableSource,
    subjects: &SubjectSet,
    delimiter: u8,
) -> Result<RawTable, DataLoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DataLoadError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let table = read_table(file, source, subjects, delimiter)?;
    info!(students = table.len(), "Score table loaded");
    Ok(table)
}

/// Reads a score table from any CSV source.
pub fn read_table<R: Read>(
    reader: R,
    source: TableSource,
    subjects: &SubjectSet,
    delimiter: u8,
) -> Result<RawTable, DataLoadError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header = rdr.headers()?.clone();
    let id_index = find_column(&header, subjects.id_column(), source)?;
    let score_columns = subjects
        .iter()
        .map(|s| {
            let name = match source {
                TableSource::Exam => &s.exam_column,
                TableSource::Report => &s.report_column,
            };
            find_column(&header, name, source).map(|i| (i, name.as_str()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(?score_columns, id_index, "Columns resolved");

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let row = line + 2;

        let id = record.get(id_index).unwrap_or("").to_string();
        if id.is_empty() {
            return Err(DataLoadError::MissingIdentifier { row });
        }

        let scores = score_columns
            .iter()
            .map(|&(i, column)| parse_score(record.get(i).unwrap_or(""), row, column))
            .collect::<Result<Vec<_>, _>>()?;

        rows.push(StudentRow::new(id, scores));
    }

    Ok(RawTable::new(source, subjects, rows)?)
}

fn compact(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

fn find_column(header: &StringRecord, name: &str, table: TableSource) -> Result<usize, DataLoadError> {
    let wanted = compact(name);
    header
        .iter()
        .position(|h| compact(h) == wanted)
        .ok_or_else(|| DataLoadError::MissingColumn {
            column: name.to_string(),
            table,
        })
}

/// Parses one score cell. Empty cells are missing values.
pub fn parse_score(cell: &str, row: usize, column: &str) -> Result<Option<f64>, DataLoadError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }

    cell.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| DataLoadError::MalformedValue {
            row,
            column: column.to_string(),
            value: cell.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subjects() -> SubjectSet {
        SubjectSet::from_pairs(&[("MAT", "MDS", "MAT"), ("FEN", "FDS", "FEN")]).unwrap()
    }

    #[test]
    fn test_parse_score_formats() {
        assert_eq!(parse_score("4,5", 2, "MAT").unwrap(), Some(4.5));
        assert_eq!(parse_score("87", 2, "MAT").unwrap(), Some(87.0));
        assert_eq!(parse_score(" ", 2, "MAT").unwrap(), None);
    }

    #[test]
    fn test_parse_score_rejects_text() {
        let err = parse_score("abc", 7, "FEN").unwrap_err();
        assert!(matches!(err, DataLoadError::MalformedValue { row: 7, .. }));
        assert!(parse_score("NaN", 7, "FEN").is_err());
    }

    #[test]
    fn test_read_exam_table_with_spaced_headers() {
        let csv = "RUMUZ;M DS;\"F\nDS\";EXTRA\nOGR001;80;70;x\nOGR002;90;;y\n";
        let table = read_table(csv.as_bytes(), TableSource::Exam, &subjects(), b';').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].scores, vec![Some(80.0), Some(70.0)]);
        assert_eq!(table.rows()[1].scores, vec![Some(90.0), None]);
    }

    #[test]
    fn test_read_report_table_with_comma_decimals() {
        let csv = "RUMUZ;MAT;FEN\nOGR001;4,2;3,9\n";
        let table = read_table(csv.as_bytes(), TableSource::Report, &subjects(), b';').unwrap();
        assert_eq!(table.rows()[0].scores, vec![Some(4.2), Some(3.9)]);
    }

    #[test]
    fn test_missing_column_fails_fast() {
        let csv = "RUMUZ;MDS\nOGR001;80\n";
        let err = read_table(csv.as_bytes(), TableSource::Exam, &subjects(), b';').unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { ref column, .. } if column == "FDS"));
    }

    #[test]
    fn test_duplicate_student_is_rejected() {
        let csv = "RUMUZ;MDS;FDS\nOGR001;80;70\nOGR001;81;71\n";
        let err = read_table(csv.as_bytes(), TableSource::Exam, &subjects(), b';').unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::Table(AnalysisError::DuplicateStudent { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_table("/nonexistent/exam.csv", TableSource::Exam, &subjects(), b';')
            .unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
    }
}
