//! Subject configuration.
//!
//! The ordered subject list is configuration, not code: the order fixes the
//! coefficient order of every multi-predictor fit. It can be loaded from a
//! JSON file:
//! ```json
//! {
//!   "id_column": "RUMUZ",
//!   "subjects": [
//!     { "name": "MATEMATİK", "exam_column": "MDS", "report_column": "MAT" },
//!     { "name": "FEN", "exam_column": "FDS", "report_column": "FEN" }
//!   ]
//! }
//! ```
//! Extra keys (colors, labels) are ignored.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::AnalysisError;

pub const DEFAULT_ID_COLUMN: &str = "RUMUZ";

/// The reference five-subject configuration: (name, exam column, report column).
static DEFAULT_SUBJECTS: &[(&str, &str, &str)] = &[
    ("TÜRKÇE", "TDS", "TURKCE"),
    ("MATEMATİK", "MDS", "MAT"),
    ("FEN", "FDS", "FEN"),
    ("SOSYAL", "SDS", "SOSYAL"),
    ("DİN", "DDS", "DIN"),
];

/// A subject and the column names it uses in each source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub exam_column: String,
    pub report_column: String,
}

/// Ordered, validated list of subjects plus the student identifier column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSubjectSet")]
pub struct SubjectSet {
    id_column: String,
    subjects: Vec<Subject>,
}

#[derive(Deserialize)]
struct RawSubjectSet {
    #[serde(default = "default_id_column")]
    id_column: String,
    subjects: Vec<Subject>,
}

fn default_id_column() -> String {
    DEFAULT_ID_COLUMN.to_string()
}

impl TryFrom<RawSubjectSet> for SubjectSet {
    type Error = AnalysisError;

    fn try_from(raw: RawSubjectSet) -> Result<Self, Self::Error> {
        SubjectSet::new(raw.id_column, raw.subjects)
    }
}

impl SubjectSet {
    /// Validates and builds a subject set. Names must be unique and the list non-empty.
    pub fn new(
        id_column: impl Into<String>,
        subjects: Vec<Subject>,
    ) -> Result<Self, AnalysisError> {
        let id_column = id_column.into();
        if id_column.trim().is_empty() {
            return Err(AnalysisError::InvalidSubjectSet(
                "identifier column name is empty".into(),
            ));
        }
        if subjects.is_empty() {
            return Err(AnalysisError::InvalidSubjectSet("no subjects configured".into()));
        }

        let mut seen = HashSet::new();
        for s in &subjects {
            if s.name.is_empty() || s.exam_column.is_empty() || s.report_column.is_empty() {
                return Err(AnalysisError::InvalidSubjectSet(format!(
                    "subject '{}' has an empty name or column",
                    s.name
                )));
            }
            if !seen.insert(s.name.as_str()) {
                return Err(AnalysisError::InvalidSubjectSet(format!(
                    "subject '{}' is listed twice",
                    s.name
                )));
            }
        }

        Ok(Self {
            id_column,
            subjects,
        })
    }

    /// Builds a set from `(name, exam_column, report_column)` triples with the default id column.
    pub fn from_pairs(pairs: &[(&str, &str, &str)]) -> Result<Self, AnalysisError> {
        let subjects = pairs
            .iter()
            .map(|(name, exam, report)| Subject {
                name: name.to_string(),
                exam_column: exam.to_string(),
                report_column: report.to_string(),
            })
            .collect();
        Self::new(DEFAULT_ID_COLUMN, subjects)
    }

    /// Loads the configuration from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read subject config '{path}'"))?;
        let set: SubjectSet = serde_json::from_str(&content)
            .with_context(|| format!("invalid subject config '{path}'"))?;
        Ok(set)
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn names(&self) -> Vec<String> {
        self.subjects.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.iter()
    }
}

impl Default for SubjectSet {
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            subjects: DEFAULT_SUBJECTS
                .iter()
                .map(|(name, exam, report)| Subject {
                    name: name.to_string(),
                    exam_column: exam.to_string(),
                    report_column: report.to_string(),
                })
                .collect(),
        }
    }
}
