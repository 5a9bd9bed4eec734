//! Error types raised by the analysis pipeline.

use thiserror::Error;

use crate::analyzers::types::{Model, TableSource};

/// Errors raised by the analysis core.
///
/// Every variant is raised by the stage that detects it and propagated to the
/// caller unchanged. Nothing is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("subject '{subject}' has zero variance in the {table} table")]
    DegenerateDistribution { subject: String, table: TableSource },

    #[error("{model} regression needs at least {required} rows, got {actual}")]
    InsufficientData {
        model: Model,
        required: usize,
        actual: usize,
    },

    #[error("R² is undefined: the target column has zero total sum of squares")]
    UndefinedFitQuality,

    #[error("predictor has zero variance")]
    ZeroPredictorVariance,

    #[error("design matrix is singular (collinear predictors)")]
    SingularDesign,

    #[error("no analysis result for subject '{subject}'")]
    MissingSubjectResult { subject: String },

    #[error("duplicate student '{id}' in the {table} table")]
    DuplicateStudent { id: String, table: TableSource },

    #[error("student '{id}' has {actual} scores, expected {expected}")]
    ScoreCountMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("{input} has {actual} values, expected {expected}")]
    LengthMismatch {
        input: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("tables were built for different subject sets")]
    SubjectMismatch,

    #[error("invalid subject configuration: {0}")]
    InvalidSubjectSet(String),

    #[error("fit failed for subject '{subject}': {source}")]
    SubjectFit {
        subject: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Attaches the subject name to a fit-level error.
    pub fn for_subject(self, subject: &str) -> Self {
        AnalysisError::SubjectFit {
            subject: subject.to_string(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through [`AnalysisError::SubjectFit`].
    pub fn root(&self) -> &AnalysisError {
        match self {
            AnalysisError::SubjectFit { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_unwraps_subject_fit() {
        let err = AnalysisError::UndefinedFitQuality.for_subject("FEN");
        assert_eq!(err.root(), &AnalysisError::UndefinedFitQuality);
        assert!(err.to_string().contains("FEN"));
    }

    #[test]
    fn test_insufficient_data_message() {
        let err = AnalysisError::InsufficientData {
            model: Model::Multi,
            required: 6,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "multi-predictor regression needs at least 6 rows, got 2"
        );
    }

    #[test]
    fn test_length_mismatch_message() {
        let err = AnalysisError::LengthMismatch {
            input: "target",
            expected: 4,
            actual: 3,
        };
        assert_eq!(err.to_string(), "target has 3 values, expected 4");
    }
}
