//! Exam vs report-card regression analysis.
//!
//! Each stage takes the previous stage's output by reference and returns a
//! new value: raw tables are normalized to T-scores, joined on student
//! identifier, fitted with one simple and one multi-predictor model per
//! subject, and summarized into a comparison report.

pub mod align;
pub mod compare;
pub mod multi;
pub mod normalize;
pub mod pipeline;
pub mod simple;
pub mod types;
pub mod utility;
