pub mod analyzers;
pub mod demo;
pub mod error;
pub mod loader;
pub mod output;
pub mod subjects;

pub use analyzers::pipeline::{Analysis, analyze};
pub use error::AnalysisError;
pub use subjects::{Subject, SubjectSet};
