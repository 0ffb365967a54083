//! Smell-detection submissions
//!
//! Validates raw rater output against the checklist, labels every claim
//! against ground truth and persists the labeled result exactly once.

pub mod schema;
pub mod validate;
pub mod label;
pub mod store;
pub mod pipeline;

pub use schema::*;
pub use validate::{parse_submission, validate_submission, Submission, CLAIM_LIST_FIELD};
pub use label::{label_claims, GroundTruthDir, GroundTruthStore, InMemoryGroundTruth};
pub use store::ResultStore;
pub use pipeline::SubmissionPipeline;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmellError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Coverage error: {0}")]
    Coverage(String),

    #[error("Conflict: output file '{}' already exists", .0.display())]
    Conflict(PathBuf),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Ser(String),
}

pub type Result<T> = std::result::Result<T, SmellError>;
