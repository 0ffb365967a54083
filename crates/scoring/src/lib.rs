pub mod corpus;
pub mod metrics;
pub mod report;

pub use corpus::*;
pub use metrics::*;
pub use report::*;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("IO error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, ScoringError>;
