//! Error types for the document store

use crate::diagnostic::ValidationReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Patch batch rejected: {0}")]
    InvalidBatch(ValidationReport),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] designer_common::CommonError),
}

impl DocumentError {
    /// The validation report, when this is a rejected batch
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            DocumentError::InvalidBatch(report) => Some(report),
            _ => None,
        }
    }
}

pub type DocumentResult<T> = Result<T, DocumentError>;
