use thiserror::Error;

/// Failure to read or decode a JSON input file
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
