//! Annotator error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotatorError {
    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Engine returned no analysis for {0}")]
    EmptyAnalysis(String),

    #[error("Chess error: {0}")]
    Chess(#[from] chess_core::ChessCoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
