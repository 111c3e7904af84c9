use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use annotator::AnnotatorError;
use chess_core::ChessCoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Chess(#[from] ChessCoreError),

    #[error(transparent)]
    Annotator(#[from] AnnotatorError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Chess(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Annotator(AnnotatorError::Chess(e)) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Annotator(e) => {
                tracing::error!("Engine error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Engine error".to_string())
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}
