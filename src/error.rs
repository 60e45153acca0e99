use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure kinds of the analysis pipeline and the chat relay.
///
/// Every variant renders as `{"error": <Display>}` with status 200; the HTTP
/// caller never sees a failure status code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid image payload: {0}")]
    InvalidPayload(String),

    #[error("{0}")]
    Labeling(String),

    #[error("No food items detected in the image")]
    NoLabels,

    #[error("{0}")]
    Generation(String),

    #[error("Unexpected response format")]
    EmptyReply,

    #[error("Error parsing GPT-4 response")]
    Format { segments: usize },

    #[error("Failed to write analysis log: {0}")]
    Persistence(String),
}

impl AppError {
    /// Short tag used as a structured tracing field.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::InvalidPayload(_) => "decode",
            AppError::Labeling(_) => "upstream_labeling",
            AppError::NoLabels => "no_labels",
            AppError::Generation(_) => "upstream_generation",
            AppError::EmptyReply => "empty_reply",
            AppError::Format { .. } => "format",
            AppError::Persistence(_) => "persistence",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
