use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use super::dto::{AnalyzeRequest, NutrientRecord};
use super::services;
use crate::{error::AppError, state::AppState};

pub fn analyze_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze_image))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

/// POST /analyze { image: "data:image/png;base64,..." }
#[instrument(skip(state, payload))]
pub async fn analyze_image(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<NutrientRecord>, AppError> {
    let Json(body) = payload.map_err(|e| {
        warn!(error = %e, "analyze body rejected");
        AppError::InvalidRequest(e.body_text())
    })?;
    let record = services::analyze(&state, &body.image).await?;
    Ok(Json(record))
}
