use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{ChatbotReply, ChatbotRequest};
use super::services;
use crate::{error::AppError, state::AppState};

pub fn chatbot_routes() -> Router<AppState> {
    Router::new().route("/chatbot", post(chatbot))
}

#[instrument(skip(state, payload))]
pub async fn chatbot(
    State(state): State<AppState>,
    payload: Result<Json<ChatbotRequest>, JsonRejection>,
) -> Result<Json<ChatbotReply>, AppError> {
    let Json(body) = payload.map_err(|e| {
        warn!(error = %e, "chatbot body rejected");
        AppError::InvalidRequest(e.body_text())
    })?;
    let message = body.message.unwrap_or_default();
    let reply = services::reply(state.chat.as_ref(), &message).await?;
    info!(model = %state.config.openai.model, "chatbot reply sent");
    Ok(Json(ChatbotReply { reply }))
}
