use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};

use super::dto::{NutrientRecord, NUTRIENT_KEYS};
use crate::error::AppError;
use crate::llm::{prompts, ChatClient, ChatMessage};
use crate::state::AppState;
use crate::vision::services::extract_labels;

#[derive(Debug)]
pub struct DecodedImage {
    pub mime: Option<String>,
    pub bytes: Bytes,
}

/// Splits a data URI on its first comma and decodes the base64 remainder.
pub fn decode_payload(payload: &str) -> Result<DecodedImage, AppError> {
    lazy_static! {
        static ref DATA_URI_HEADER: Regex =
            Regex::new(r"^data:(?P<mime>[\w.+-]+/[\w.+-]+)?(?:;[^;,]*)*;base64$").unwrap();
    }

    let (header, data) = payload
        .split_once(',')
        .ok_or_else(|| AppError::InvalidPayload("missing data URI separator".into()))?;
    let caps = DATA_URI_HEADER
        .captures(header.trim())
        .ok_or_else(|| AppError::InvalidPayload("expected a base64 data URI header".into()))?;
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| AppError::InvalidPayload(e.to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::InvalidPayload("image data is empty".into()));
    }

    Ok(DecodedImage {
        mime: caps.name("mime").map(|m| m.as_str().to_string()),
        bytes: Bytes::from(bytes),
    })
}

/// Asks the model for the six nutrient estimates of the given food items.
pub async fn estimate(client: &dyn ChatClient, labels: &[String]) -> Result<NutrientRecord, AppError> {
    let items = labels.join(", ");
    debug!(%items, "requesting nutrient estimate");
    let messages = vec![
        ChatMessage::system(prompts::NUTRIENT_PERSONA),
        ChatMessage::user(prompts::nutrient_request(&items)),
    ];

    let reply = match client.complete(messages, prompts::MAX_TOKENS).await {
        Ok(Some(text)) => text,
        Ok(None) => {
            error!("nutrient estimate: unexpected response format, no content");
            return Err(AppError::EmptyReply);
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "nutrient estimate: request failed");
            return Err(AppError::Generation(format!("{:#}", e)));
        }
    };
    debug!(%reply, "nutrient estimate reply");

    parse_reply(&reply).map_err(|e| {
        error!(error = %e, kind = e.kind(), %reply, "nutrient estimate: parsing failed");
        e
    })
}

/// Exactly six comma-separated, non-empty values in `NUTRIENT_KEYS` order.
pub fn parse_reply(reply: &str) -> Result<NutrientRecord, AppError> {
    let values: Vec<&str> = reply.trim().split(',').map(str::trim).collect();
    if values.len() != NUTRIENT_KEYS.len() || values.iter().any(|v| v.is_empty()) {
        return Err(AppError::Format {
            segments: values.len(),
        });
    }
    Ok(NutrientRecord {
        protein: values[0].to_string(),
        calories: values[1].to_string(),
        carbs: values[2].to_string(),
        fat: values[3].to_string(),
        sugar: values[4].to_string(),
        cholesterol: values[5].to_string(),
    })
}

/// Decode → labels → estimate → log. Only a fully successful analysis is logged.
pub async fn analyze(st: &AppState, payload: &str) -> Result<NutrientRecord, AppError> {
    let image = decode_payload(payload).map_err(|e| {
        warn!(error = %e, "image payload rejected");
        e
    })?;
    debug!(
        mime = image.mime.as_deref().unwrap_or("unspecified"),
        size = image.bytes.len(),
        "image decoded"
    );

    let labels = extract_labels(st.labels.as_ref(), image.bytes).await?;
    let Some(food_name) = labels.first().cloned() else {
        warn!("no labels detected, skipping nutrient estimate");
        return Err(AppError::NoLabels);
    };

    let record = estimate(st.chat.as_ref(), &labels).await?;

    if let Err(e) = st.analysis_log.append(&food_name, &record).await {
        error!(error = %e, kind = e.kind(), %food_name, "analysis log append failed");
    }

    info!(%food_name, labels = labels.len(), "analysis completed");
    Ok(record)
}
