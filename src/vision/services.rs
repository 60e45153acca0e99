use bytes::Bytes;
use tracing::{debug, error};

use super::client::LabelClient;
use crate::error::AppError;

/// Runs label detection once; any failure becomes `AppError::Labeling`.
pub async fn extract_labels(client: &dyn LabelClient, image: Bytes) -> Result<Vec<String>, AppError> {
    let size = image.len();
    match client.detect_labels(image).await {
        Ok(labels) => {
            debug!(size, count = labels.len(), "label extraction finished");
            Ok(labels)
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), size, "label extraction failed");
            Err(AppError::Labeling(format!("{:#}", e)))
        }
    }
}
