use tracing::{debug, error};

use crate::error::AppError;
use crate::llm::{prompts, ChatClient, ChatMessage};

/// Relays the message under the diabetes-only persona.
///
/// Whether the model actually refuses off-topic questions is up to the model;
/// nothing here checks the question or the answer.
pub async fn reply(client: &dyn ChatClient, message: &str) -> Result<String, AppError> {
    if message.trim().is_empty() {
        return Err(AppError::InvalidRequest("message is required".into()));
    }

    let messages = vec![
        ChatMessage::system(prompts::DIABETES_PERSONA),
        ChatMessage::user(message),
    ];
    match client.complete(messages, prompts::MAX_TOKENS).await {
        Ok(Some(text)) => {
            let text = text.trim().to_string();
            debug!(reply_len = text.len(), "chatbot reply received");
            Ok(text)
        }
        Ok(None) => {
            error!("chatbot: no content in reply");
            Err(AppError::EmptyReply)
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "chatbot: request failed");
            Err(AppError::Generation(format!("{:#}", e)))
        }
    }
}
