use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ChatbotRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatbotReply {
    pub reply: String,
}
