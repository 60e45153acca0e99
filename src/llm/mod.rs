pub mod client;
pub mod dto;
pub mod prompts;

pub use client::{ChatClient, OpenAiClient};
pub use dto::ChatMessage;
