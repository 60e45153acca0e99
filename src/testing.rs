//! Test doubles for the upstream services and a state builder around them.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{async_trait, Router};
use bytes::Bytes;

use crate::analysis_log::AnalysisLog;
use crate::config::{AppConfig, OpenAiConfig, VisionConfig};
use crate::llm::{ChatClient, ChatMessage};
use crate::state::AppState;
use crate::vision::LabelClient;

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub struct StaticLabels {
    result: Result<Vec<String>, String>,
    calls: AtomicUsize,
}

impl StaticLabels {
    pub fn ok(labels: &[&str]) -> Self {
        Self {
            result: Ok(labels.iter().map(|l| l.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LabelClient for StaticLabels {
    async fn detect_labels(&self, _image: Bytes) -> anyhow::Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(|m| anyhow::anyhow!(m))
    }
}

pub struct ScriptedChat {
    reply: Result<Option<String>, String>,
    requests: Mutex<Vec<(Vec<ChatMessage>, u32)>>,
}

impl ScriptedChat {
    fn new(reply: Result<Option<String>, String>) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(Ok(Some(text.to_string())))
    }

    pub fn empty() -> Self {
        Self::new(Ok(None))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(Err(message.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<(Vec<ChatMessage>, u32)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatClient for ScriptedChat {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
    ) -> anyhow::Result<Option<String>> {
        self.requests.lock().unwrap().push((messages, max_tokens));
        self.reply.clone().map_err(|m| anyhow::anyhow!(m))
    }
}

pub fn test_config(log_path: &Path) -> AppConfig {
    AppConfig {
        openai: OpenAiConfig {
            api_key: "test".into(),
            base_url: "http://127.0.0.1:9".into(),
            model: "gpt-4".into(),
        },
        vision: VisionConfig {
            api_key: "test".into(),
            endpoint: "http://127.0.0.1:9".into(),
        },
        analysis_log_path: log_path.to_path_buf(),
        upstream_timeout_secs: 5,
    }
}

pub fn fake_state(
    labels: Arc<dyn LabelClient>,
    chat: Arc<dyn ChatClient>,
    log_path: &Path,
) -> AppState {
    let config = Arc::new(test_config(log_path));
    let analysis_log = AnalysisLog::spawn(config.analysis_log_path.clone()).unwrap();
    AppState::from_parts(config, labels, chat, analysis_log)
}

impl AppState {
    pub fn with_chat(&self, chat: Arc<dyn ChatClient>) -> Self {
        Self {
            chat,
            ..self.clone()
        }
    }
}
