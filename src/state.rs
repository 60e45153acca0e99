use crate::analysis_log::AnalysisLog;
use crate::config::AppConfig;
use crate::llm::{ChatClient, OpenAiClient};
use crate::vision::{GoogleVisionClient, LabelClient};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub labels: Arc<dyn LabelClient>,
    pub chat: Arc<dyn ChatClient>,
    pub analysis_log: AnalysisLog,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        // one connection pool for both upstream services
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .context("build upstream http client")?;

        let labels =
            Arc::new(GoogleVisionClient::new(http.clone(), &config.vision)) as Arc<dyn LabelClient>;
        let chat = Arc::new(OpenAiClient::new(http, &config.openai)) as Arc<dyn ChatClient>;
        let analysis_log = AnalysisLog::spawn(config.analysis_log_path.clone())?;

        Ok(Self::from_parts(config, labels, chat, analysis_log))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        labels: Arc<dyn LabelClient>,
        chat: Arc<dyn ChatClient>,
        analysis_log: AnalysisLog,
    ) -> Self {
        Self {
            config,
            labels,
            chat,
            analysis_log,
        }
    }
}
