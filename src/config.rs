use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    pub api_key: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub openai: OpenAiConfig,
    pub vision: VisionConfig,
    pub analysis_log_path: PathBuf,
    pub upstream_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let openai = OpenAiConfig {
            api_key: required("OPENAI_API_KEY")?,
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4".into()),
        };
        let vision = VisionConfig {
            api_key: required("VISION_API_KEY")?,
            endpoint: std::env::var("VISION_ENDPOINT")
                .unwrap_or_else(|_| "https://vision.googleapis.com/v1".into()),
        };
        let analysis_log_path = std::env::var("ANALYSIS_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("food_macronutrients.csv"));
        let upstream_timeout_secs = std::env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);
        Ok(Self {
            openai,
            vision,
            analysis_log_path,
            upstream_timeout_secs,
        })
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|_| anyhow::anyhow!("{} must be set", name))
}
