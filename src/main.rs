mod analysis_log;
mod app;
mod chat;
mod config;
mod error;
mod llm;
mod nutrition;
mod state;
#[cfg(test)]
mod testing;
mod vision;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "mealscan=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init()?;
    tracing::info!(
        model = %app_state.config.openai.model,
        log_path = %app_state.config.analysis_log_path.display(),
        "upstream clients ready"
    );

    app::serve(app::build_app(app_state)).await
}
