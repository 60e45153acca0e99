use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::state::AppState;
use crate::{chat, nutrition};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(nutrition::router())
        .merge(chat::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
        .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod app_tests {
    use super::*;
    use crate::testing::{fake_state, ScriptedChat, StaticLabels};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde_json::{json, Value};
    use std::path::Path;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn post_json(app: Router, uri: &str, body: String) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn png_payload() -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(b"\x89PNG\r\n\x1a\nfake"))
    }

    fn rows(path: &Path) -> Vec<csv::StringRecord> {
        if !path.exists() {
            return Vec::new();
        }
        csv::Reader::from_path(path)
            .unwrap()
            .records()
            .map(Result::unwrap)
            .collect()
    }

    #[tokio::test]
    async fn analyze_returns_six_nutrients_and_logs_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let app = build_app(fake_state(
            Arc::new(StaticLabels::ok(&["pizza", "cheese"])),
            Arc::new(ScriptedChat::replying("20g, 300, 30g, 10g, 5g, 20mg")),
            &path,
        ));

        let body = json!({ "image": png_payload() }).to_string();
        let (status, value) = post_json(app, "/analyze", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            value,
            json!({
                "protein": "20g",
                "calories": "300",
                "carbs": "30g",
                "fat": "10g",
                "sugar": "5g",
                "cholesterol": "20mg"
            })
        );
        let logged = rows(&path);
        assert_eq!(logged.len(), 1);
        assert_eq!(&logged[0][1], "pizza");
    }

    #[tokio::test]
    async fn analyze_surfaces_labeling_error_in_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let app = build_app(fake_state(
            Arc::new(StaticLabels::failing("quota exceeded")),
            Arc::new(ScriptedChat::replying("unused")),
            &path,
        ));

        let body = json!({ "image": png_payload() }).to_string();
        let (status, value) = post_json(app, "/analyze", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, json!({ "error": "quota exceeded" }));
        assert!(rows(&path).is_empty());
    }

    #[tokio::test]
    async fn analyze_reports_malformed_reply() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let app = build_app(fake_state(
            Arc::new(StaticLabels::ok(&["pizza"])),
            Arc::new(ScriptedChat::replying("20g, 300, 30g")),
            &path,
        ));

        let body = json!({ "image": png_payload() }).to_string();
        let (status, value) = post_json(app, "/analyze", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, json!({ "error": "Error parsing GPT-4 response" }));
        assert!(rows(&path).is_empty());
    }

    #[tokio::test]
    async fn analyze_rejects_bad_bodies_in_band() {
        let dir = tempfile::tempdir().unwrap();
        let state = fake_state(
            Arc::new(StaticLabels::ok(&["pizza"])),
            Arc::new(ScriptedChat::replying("unused")),
            &dir.path().join("log.csv"),
        );

        let (status, value) = post_json(build_app(state.clone()), "/analyze", "{}".into()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(value["error"].is_string());

        let body = json!({ "image": "no comma here" }).to_string();
        let (status, value) = post_json(build_app(state), "/analyze", body).await;
        assert_eq!(status, StatusCode::OK);
        assert!(value["error"].as_str().unwrap().starts_with("Invalid image payload"));
    }

    #[tokio::test]
    async fn chatbot_relays_reply() {
        let dir = tempfile::tempdir().unwrap();
        let chat = Arc::new(ScriptedChat::replying(
            "Insulin resistance means cells respond poorly to insulin.",
        ));
        let app = build_app(fake_state(
            Arc::new(StaticLabels::ok(&[])),
            chat.clone(),
            &dir.path().join("log.csv"),
        ));

        let body = json!({ "message": "What is insulin resistance?" }).to_string();
        let (status, value) = post_json(app, "/chatbot", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            value,
            json!({ "reply": "Insulin resistance means cells respond poorly to insulin." })
        );
        let (messages, _) = chat.last_request().unwrap();
        assert_eq!(messages[1].content, "What is insulin resistance?");
    }

    #[tokio::test]
    async fn chatbot_without_message_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(fake_state(
            Arc::new(StaticLabels::ok(&[])),
            Arc::new(ScriptedChat::replying("unused")),
            &dir.path().join("log.csv"),
        ));

        let (status, value) = post_json(app, "/chatbot", "{}".into()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, json!({ "error": "message is required" }));
    }

    #[tokio::test]
    async fn health_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(fake_state(
            Arc::new(StaticLabels::ok(&[])),
            Arc::new(ScriptedChat::replying("unused")),
            &dir.path().join("log.csv"),
        ));

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }
}
