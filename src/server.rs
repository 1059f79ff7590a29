use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc};
use tracing::{debug, info};

use crate::backend::{self, BackendClient, HistoryPayload, SessionPayload};
use crate::content::Message;
use crate::error::RelayError;
use crate::session::ChatSession;

const PREVIEW_CHARS: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub backend: BackendClient,
    pub chat: Arc<ChatSession>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(backend: BackendClient, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            backend,
            chat: Arc::new(ChatSession::new()),
            metrics,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Value>,
}

fn parse_request(body: &Bytes) -> Result<ChatRequest, RelayError> {
    debug!(body = %String::from_utf8_lossy(body), "received chat request");
    Ok(serde_json::from_slice(body)?)
}

fn finish(route: &'static str, result: Result<Response, RelayError>) -> Response {
    let outcome = match &result {
        Ok(_) => "streamed",
        Err(e) => e.outcome(),
    };
    metrics::counter!("chat_relay_requests_total", "route" => route, "outcome" => outcome)
        .increment(1);
    result.into_response()
}

async fn relay_history(state: &AppState, body: &Bytes) -> Result<Response, RelayError> {
    let req = parse_request(body)?;
    let received = req.messages.len();
    let messages: Vec<_> = req
        .messages
        .into_iter()
        .filter_map(Message::from_value)
        .map(|m| m.normalize())
        .filter(|m| !m.content.trim().is_empty())
        .collect();
    info!(received, forwarded = messages.len(), "relaying chat history");

    let resp = state.backend.post_history(&HistoryPayload { messages }).await?;
    backend::forward(resp).await
}

async fn history_chat(State(state): State<AppState>, body: Bytes) -> Response {
    finish("history", relay_history(&state, &body).await)
}

async fn relay_latest(state: &AppState, body: &Bytes) -> Result<Response, RelayError> {
    let req = parse_request(body)?;
    let last = req
        .messages
        .into_iter()
        .next_back()
        .and_then(Message::from_value)
        .ok_or(RelayError::NoMessage)?;
    let chat_id = state.chat.id();
    let message = last.normalize();

    let mut preview: String = message.content.chars().take(PREVIEW_CHARS).collect();
    if message.content.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    info!(
        chat_id,
        message_id = ?last.id,
        role = ?message.role,
        content = %preview,
        "relaying latest message"
    );

    let resp = state
        .backend
        .post_message(&SessionPayload { chat_id, message })
        .await?;
    backend::forward(resp).await
}

async fn session_chat(State(state): State<AppState>, body: Bytes) -> Response {
    finish("session", relay_latest(&state, &body).await)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub message: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "chat-relay",
        version: env!("CARGO_PKG_VERSION"),
        message: "chat relay is running",
    })
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(history_chat))
        .route("/agent/chat", post(session_chat))
        .route("/api/health", get(health))
        .route("/metrics", get(render_metrics))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "chat relay listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
