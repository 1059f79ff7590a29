use axum::body::Body;
use axum::http::{HeaderValue, header};
use axum::response::Response;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::content::NormalizedMessage;
use crate::error::RelayError;
use crate::settings::RelaySettings;

pub const CHAT_ID_HEADER: &str = "X-Chat-Id";

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPayload {
    pub messages: Vec<NormalizedMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionPayload<'a> {
    pub chat_id: &'a str,
    pub message: NormalizedMessage,
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    history_url: Url,
    session_url: Url,
}

impl BackendClient {
    pub fn new(settings: &RelaySettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            history_url: settings.history_endpoint(),
            session_url: settings.session_endpoint(),
        }
    }

    pub async fn post_history(&self, payload: &HistoryPayload) -> Result<reqwest::Response, RelayError> {
        debug!(url = %self.history_url, messages = payload.messages.len(), "posting history");
        let resp = self
            .http
            .post(self.history_url.clone())
            .json(payload)
            .send()
            .await?;
        Ok(resp)
    }

    pub async fn post_message(&self, payload: &SessionPayload<'_>) -> Result<reqwest::Response, RelayError> {
        debug!(url = %self.session_url, chat_id = payload.chat_id, "posting message");
        let resp = self
            .http
            .post(self.session_url.clone())
            .header(CHAT_ID_HEADER, payload.chat_id)
            .json(payload)
            .send()
            .await?;
        Ok(resp)
    }
}

/// Pipes a successful body through unbuffered as an event stream.
pub async fn forward(resp: reqwest::Response) -> Result<Response, RelayError> {
    let status = resp.status();
    if !status.is_success() {
        let detail = resp.text().await.unwrap_or_else(|e| {
            warn!(error = %e, "could not read backend error body");
            String::new()
        });
        return Err(RelayError::Upstream { status, detail });
    }

    let mut response = Response::new(Body::from_stream(resp.bytes_stream()));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    Ok(response)
}
