use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const NO_MESSAGE: &str = "no message present";
pub const BACKEND_FAILED: &str = "backend request failed";
pub const INTERNAL: &str = "internal server error";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("no message present")]
    NoMessage,

    #[error("backend returned {status}")]
    Upstream { status: StatusCode, detail: String },

    /// Logged in full, reported to the caller as a bare 500.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::NoMessage => StatusCode::BAD_REQUEST,
            RelayError::Upstream { status, .. } => *status,
            RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::NoMessage => "bad_request",
            RelayError::Upstream { .. } => "upstream_error",
            RelayError::Internal(_) => "internal_error",
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::Internal(anyhow::Error::new(e).context("invalid request body"))
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::Internal(anyhow::Error::new(e).context("backend request failed"))
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            RelayError::NoMessage => json!({ "error": NO_MESSAGE }),
            RelayError::Upstream { detail, .. } => {
                json!({ "error": BACKEND_FAILED, "detail": detail })
            }
            RelayError::Internal(e) => {
                error!(error = ?e, "chat relay error");
                json!({ "error": INTERNAL })
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_of(err: RelayError) -> (StatusCode, Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn statuses_follow_variant() {
        assert_eq!(RelayError::NoMessage.status(), StatusCode::BAD_REQUEST);
        let upstream = RelayError::Upstream {
            status: StatusCode::SERVICE_UNAVAILABLE,
            detail: "oops".into(),
        };
        assert_eq!(upstream.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(upstream.outcome(), "upstream_error");

        let parse = serde_json::from_str::<Value>("{").unwrap_err();
        let internal = RelayError::from(parse);
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.outcome(), "internal_error");
    }

    #[tokio::test]
    async fn bodies_use_the_shared_messages() {
        let (status, body) = body_of(RelayError::NoMessage).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": NO_MESSAGE }));

        let (status, body) = body_of(RelayError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            detail: String::new(),
        })
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({ "error": BACKEND_FAILED, "detail": "" }));

        let (status, body) = body_of(RelayError::Internal(anyhow::anyhow!("secret path /etc"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": INTERNAL }));
    }
}
