use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors raised by shared handlers that sit outside any service's own error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("service unavailable")]
    Unavailable(#[source] anyhow::Error),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "service-unavailable",
            Self::Internal(_) => "internal-server",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `{kind, title, detail}` body used by every error response.
pub fn problem_body(kind: &str, title: &str, detail: &str) -> serde_json::Value {
    serde_json::json!({
        "kind": kind,
        "title": title,
        "detail": detail,
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(e) => tracing::error!(error = ?e, kind = self.kind(), "internal error"),
            Self::Unavailable(e) => {
                tracing::warn!(error = ?e, kind = self.kind(), "dependency unavailable")
            }
        }
        let title = status.canonical_reason().unwrap_or("error");
        let body = problem_body(self.kind(), title, &self.to_string());
        (status, axum::Json(body)).into_response()
    }
}
