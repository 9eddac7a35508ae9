use axum::http::StatusCode;

/// `GET /healthz`. Liveness only; dependency checks belong in each service's
/// readiness probe.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
