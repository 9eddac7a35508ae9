use anyhow::Context as _;
use axum::{extract::State, http::StatusCode};
use deadpool_redis::redis;

use passage_core::error::AppError;

use crate::state::AppState;

/// `GET /readyz`: Postgres and Redis both answer.
pub async fn readyz(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state
        .db
        .ping()
        .await
        .context("database ping")
        .map_err(AppError::Unavailable)?;

    let mut conn = state
        .redis
        .get()
        .await
        .context("redis pool")
        .map_err(AppError::Unavailable)?;
    let _pong: String = redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .context("redis ping")
        .map_err(AppError::Unavailable)?;

    Ok(StatusCode::OK)
}
