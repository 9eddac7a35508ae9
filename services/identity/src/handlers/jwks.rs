use axum::{Json, extract::State};

use passage_auth_types::JwkSet;

use crate::state::AppState;

/// `GET /.well-known/jwks.json`
pub async fn jwks(State(state): State<AppState>) -> Json<JwkSet> {
    Json(state.keys.jwks().clone())
}
