use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use passage_core::health::healthz;
use passage_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    auth::{attach_profile, check_field, forgot_password, login, refresh, reset_password, sign_up},
    group::member_permissions,
    health::readyz,
    jwks::jwks,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Published keys
        .route("/.well-known/jwks.json", get(jwks))
        // Credentials
        .route("/v1/auth/sign-up", post(sign_up))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/profiles", post(attach_profile))
        .route("/v1/auth/refresh", post(refresh))
        .route("/v1/auth/forgot-password", post(forgot_password))
        .route("/v1/auth/reset-password", post(reset_password))
        .route("/v1/auth/check-field", get(check_field))
        // Groups
        .route(
            "/v1/auth/groups/{group_id}/members/{member_id}/permissions",
            get(member_permissions),
        )
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
