use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::IdentityError;
use crate::gate::{AccessIdentity, RefreshIdentity};
use crate::state::AppState;
use crate::usecase::check_field::{CheckFieldInput, CheckFieldUseCase};
use crate::usecase::login::{LoginInput, LoginUseCase};
use crate::usecase::password::{
    ForgotPasswordInput, ForgotPasswordUseCase, ResetPasswordInput, ResetPasswordUseCase,
};
use crate::usecase::profile::{AttachProfileInput, AttachProfileUseCase};
use crate::usecase::refresh::{RefreshTokensInput, RefreshTokensUseCase};
use crate::usecase::signup::{SignUpInput, SignUpUseCase};

// ── POST /v1/auth/sign-up ────────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub role: u8,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> Result<impl IntoResponse, IdentityError> {
    body.validate()?;

    let usecase = SignUpUseCase {
        accounts: state.account_repo(),
        uow: state.unit_of_work(),
        hasher: state.password_hasher(),
        saga: state.profile_saga(),
        tokens: state.token_service(),
        permissions: state.permissions.clone(),
    };

    let out = usecase
        .execute(SignUpInput {
            email: body.email,
            password: body.password,
            role: body.role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(out)))
}

// ── POST /v1/auth/login ──────────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, IdentityError> {
    // A malformed email is just another failed login.
    body.validate().map_err(|_| IdentityError::UserAuthFailed)?;

    let usecase = LoginUseCase {
        accounts: state.account_repo(),
        profiles: state.profile_repo(),
        hasher: state.password_hasher(),
        tokens: state.token_service(),
        permissions: state.permissions.clone(),
    };

    let out = usecase
        .execute(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok(Json(out))
}

// ── POST /v1/auth/profiles ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AttachProfileRequest {
    pub grant_type: u8,
}

pub async fn attach_profile(
    State(state): State<AppState>,
    AccessIdentity(identity): AccessIdentity,
    Json(body): Json<AttachProfileRequest>,
) -> Result<impl IntoResponse, IdentityError> {
    let usecase = AttachProfileUseCase {
        accounts: state.account_repo(),
        profiles: state.profile_repo(),
        uow: state.unit_of_work(),
        saga: state.profile_saga(),
        tokens: state.token_service(),
        permissions: state.permissions.clone(),
    };

    let out = usecase
        .execute(AttachProfileInput {
            account_id: identity.account_id,
            grant_type: body.grant_type,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(out)))
}

// ── POST /v1/auth/refresh ────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct RefreshRequest {
    #[serde(default)]
    pub profile_id: Option<Uuid>,
}

pub async fn refresh(
    State(state): State<AppState>,
    RefreshIdentity(identity): RefreshIdentity,
    body: Bytes,
) -> Result<impl IntoResponse, IdentityError> {
    // The body is optional; an empty one refreshes against the main profile.
    let body: RefreshRequest = if body.is_empty() {
        RefreshRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| IdentityError::InvalidInput(e.to_string()))?
    };

    let usecase = RefreshTokensUseCase {
        accounts: state.account_repo(),
        profiles: state.profile_repo(),
        tokens: state.token_service(),
        permissions: state.permissions.clone(),
    };

    let out = usecase
        .execute(RefreshTokensInput {
            account_id: identity.account_id,
            profile_id: body.profile_id,
        })
        .await?;

    Ok(Json(out))
}

// ── POST /v1/auth/forgot-password ────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, IdentityError> {
    body.validate()?;

    let usecase = ForgotPasswordUseCase {
        accounts: state.account_repo(),
        store: state.credential_store(),
        publisher: state.event_publisher(),
        code_ttl: state.forgot_code_ttl,
    };

    let out = usecase
        .execute(ForgotPasswordInput { email: body.email })
        .await?;

    Ok(Json(out))
}

// ── POST /v1/auth/reset-password ─────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6))]
    pub code: String,
    pub password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, IdentityError> {
    body.validate()?;

    let usecase = ResetPasswordUseCase {
        accounts: state.account_repo(),
        store: state.credential_store(),
        hasher: state.password_hasher(),
        tokens: state.token_service(),
    };

    let out = usecase
        .execute(ResetPasswordInput {
            email: body.email,
            code: body.code,
            password: body.password,
        })
        .await?;

    Ok(Json(out))
}

// ── GET /v1/auth/check-field ─────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CheckFieldQuery {
    #[validate(email)]
    pub email: String,
}

pub async fn check_field(
    State(state): State<AppState>,
    Query(query): Query<CheckFieldQuery>,
) -> Result<impl IntoResponse, IdentityError> {
    query.validate()?;

    let usecase = CheckFieldUseCase {
        accounts: state.account_repo(),
    };
    let out = usecase
        .execute(CheckFieldInput { email: query.email })
        .await?;

    Ok(Json(out))
}
