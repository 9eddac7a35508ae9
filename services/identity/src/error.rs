use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use passage_core::error::problem_body;
use passage_domain::password::PasswordRule;

/// HTTP-mappable class of an [`IdentityError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    NotFound,
    Conflict,
    Unauthorized,
    Forbidden,
    Internal,
}

impl ErrorClass {
    pub fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Identity service error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Request body failed shape validation before reaching a use case.
    #[error("{0}")]
    InvalidInput(String),

    // ── NotFound ─────────────────────────────────────────────────────────────
    #[error("user not found")]
    UserNotFound,
    #[error("role not found")]
    RoleNotFound,
    #[error("grant type not found")]
    GrantTypeNotFound,
    #[error("profile not found")]
    ProfileNotFound,
    #[error("no profiles attached to this account")]
    ProfilesNotFound,
    #[error("group not found")]
    GroupNotFound,
    #[error("member not found")]
    MemberNotFound,

    // ── Conflict ─────────────────────────────────────────────────────────────
    #[error("an account with this email already exists")]
    UserAlreadyExists,
    #[error("profile does not belong to this account")]
    ProfileDoesNotBelongToUser,
    #[error("reset code is not valid")]
    CodeNotValid,
    #[error("{0}")]
    InvalidPassword(PasswordRule),
    #[error("group already has a permission stack")]
    GroupAlreadyAssigned,
    #[error("account is already a member of this group")]
    AlreadyMember,

    // ── Unauthorized ─────────────────────────────────────────────────────────
    #[error("email or password incorrect")]
    UserAuthFailed,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid access token")]
    InvalidAccessToken,
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    // ── Forbidden ────────────────────────────────────────────────────────────
    #[error("you don't have access to this resource")]
    DontHaveAccessToResource,
    #[error("access to this profile was revoked")]
    AccessRevoked,
    #[error("account state does not allow this profile")]
    FaultedAccount,

    // ── Internal ─────────────────────────────────────────────────────────────
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl IdentityError {
    /// Stable machine-readable id.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid-input",
            Self::UserNotFound => "user-not-found",
            Self::RoleNotFound => "role-not-found",
            Self::GrantTypeNotFound => "grant-type-not-found",
            Self::ProfileNotFound => "profile-not-found",
            Self::ProfilesNotFound => "profiles-not-found",
            Self::GroupNotFound => "group-not-found",
            Self::MemberNotFound => "member-not-found",
            Self::UserAlreadyExists => "user-already-exists",
            Self::ProfileDoesNotBelongToUser => "profile-does-not-belong-to-user",
            Self::CodeNotValid => "code-not-valid",
            Self::InvalidPassword(rule) => rule.id(),
            Self::GroupAlreadyAssigned => "group-already-assigned",
            Self::AlreadyMember => "already-member",
            Self::UserAuthFailed => "user-auth-failed",
            Self::InvalidToken => "invalid-token",
            Self::InvalidAccessToken => "invalid-access-token",
            Self::InvalidRefreshToken => "invalid-refresh-token",
            Self::DontHaveAccessToResource => "dont-have-access-to-resource",
            Self::AccessRevoked => "access-revoked",
            Self::FaultedAccount => "faulted-account",
            Self::Internal(_) => "internal-server",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidInput(_) => ErrorClass::BadRequest,
            Self::UserNotFound
            | Self::RoleNotFound
            | Self::GrantTypeNotFound
            | Self::ProfileNotFound
            | Self::ProfilesNotFound
            | Self::GroupNotFound
            | Self::MemberNotFound => ErrorClass::NotFound,
            Self::UserAlreadyExists
            | Self::ProfileDoesNotBelongToUser
            | Self::CodeNotValid
            | Self::InvalidPassword(_)
            | Self::GroupAlreadyAssigned
            | Self::AlreadyMember => ErrorClass::Conflict,
            Self::UserAuthFailed
            | Self::InvalidToken
            | Self::InvalidAccessToken
            | Self::InvalidRefreshToken => ErrorClass::Unauthorized,
            Self::DontHaveAccessToResource | Self::AccessRevoked | Self::FaultedAccount => {
                ErrorClass::Forbidden
            }
            Self::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Short human title per class; the display string is the detail.
    pub fn title(&self) -> &'static str {
        match self.class() {
            ErrorClass::BadRequest => "Request is malformed",
            ErrorClass::NotFound => "Resource not found",
            ErrorClass::Conflict => "Request conflicts with current state",
            ErrorClass::Unauthorized => "Authentication failed",
            ErrorClass::Forbidden => "Access denied",
            ErrorClass::Internal => "Something went wrong, please try again later",
        }
    }
}

impl From<PasswordRule> for IdentityError {
    fn from(rule: PasswordRule) -> Self {
        Self::InvalidPassword(rule)
    }
}

impl From<validator::ValidationErrors> for IdentityError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::InvalidInput(errors.to_string())
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let status = self.class().status();
        // TraceLayer already records every status; only the hidden cause of a 500 is new.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = self.kind(), "internal error");
        }
        let body = problem_body(self.kind(), self.title(), &self.to_string());
        (status, axum::Json(body)).into_response()
    }
}
