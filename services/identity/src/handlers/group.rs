use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::error::IdentityError;
use crate::state::AppState;
use crate::usecase::group::{FetchGroupPermissionsInput, FetchGroupPermissionsUseCase};

/// `GET /v1/auth/groups/{group_id}/members/{member_id}/permissions`
pub async fn member_permissions(
    State(state): State<AppState>,
    Path((group_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, IdentityError> {
    let usecase = FetchGroupPermissionsUseCase {
        members: state.member_chat_repo(),
    };
    let out = usecase
        .execute(FetchGroupPermissionsInput {
            group_id,
            member_id,
        })
        .await?;
    Ok(Json(out))
}
