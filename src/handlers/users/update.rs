use axum::{
    extract::{Extension, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::UserPublic;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::permissions::USERS_MODIFY;
use crate::users::{UserFieldRemoval, UserUpdateRequest};

use super::authorize;

/// PATCH /v1/users/update - Partial update of any user
pub async fn update_patch(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<UserUpdateRequest>,
) -> ApiResult<UserPublic> {
    let actor = authorize(&state, &auth_user, USERS_MODIFY, "Cannot modify users.").await?;

    let user = state.users.update(&request, &actor).await?;
    Ok(ApiResponse::success(user.into()))
}

/// DELETE /v1/users/update - Clear the flagged fields of a user
pub async fn remove_delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(removal): Json<UserFieldRemoval>,
) -> ApiResult<UserPublic> {
    authorize(&state, &auth_user, USERS_MODIFY, "Cannot modify users.").await?;

    let user = state.users.remove_fields(&removal).await?;
    Ok(ApiResponse::success(user.into()))
}
