use axum::{
    extract::{Extension, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::UserPublic;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::permissions::USERS_SELF_UPDATE;
use crate::users::UserUpdateRequest;

use super::authorize;

/// GET /v1/users/me - Profile of the authenticated user
pub async fn me_get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<UserPublic> {
    let actor = state.users.actor(auth_user.user_id).await?;
    let user = state.users.get(actor.user_id).await?;
    Ok(ApiResponse::success(user.into()))
}

/// PATCH /v1/users/me/update - Update the authenticated user's own record
pub async fn me_update(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<UserUpdateRequest>,
) -> ApiResult<UserPublic> {
    let actor =
        authorize(&state, &auth_user, USERS_SELF_UPDATE, "Cannot update own profile.").await?;

    if request.id != actor.user_id {
        tracing::warn!(
            "User {} tried to update {} through the self-update route",
            actor.user_id,
            request.id
        );
        return Err(ApiError::forbidden(
            "Permission denied: Cannot update other users through this route.",
        ));
    }

    let user = state.users.update(&request, &actor).await?;
    Ok(ApiResponse::success(user.into()))
}
