use axum::extract::{Extension, Path, State};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::UserPublic;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::permissions::USERS_READ;

use super::authorize;

/// GET /v1/users/all - Every user, oldest first
pub async fn list_get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<UserPublic>> {
    authorize(&state, &auth_user, USERS_READ, "Cannot read users.").await?;

    let users = state.users.list().await?;
    Ok(ApiResponse::success(users.into_iter().map(UserPublic::from).collect()))
}

/// GET /v1/users/:user_id
pub async fn user_get(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<UserPublic> {
    authorize(&state, &auth_user, USERS_READ, "Cannot read users.").await?;

    let user = state.users.get(user_id).await?;
    Ok(ApiResponse::success(user.into()))
}
