use axum::{
    extract::{Extension, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::UserPublic;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::permissions::USERS_CREATE;
use crate::users::NewUser;

use super::authorize;

/// POST /v1/users/create
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(new_user): Json<NewUser>,
) -> ApiResult<UserPublic> {
    let actor = authorize(&state, &auth_user, USERS_CREATE, "Cannot create users.").await?;

    // Emails set by an administrator still need to be verified by their owner
    let user = state.users.create(new_user, &actor, false).await?;
    Ok(ApiResponse::created(user.into()))
}
