// Single-purpose update routes. Each one is a canned `UserUpdateRequest`.

use axum::extract::{Extension, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::UserPublic;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::permissions::USERS_MODIFY;
use crate::users::UserUpdateRequest;

use super::authorize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleQuery {
    pub user_id: Uuid,
    pub role_id: i32,
}

async fn apply(
    state: &AppState,
    auth_user: &AuthUser,
    request: UserUpdateRequest,
) -> ApiResult<UserPublic> {
    let actor = authorize(state, auth_user, USERS_MODIFY, "Cannot modify users.").await?;

    let user = state.users.update(&request, &actor).await?;
    Ok(ApiResponse::success(user.into()))
}

/// PATCH /v1/users/update/role?userId=..&roleId=..
pub async fn role_patch(
    State(state): State<AppState>,
    Query(query): Query<RoleQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<UserPublic> {
    let request = UserUpdateRequest {
        role_id: Some(query.role_id),
        ..UserUpdateRequest::for_user(query.user_id)
    };
    apply(&state, &auth_user, request).await
}

/// PATCH /v1/users/update/deactivate?userId=..
pub async fn deactivate_patch(
    State(state): State<AppState>,
    Query(query): Query<TargetQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<UserPublic> {
    let request = UserUpdateRequest {
        deactivated: Some(true),
        ..UserUpdateRequest::for_user(query.user_id)
    };
    apply(&state, &auth_user, request).await
}

/// PATCH /v1/users/update/reactivate?userId=..
pub async fn reactivate_patch(
    State(state): State<AppState>,
    Query(query): Query<TargetQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<UserPublic> {
    let request = UserUpdateRequest {
        deactivated: Some(false),
        ..UserUpdateRequest::for_user(query.user_id)
    };
    apply(&state, &auth_user, request).await
}

/// PATCH /v1/users/update/force?userId=.. - Make the user review their info on next login
pub async fn force_patch(
    State(state): State<AppState>,
    Query(query): Query<TargetQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<UserPublic> {
    let request = UserUpdateRequest {
        force_update_info: Some(true),
        ..UserUpdateRequest::for_user(query.user_id)
    };
    apply(&state, &auth_user, request).await
}
