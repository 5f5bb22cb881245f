// handlers/roles.rs - GET /v1/roles

use axum::extract::{Extension, State};

use crate::app::AppState;
use crate::database::models::Role;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::permissions::ROLES_READ;

use super::users::require;

pub async fn list_get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<Role>> {
    let actor = state.users.actor(auth_user.user_id).await?;
    require(&state, &actor, ROLES_READ, "Cannot read roles.")?;

    let roles = state.users.list_roles().await?;
    Ok(ApiResponse::success(roles))
}
