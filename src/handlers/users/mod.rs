// handlers/users/mod.rs - User management endpoints (JWT required)
//
// Every mutation of an existing user goes through `UserService::update`, so
// the field-level permission checks and the top admin invariants apply to
// the convenience routes as well.

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::users::ActorContext;

pub mod actions; // PATCH /v1/users/update/{role,deactivate,reactivate,force}
pub mod create; // POST /v1/users/create
pub mod events; // GET /v1/users/events (SSE)
pub mod me; // GET /v1/users/me, PATCH /v1/users/me/update
pub mod read; // GET /v1/users/all, GET /v1/users/:user_id
pub mod update; // PATCH + DELETE /v1/users/update

pub use actions::{deactivate_patch, force_patch, reactivate_patch, role_patch};
pub use create::create_post;
pub use events::events_get;
pub use me::{me_get, me_update};
pub use read::{list_get, user_get};
pub use update::{remove_delete, update_patch};

/// Route-level permission gate
pub(crate) fn require(
    state: &AppState,
    actor: &ActorContext,
    permission: &str,
    message: &str,
) -> Result<(), ApiError> {
    if state.users.permissions().is_allowed(permission, actor) {
        Ok(())
    } else {
        tracing::warn!(
            "User {} lacks {} (role {})",
            actor.user_id,
            permission,
            actor.role_id
        );
        Err(ApiError::forbidden(format!("Permission denied: {}", message)))
    }
}

/// Resolve the caller and check a route-level permission in one go
pub(crate) async fn authorize(
    state: &AppState,
    auth_user: &AuthUser,
    permission: &str,
    message: &str,
) -> Result<ActorContext, ApiError> {
    let actor = state.users.actor(auth_user.user_id).await?;
    require(state, &actor, permission, message)?;
    Ok(actor)
}
