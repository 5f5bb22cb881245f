//! Roles and the permissions they carry.
//!
//! Permission names follow `<domain>:<scope>:<action>`. User-targeting actions
//! come in two scopes: `self` when the actor is the target and `global`
//! otherwise (see [`user_permission`]).

use crate::database::models::Role;
use crate::users::ActorContext;

/// Role id of the Superintendent, the top admin role
pub const TOP_ADMIN_ROLE_ID: i32 = 1;

pub const DEFAULT_ROLES: [(i32, &str); 4] = [
    (1, "Superintendent"),
    (2, "Administrator"),
    (3, "Principal"),
    (4, "Canteen Manager"),
];

pub fn default_roles() -> Vec<Role> {
    DEFAULT_ROLES
        .iter()
        .map(|(id, description)| Role {
            id: *id,
            description: description.to_string(),
            modifiable: false,
        })
        .collect()
}

// Route-level permissions
pub const USERS_CREATE: &str = "users:global:create";
pub const USERS_READ: &str = "users:global:read";
pub const USERS_MODIFY: &str = "users:global:modify";
pub const USERS_SELF_UPDATE: &str = "users:global:selfupdate";
pub const ROLES_READ: &str = "roles:global:read";

/// Build the scoped permission name for acting on a user.
pub fn user_permission(updating_self: bool, action: &str) -> String {
    let scope = if updating_self { "self" } else { "global" };
    format!("users:{}:{}", scope, action)
}

/// Capability check injected wherever an action needs authorization
pub trait PermissionChecker: Send + Sync {
    fn is_allowed(&self, permission: &str, actor: &ActorContext) -> bool;
}

const SELF_PROFILE: &[&str] = &[
    USERS_SELF_UPDATE,
    "users:self:modify:username",
    "users:self:modify:email",
    "users:self:modify:name",
    "users:self:modify:position",
    "users:self:modify:password",
    "users:self:forceupdate",
];

const GLOBAL_USER_MANAGEMENT: &[&str] = &[
    USERS_CREATE,
    USERS_READ,
    USERS_MODIFY,
    ROLES_READ,
    "users:global:modify:username",
    "users:global:modify:email",
    "users:global:modify:name",
    "users:global:modify:position",
    "users:global:modify:password",
    "users:global:modify:school",
    "users:global:modify:role",
    "users:global:deactivate",
    "users:global:forceupdate",
];

const SELF_ADMINISTRATION: &[&str] = &[
    "users:self:modify:school",
    "users:self:modify:role",
    "users:self:deactivate",
];

/// Static role -> permission table
#[derive(Debug, Default, Clone, Copy)]
pub struct RolePermissions;

impl RolePermissions {
    pub fn permissions_for(role_id: i32) -> Vec<&'static str> {
        match role_id {
            // Superintendent
            1 => [SELF_PROFILE, GLOBAL_USER_MANAGEMENT, SELF_ADMINISTRATION].concat(),
            // Administrator
            2 => [SELF_PROFILE, GLOBAL_USER_MANAGEMENT, &["users:self:modify:school"][..]].concat(),
            // Principal, Canteen Manager
            3 | 4 => SELF_PROFILE.to_vec(),
            _ => Vec::new(),
        }
    }
}

impl PermissionChecker for RolePermissions {
    fn is_allowed(&self, permission: &str, actor: &ActorContext) -> bool {
        let allowed = Self::permissions_for(actor.role_id).contains(&permission);
        if !allowed {
            tracing::debug!(
                "Permission {} denied for user {} (role {})",
                permission,
                actor.user_id,
                actor.role_id
            );
        }
        allowed
    }
}
