//! Permission-gated application of a partial user update.
//!
//! Fields are processed in a fixed order (username, email, names, position,
//! password, school, role, deactivation, tutorials, force-update). Each step
//! works on the same copy of the record, so later steps see earlier changes.
//! Nothing is persisted here: the caller commits the returned record only when
//! every step passed.

use chrono::Utc;
use tracing::{debug, warn};

use crate::database::models::UserRecord;
use crate::permissions::{user_permission, PermissionChecker, TOP_ADMIN_ROLE_ID};
use crate::users::error::UserError;
use crate::users::ports::{PasswordHasher, RoleRepository, SchoolRepository, UserRepository};
use crate::users::request::{ActorContext, EffectFlags, UserUpdateRequest};
use crate::users::validation::{is_valid_username, validate_password, MAX_FINISHED_TUTORIALS};

/// Result of a successful `apply_update`
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub user: UserRecord,
    pub effects: EffectFlags,
}

pub struct UserUpdateAuthorizer<'a> {
    pub users: &'a dyn UserRepository,
    pub schools: &'a dyn SchoolRepository,
    pub roles: &'a dyn RoleRepository,
    pub permissions: &'a dyn PermissionChecker,
    pub hasher: &'a dyn PasswordHasher,
}

// Empty strings count as "not provided"
fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl<'a> UserUpdateAuthorizer<'a> {
    pub async fn apply_update(
        &self,
        current: UserRecord,
        request: &UserUpdateRequest,
        actor: &ActorContext,
    ) -> Result<UpdateOutcome, UserError> {
        let mut user = current;
        let mut effects = EffectFlags::default();
        let updating_self = user.id == actor.user_id;

        if let Some(username) = provided(&request.username) {
            if username != user.username {
                self.require(
                    actor,
                    updating_self,
                    "modify:username",
                    "username",
                    "Cannot modify username.",
                )?;

                if !is_valid_username(username) {
                    warn!("Failed to update user: {} (invalid username {:?})", user.id, username);
                    return Err(UserError::validation("username", "Invalid username"));
                }

                if self.users.find_by_username(username).await?.is_some() {
                    warn!("Failed to update user: {} (username already exists)", user.id);
                    return Err(UserError::conflict("username", "Username already exists"));
                }

                debug!("Updating username for user: {}", user.id);
                user.username = username.to_string();
            }
        }

        if let Some(email) = provided(&request.email) {
            self.require(
                actor,
                updating_self,
                "modify:email",
                "email",
                "Cannot modify email.",
            )?;

            if user.email.as_deref() == Some(email) {
                debug!("Email for user {} is already set to {}", user.id, email);
            } else {
                debug!("Updating email for user: {}", user.id);
                user.email = Some(email.to_string());
                user.email_verified = false;
                effects.email_changed = true;
            }
        }

        let names = [
            (&request.name_first, &mut user.name_first, "nameFirst"),
            (&request.name_middle, &mut user.name_middle, "nameMiddle"),
            (&request.name_last, &mut user.name_last, "nameLast"),
        ];
        for (requested, slot, field) in names {
            if let Some(value) = provided(requested) {
                self.require(
                    actor,
                    updating_self,
                    "modify:name",
                    field,
                    "Cannot modify name.",
                )?;
                debug!("Updating {} for user: {}", field, user.id);
                *slot = Some(value.to_string());
            }
        }

        if let Some(position) = provided(&request.position) {
            self.require(
                actor,
                updating_self,
                "modify:position",
                "position",
                "Cannot modify position.",
            )?;
            debug!("Updating position for user: {}", user.id);
            user.position = Some(position.to_string());
        }

        if let Some(password) = provided(&request.password) {
            self.require(
                actor,
                updating_self,
                "modify:password",
                "password",
                "Cannot modify password.",
            )?;

            if let Err(rule) = validate_password(password) {
                warn!("Failed to update user: {} ({})", user.id, rule);
                return Err(UserError::validation(
                    "password",
                    format!("Invalid password format ({})", rule),
                ));
            }

            debug!("Updating password for user: {}", user.id);
            user.password = self.hasher.hash(password)?;
        }

        if let Some(school_id) = request.school_id {
            if school_id != user.school_id {
                self.require(
                    actor,
                    updating_self,
                    "modify:school",
                    "schoolId",
                    "Cannot modify school.",
                )?;

                if let Some(id) = school_id {
                    if !self.schools.exists(id).await? {
                        warn!("Failed to update user: {} (school {} not found)", user.id, id);
                        return Err(UserError::not_found("School"));
                    }
                }

                debug!(
                    "User {} school assignment changing from {:?} to {:?}",
                    user.id, user.school_id, school_id
                );
                user.school_id = school_id;
                effects.school_changed = true;
            } else {
                debug!(
                    "School for user {} is not changing (remains {:?}), skipping update",
                    user.id, user.school_id
                );
            }
        }

        if let Some(role_id) = request.role_id {
            self.require(
                actor,
                updating_self,
                "modify:role",
                "roleId",
                "Cannot modify role.",
            )?;

            if !self.roles.exists(role_id).await? {
                warn!("Failed to update user: {} (role {} not found)", user.id, role_id);
                return Err(UserError::not_found("Role"));
            }

            if role_id != TOP_ADMIN_ROLE_ID {
                self.ensure_top_admin_remains(
                    &user,
                    "roleId",
                    "Cannot change the role of the last admin user.",
                )
                .await?;
            }

            if actor.role_id > role_id {
                warn!(
                    "Failed to update user: {} (role {} above actor's {})",
                    user.id, role_id, actor.role_id
                );
                return Err(UserError::permission_denied(
                    "roleId",
                    "Cannot change role to a higher level.",
                ));
            }

            if user.role_id < actor.role_id && role_id > user.role_id {
                warn!("Failed to update user: {} (demoting a higher-level user)", user.id);
                return Err(UserError::permission_denied(
                    "roleId",
                    "Cannot change role to a lower level.",
                ));
            }

            debug!("Setting role ID for user: {} to {}", user.id, role_id);
            user.role_id = role_id;
        }

        if let Some(deactivated) = request.deactivated {
            self.require(
                actor,
                updating_self,
                "deactivate",
                "deactivated",
                "Cannot modify deactivated status.",
            )?;

            if deactivated {
                self.ensure_top_admin_remains(
                    &user,
                    "deactivated",
                    "Cannot set deactivated status of the last admin user.",
                )
                .await?;
            }

            if user.role_id < actor.role_id {
                warn!("Failed to update user: {} (deactivating a higher-level user)", user.id);
                return Err(UserError::permission_denied(
                    "deactivated",
                    "Cannot change deactivated status of a higher-level user.",
                ));
            }

            debug!("Updating deactivated status for user: {}", user.id);
            effects.user_was_deactivated = !user.deactivated && deactivated;
            user.deactivated = deactivated;
        }

        if let Some(tutorials) = &request.finished_tutorials {
            if tutorials.len() > MAX_FINISHED_TUTORIALS {
                warn!("Failed to update user: {} (too many tutorials)", user.id);
                return Err(UserError::validation(
                    "finishedTutorials",
                    "Too many tutorials finished.",
                ));
            }

            debug!("Updating onboarding status for user: {} ({})", user.id, tutorials.len());
            user.finished_tutorials = tutorials.clone();
        }

        if let Some(force_update_info) = request.force_update_info {
            self.require(
                actor,
                updating_self,
                "forceupdate",
                "forceUpdateInfo",
                "Cannot force update.",
            )?;
            debug!("Setting force update info for user: {}", user.id);
            user.force_update_info = force_update_info;
        }

        user.last_modified = Utc::now();
        Ok(UpdateOutcome { user, effects })
    }

    fn require(
        &self,
        actor: &ActorContext,
        updating_self: bool,
        action: &str,
        field: &'static str,
        reason: &str,
    ) -> Result<(), UserError> {
        let permission = user_permission(updating_self, action);
        if self.permissions.is_allowed(&permission, actor) {
            return Ok(());
        }

        warn!(
            "Failed to update user field {} (permission denied: {} for {})",
            field, permission, actor.user_id
        );
        Err(UserError::permission_denied(field, reason))
    }

    /// Reject when taking `user` out of the active top-admin set would leave it empty.
    async fn ensure_top_admin_remains(
        &self,
        user: &UserRecord,
        field: &'static str,
        reason: &str,
    ) -> Result<(), UserError> {
        if user.role_id != TOP_ADMIN_ROLE_ID || user.deactivated {
            return Ok(());
        }

        let active_admins = self.users.count_by_role(TOP_ADMIN_ROLE_ID, true).await?;
        if active_admins - 1 < 1 {
            warn!("Refusing to remove the last active top admin ({})", user.id);
            return Err(UserError::validation(field, reason));
        }
        Ok(())
    }
}
