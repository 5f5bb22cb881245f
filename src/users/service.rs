use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::models::{Role, UserRecord};
use crate::permissions::PermissionChecker;
use crate::users::authorizer::{UpdateOutcome, UserUpdateAuthorizer};
use crate::users::error::UserError;
use crate::users::events::UserEvent;
use crate::users::ports::{
    PasswordHasher, RoleRepository, SchoolRepository, UserEventSink, UserRepository,
};
use crate::users::request::{ActorContext, NewUser, UserFieldRemoval, UserUpdateRequest};
use crate::users::validation::{is_valid_username, validate_password};

/// User management operations over the injected collaborators
pub struct UserService {
    users: Arc<dyn UserRepository>,
    schools: Arc<dyn SchoolRepository>,
    roles: Arc<dyn RoleRepository>,
    permissions: Arc<dyn PermissionChecker>,
    hasher: Arc<dyn PasswordHasher>,
    events: Arc<dyn UserEventSink>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        schools: Arc<dyn SchoolRepository>,
        roles: Arc<dyn RoleRepository>,
        permissions: Arc<dyn PermissionChecker>,
        hasher: Arc<dyn PasswordHasher>,
        events: Arc<dyn UserEventSink>,
    ) -> Self {
        Self {
            users,
            schools,
            roles,
            permissions,
            hasher,
            events,
        }
    }

    pub fn permissions(&self) -> &dyn PermissionChecker {
        self.permissions.as_ref()
    }

    pub fn authorizer(&self) -> UserUpdateAuthorizer<'_> {
        UserUpdateAuthorizer {
            users: self.users.as_ref(),
            schools: self.schools.as_ref(),
            roles: self.roles.as_ref(),
            permissions: self.permissions.as_ref(),
            hasher: self.hasher.as_ref(),
        }
    }

    /// Resolve the requesting user. Deactivated accounts may not act.
    pub async fn actor(&self, user_id: Uuid) -> Result<ActorContext, UserError> {
        let user = self.get(user_id).await?;
        if user.deactivated {
            warn!("Deactivated user {} attempted a request", user_id);
            return Err(UserError::permission_denied("id", "Account is deactivated."));
        }
        Ok(ActorContext {
            user_id: user.id,
            role_id: user.role_id,
        })
    }

    pub async fn get(&self, user_id: Uuid) -> Result<UserRecord, UserError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| {
                warn!("User {} not found", user_id);
                UserError::not_found("User")
            })
    }

    pub async fn list(&self) -> Result<Vec<UserRecord>, UserError> {
        Ok(self.users.list().await?)
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, UserError> {
        Ok(self.roles.list().await?)
    }

    /// Apply a partial update on behalf of `actor` and persist it.
    ///
    /// All checks run against an in-memory copy first; the record is saved
    /// only if every step passes. A school change clears the user's noted-by
    /// references before the new school is written.
    pub async fn update(
        &self,
        request: &UserUpdateRequest,
        actor: &ActorContext,
    ) -> Result<UserRecord, UserError> {
        let current = self.get(request.id).await?;
        let UpdateOutcome { user, effects } = self
            .authorizer()
            .apply_update(current, request, actor)
            .await?;

        if effects.school_changed {
            debug!("Clearing noted-by references for user {}", user.id);
            self.schools.clear_assigned_noted_by(user.id).await?;
        }
        self.users.save(&user).await?;
        info!("User info for `{}` updated.", user.username);

        if effects.user_was_deactivated {
            self.emit(UserEvent::deactivated(&user)).await;
        } else {
            self.emit(UserEvent::updated(&user)).await;
        }
        if effects.email_changed {
            self.emit(UserEvent::email_updated(&user)).await;
        }
        self.emit(UserEvent::profile_updated(&user, effects.email_changed)).await;

        Ok(user)
    }

    /// Create a user on behalf of `actor`. Accounts without an email start out verified.
    pub async fn create(
        &self,
        new_user: NewUser,
        actor: &ActorContext,
        email_verified: bool,
    ) -> Result<UserRecord, UserError> {
        if actor.role_id > new_user.role_id {
            warn!(
                "Failed to create user: {} (role {} above actor's {})",
                new_user.username, new_user.role_id, actor.role_id
            );
            return Err(UserError::permission_denied(
                "roleId",
                "Cannot create a user with a higher role.",
            ));
        }

        if self.users.find_by_username(&new_user.username).await?.is_some() {
            warn!("Failed to create user: {} (username already exists)", new_user.username);
            return Err(UserError::conflict("username", "Username already exists"));
        }

        if !is_valid_username(&new_user.username) {
            warn!("Failed to create user: {} (invalid username)", new_user.username);
            return Err(UserError::validation("username", "Invalid username"));
        }

        if let Err(rule) = validate_password(&new_user.password) {
            warn!("Failed to create user: {} ({})", new_user.username, rule);
            return Err(UserError::validation(
                "password",
                format!("Invalid password format ({})", rule),
            ));
        }

        if !self.roles.exists(new_user.role_id).await? {
            return Err(UserError::not_found("Role"));
        }

        if let Some(school_id) = new_user.school_id {
            if !self.schools.exists(school_id).await? {
                return Err(UserError::not_found("School"));
            }
        }

        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: new_user.username,
            password: self.hasher.hash(&new_user.password)?,
            email_verified: email_verified || new_user.email.is_none(),
            email: new_user.email,
            name_first: new_user.name_first,
            name_middle: new_user.name_middle,
            name_last: new_user.name_last,
            position: new_user.position,
            school_id: new_user.school_id,
            role_id: new_user.role_id,
            deactivated: false,
            finished_tutorials: Vec::new(),
            force_update_info: false,
            date_created: now,
            last_modified: now,
        };

        self.users.insert(&user).await?;
        info!("User `{}` created.", user.username);
        self.emit(UserEvent::created(&user)).await;

        Ok(user)
    }

    /// Soft-clear the selected fields of a user
    pub async fn remove_fields(&self, removal: &UserFieldRemoval) -> Result<UserRecord, UserError> {
        let mut user = self.get(removal.id).await?;

        if removal.email {
            user.email = None;
            user.email_verified = false;
        }
        if removal.name_first {
            user.name_first = None;
        }
        if removal.name_middle {
            user.name_middle = None;
        }
        if removal.name_last {
            user.name_last = None;
        }
        if removal.position {
            user.position = None;
        }
        if removal.school_id && user.school_id.is_some() {
            debug!(
                "User {} is being removed from school {:?}, clearing noted-by references",
                user.id, user.school_id
            );
            self.schools.clear_assigned_noted_by(user.id).await?;
            user.school_id = None;
        }

        user.last_modified = Utc::now();
        self.users.save(&user).await?;
        info!("Selected fields for user `{}` removed.", user.username);
        self.emit(UserEvent::updated(&user)).await;

        Ok(user)
    }

    /// Check login credentials
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, UserError> {
        let invalid = || UserError::Unauthorized("Invalid username or password".to_string());

        let user = self.users.find_by_username(username).await?.ok_or_else(|| {
            warn!("Login failed: unknown user {}", username);
            invalid()
        })?;

        if !self.hasher.verify(password, &user.password) {
            warn!("Login failed: wrong password for {}", username);
            return Err(invalid());
        }

        if user.deactivated {
            warn!("Login failed: {} is deactivated", username);
            return Err(UserError::Unauthorized("Account is deactivated".to_string()));
        }

        info!("User `{}` logged in.", user.username);
        Ok(user)
    }

    async fn emit(&self, event: UserEvent) {
        let kind = event.kind;
        if let Err(e) = self.events.publish(event).await {
            warn!("Failed to publish {} event: {}", kind.as_str(), e);
        }
    }
}
