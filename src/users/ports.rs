//! Collaborators the user management core depends on.
//!
//! The Postgres implementations live in `database::repository`; tests supply
//! in-memory ones.

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::{Role, UserRecord};
use crate::database::DatabaseError;
use crate::users::error::UserError;
use crate::users::events::UserEvent;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DatabaseError>;

    /// Case-sensitive exact match
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, DatabaseError>;

    async fn count_by_role(&self, role_id: i32, active_only: bool) -> Result<i64, DatabaseError>;

    async fn list(&self) -> Result<Vec<UserRecord>, DatabaseError>;

    async fn insert(&self, user: &UserRecord) -> Result<(), DatabaseError>;

    async fn save(&self, user: &UserRecord) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait SchoolRepository: Send + Sync {
    async fn exists(&self, school_id: i32) -> Result<bool, DatabaseError>;

    /// Drop every noted-by reference that points at `user_id`
    async fn clear_assigned_noted_by(&self, user_id: Uuid) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn exists(&self, role_id: i32) -> Result<bool, DatabaseError>;

    async fn list(&self) -> Result<Vec<Role>, DatabaseError>;
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, UserError>;

    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}

/// Outbound port for state-change notifications, fed after commit
#[async_trait]
pub trait UserEventSink: Send + Sync {
    async fn publish(&self, event: UserEvent) -> anyhow::Result<()>;
}
