use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row of the `users` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    /// Argon2id hash, never the plaintext
    #[serde(skip_serializing)]
    pub password: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub name_first: Option<String>,
    pub name_middle: Option<String>,
    pub name_last: Option<String>,
    pub position: Option<String>,
    pub school_id: Option<i32>,
    pub role_id: i32,
    pub deactivated: bool,
    pub finished_tutorials: Vec<String>,
    pub force_update_info: bool,
    pub date_created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// Public view of a user, safe to return to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub name_first: Option<String>,
    pub name_middle: Option<String>,
    pub name_last: Option<String>,
    pub position: Option<String>,
    pub school_id: Option<i32>,
    pub role_id: i32,
    pub deactivated: bool,
    pub finished_tutorials: Vec<String>,
    pub force_update_info: bool,
    pub date_created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl From<&UserRecord> for UserPublic {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            email_verified: user.email_verified,
            name_first: user.name_first.clone(),
            name_middle: user.name_middle.clone(),
            name_last: user.name_last.clone(),
            position: user.position.clone(),
            school_id: user.school_id,
            role_id: user.role_id,
            deactivated: user.deactivated,
            finished_tutorials: user.finished_tutorials.clone(),
            force_update_info: user.force_update_info,
            date_created: user.date_created,
            last_modified: user.last_modified,
        }
    }
}

impl From<UserRecord> for UserPublic {
    fn from(user: UserRecord) -> Self {
        UserPublic::from(&user)
    }
}
