use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Partial update of a user record.
///
/// String fields treat `None` and `""` alike as "leave unchanged". `school_id`
/// is tri-state: absent from the payload (`None`), explicitly `null`
/// (`Some(None)`), or a school id (`Some(Some(id))`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
    pub id: Uuid,
    pub username: Option<String>,
    pub email: Option<String>,
    pub name_first: Option<String>,
    pub name_middle: Option<String>,
    pub name_last: Option<String>,
    pub position: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub school_id: Option<Option<i32>>,
    pub role_id: Option<i32>,
    pub deactivated: Option<bool>,
    pub finished_tutorials: Option<Vec<String>>,
    pub force_update_info: Option<bool>,
}

impl UserUpdateRequest {
    pub fn for_user(id: Uuid) -> Self {
        Self { id, ..Default::default() }
    }
}

// Only called when the key is in the payload, so `null` becomes Some(None).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Input of the user creation flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role_id: i32,
    pub email: Option<String>,
    pub name_first: Option<String>,
    pub name_middle: Option<String>,
    pub name_last: Option<String>,
    pub position: Option<String>,
    pub school_id: Option<i32>,
}

/// Fields to soft-clear on a user; `true` means "set to null"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserFieldRemoval {
    pub id: Uuid,
    pub email: bool,
    pub name_first: bool,
    pub name_middle: bool,
    pub name_last: bool,
    pub position: bool,
    pub school_id: bool,
}

/// The principal performing a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub role_id: i32,
}

/// Side effects of an applied update, used to drive notifications and the commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectFlags {
    pub email_changed: bool,
    pub user_was_deactivated: bool,
    /// Noted-by references must be cleared before the record is saved
    pub school_changed: bool,
}
