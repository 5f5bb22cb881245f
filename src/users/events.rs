use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::database::models::{UserPublic, UserRecord};
use crate::users::ports::UserEventSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserEventKind {
    UserCreated,
    UserUpdated,
    UserDeactivated,
    /// The user's email changed and needs verification
    EmailUpdated,
    ProfileUpdated,
}

impl UserEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserEventKind::UserCreated => "user_created",
            UserEventKind::UserUpdated => "user_updated",
            UserEventKind::UserDeactivated => "user_deactivated",
            UserEventKind::EmailUpdated => "email_updated",
            UserEventKind::ProfileUpdated => "profile_updated",
        }
    }
}

/// State change broadcast after a user mutation is committed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEvent {
    pub kind: UserEventKind,
    pub user_id: Uuid,
    pub data: Value,
    pub timestamp: i64,
}

impl UserEvent {
    fn new(kind: UserEventKind, user_id: Uuid, data: Value) -> Self {
        Self {
            kind,
            user_id,
            data,
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn created(user: &UserRecord) -> Self {
        Self::new(UserEventKind::UserCreated, user.id, json!({ "user": UserPublic::from(user) }))
    }

    pub fn updated(user: &UserRecord) -> Self {
        Self::new(UserEventKind::UserUpdated, user.id, json!({ "user": UserPublic::from(user) }))
    }

    pub fn deactivated(user: &UserRecord) -> Self {
        Self::new(
            UserEventKind::UserDeactivated,
            user.id,
            json!({ "user": UserPublic::from(user) }),
        )
    }

    pub fn email_updated(user: &UserRecord) -> Self {
        Self::new(
            UserEventKind::EmailUpdated,
            user.id,
            json!({
                "title": "Email address updated",
                "content": "Your email address has been updated. \
                    Please verify it to receive notifications.",
                "important": true,
            }),
        )
    }

    pub fn profile_updated(user: &UserRecord, email_changed: bool) -> Self {
        Self::new(
            UserEventKind::ProfileUpdated,
            user.id,
            json!({
                "username": user.username,
                "nameFirst": user.name_first,
                "nameMiddle": user.name_middle,
                "nameLast": user.name_last,
                "email": user.email,
                "position": user.position,
                "schoolId": user.school_id,
                "roleId": user.role_id,
                "lastModified": user.last_modified.to_rfc3339(),
                "emailChanged": email_changed,
            }),
        )
    }
}

/// Fan-out of user events to every live subscriber
#[derive(Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<UserEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UserEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl UserEventSink for BroadcastEventSink {
    async fn publish(&self, event: UserEvent) -> anyhow::Result<()> {
        let kind = event.kind;
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!("Delivered {} event to {} subscriber(s)", kind.as_str(), receivers);
            }
            Err(_) => {
                tracing::debug!("No subscribers for {} event", kind.as_str());
            }
        }
        Ok(())
    }
}
