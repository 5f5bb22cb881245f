use std::convert::Infallible;

use axum::{
    extract::{Extension, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::permissions::USERS_READ;
use crate::users::{UserEvent, UserEventKind};

/// GET /v1/users/events - Server-sent stream of committed user changes.
///
/// User managers see every event; everyone else only sees events about
/// their own account. The stream ends once the subscriber is deactivated.
pub async fn events_get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let actor = state.users.actor(auth_user.user_id).await?;
    let subscription = Subscription {
        subscriber: actor.user_id,
        sees_all: state.users.permissions().is_allowed(USERS_READ, &actor),
    };

    tracing::debug!("User {} subscribed to user events", actor.user_id);
    let receiver = state.events.subscribe();

    let stream = stream::unfold(receiver, move |mut receiver| async move {
        let event = subscription.next(&mut receiver).await?;
        let sse = match Event::default().event(event.kind.as_str()).json_data(&event) {
            Ok(sse) => sse,
            Err(e) => {
                tracing::warn!("Failed to encode user event: {}", e);
                Event::default().event(event.kind.as_str())
            }
        };
        Some((Ok(sse), receiver))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[derive(Debug, Clone, Copy)]
struct Subscription {
    subscriber: Uuid,
    sees_all: bool,
}

impl Subscription {
    /// Next event visible to the subscriber, or `None` when the stream should end
    async fn next(&self, receiver: &mut broadcast::Receiver<UserEvent>) -> Option<UserEvent> {
        loop {
            match receiver.recv().await {
                Ok(event) if event.user_id == self.subscriber
                    && event.kind == UserEventKind::UserDeactivated =>
                {
                    tracing::info!("Closing event stream of deactivated user {}", self.subscriber);
                    return None;
                }
                Ok(event) if self.sees_all || event.user_id == self.subscriber => {
                    return Some(event)
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event subscriber lagged, skipped {} event(s)", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{BroadcastEventSink, UserEventSink};
    use serde_json::json;

    fn event(kind: UserEventKind, user_id: Uuid) -> UserEvent {
        UserEvent {
            kind,
            user_id,
            data: json!({}),
            timestamp: 0,
        }
    }

    #[tokio::test]
    async fn scoped_subscribers_only_see_their_own_events() {
        let sink = BroadcastEventSink::new(8);
        let mut receiver = sink.subscribe();
        let me = Uuid::new_v4();
        let subscription = Subscription { subscriber: me, sees_all: false };

        sink.publish(event(UserEventKind::UserUpdated, Uuid::new_v4())).await.unwrap();
        sink.publish(event(UserEventKind::ProfileUpdated, me)).await.unwrap();

        let seen = subscription.next(&mut receiver).await.unwrap();
        assert_eq!(seen.user_id, me);
        assert_eq!(seen.kind, UserEventKind::ProfileUpdated);
    }

    #[tokio::test]
    async fn stream_ends_when_subscriber_is_deactivated() {
        let sink = BroadcastEventSink::new(8);
        let mut receiver = sink.subscribe();
        let me = Uuid::new_v4();
        let subscription = Subscription { subscriber: me, sees_all: true };

        // Someone else's deactivation is just another event
        let other = Uuid::new_v4();
        sink.publish(event(UserEventKind::UserDeactivated, other)).await.unwrap();
        sink.publish(event(UserEventKind::UserDeactivated, me)).await.unwrap();
        sink.publish(event(UserEventKind::UserUpdated, me)).await.unwrap();

        let first = subscription.next(&mut receiver).await.unwrap();
        assert_eq!(first.user_id, other);
        assert!(subscription.next(&mut receiver).await.is_none());
    }
}
