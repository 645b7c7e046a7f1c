//! Channel profile: identity plus subscriber/subscription counts.

use serde_json::Value;

use super::GraphError;
use crate::models::channel::ChannelProfile;
use crate::store::pipeline::project;
use crate::store::{DocumentStore, Expr, Filter, Lookup, SUBSCRIPTIONS, Stage, USERS, from_document};

/// Pipeline for the channel named `username`, as seen by `caller_id`.
pub fn channel_profile_pipeline(username: &str, caller_id: &str) -> Vec<Stage> {
    vec![
        Stage::Match(Filter::eq("username", username.to_lowercase())),
        Stage::Lookup(Lookup::new(SUBSCRIPTIONS, "_id", "channel", "subscribers")),
        Stage::Lookup(Lookup::new(SUBSCRIPTIONS, "_id", "subscriber", "subscribedTo")),
        Stage::AddFields(vec![
            ("subscribersCount".to_string(), Expr::size("subscribers")),
            ("subscribedToCount".to_string(), Expr::size("subscribedTo")),
            (
                "isSubscribed".to_string(),
                Expr::contains(Value::String(caller_id.to_string()), "subscribers.subscriber"),
            ),
        ]),
        project(&[
            "fullName",
            "username",
            "email",
            "avatar",
            "coverImage",
            "subscribersCount",
            "subscribedToCount",
            "isSubscribed",
        ]),
    ]
}

/// Load the channel profile for `username`.
pub async fn channel_profile(
    store: &dyn DocumentStore,
    username: &str,
    caller_id: &str,
) -> Result<ChannelProfile, GraphError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(GraphError::Validation("username is missing".into()));
    }

    let mut results = store
        .aggregate(USERS, &channel_profile_pipeline(username, caller_id))
        .await?;
    if results.is_empty() {
        return Err(GraphError::NotFound("channel does not exist".into()));
    }
    Ok(from_document(results.swap_remove(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::{Document, to_document};
    use crate::models::channel::Subscription;
    use serde_json::json;

    fn user(id: &str, username: &str) -> Document {
        let value = json!({
            "_id": id,
            "username": username,
            "email": format!("{username}@example.com"),
            "fullName": username.to_uppercase(),
            "password": "secret-hash",
            "refreshToken": "rt",
            "avatar": format!("https://media/{username}.png"),
            "watchHistory": [],
        });
        value.as_object().cloned().unwrap()
    }

    async fn subscribe(store: &MemoryStore, id: &str, subscriber: &str, channel: &str) {
        let edge = Subscription {
            id: id.into(),
            subscriber: subscriber.into(),
            channel: channel.into(),
        };
        store
            .insert_one(SUBSCRIPTIONS, to_document(&edge).unwrap())
            .await
            .unwrap();
    }

    async fn graph() -> MemoryStore {
        let store = MemoryStore::with_user_indexes();
        for (id, name) in [("a", "alice"), ("b", "bob"), ("c", "carol")] {
            store.insert_one(USERS, user(id, name)).await.unwrap();
        }
        subscribe(&store, "e1", "a", "b").await;
        store
    }

    #[tokio::test]
    async fn subscriber_sees_is_subscribed() {
        let store = graph().await;
        let profile = channel_profile(&store, "bob", "a").await.unwrap();
        assert_eq!(profile.id, "b");
        assert!(profile.is_subscribed);
        assert_eq!(profile.subscribers_count, 1);
        assert_eq!(profile.subscribed_to_count, 0);
    }

    #[tokio::test]
    async fn third_party_is_not_subscribed() {
        let store = graph().await;
        let profile = channel_profile(&store, "bob", "c").await.unwrap();
        assert!(!profile.is_subscribed);
        assert_eq!(profile.subscribers_count, 1);
    }

    #[tokio::test]
    async fn outgoing_edges_count_as_subscribed_to() {
        let store = graph().await;
        let profile = channel_profile(&store, "ALICE", "c").await.unwrap();
        assert_eq!(profile.subscribers_count, 0);
        assert_eq!(profile.subscribed_to_count, 1);
    }

    #[tokio::test]
    async fn duplicate_edges_are_counted_as_documents() {
        let store = graph().await;
        subscribe(&store, "e2", "a", "b").await;
        let profile = channel_profile(&store, "bob", "a").await.unwrap();
        assert_eq!(profile.subscribers_count, 2);
    }

    #[tokio::test]
    async fn projection_drops_secrets_and_edge_sets() {
        let store = graph().await;
        let docs = store
            .aggregate(USERS, &channel_profile_pipeline("bob", "a"))
            .await
            .unwrap();
        let doc = &docs[0];
        for hidden in ["password", "refreshToken", "subscribers", "subscribedTo", "watchHistory"] {
            assert!(!doc.contains_key(hidden), "{hidden} leaked");
        }
    }

    #[tokio::test]
    async fn unknown_channel_is_not_found() {
        let store = graph().await;
        let err = channel_profile(&store, "nobody", "a").await.unwrap_err();
        assert!(matches!(err, GraphError::NotFound(_)));
    }

    #[tokio::test]
    async fn blank_username_is_rejected() {
        let store = graph().await;
        let err = channel_profile(&store, "   ", "a").await.unwrap_err();
        assert!(matches!(err, GraphError::Validation(_)));
    }
}
