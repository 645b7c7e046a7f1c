//! Watch history: watched videos with their owners resolved.

use serde::Deserialize;

use super::GraphError;
use crate::models::channel::WatchedVideo;
use crate::store::pipeline::project;
use crate::store::{DocumentStore, Filter, Lookup, Stage, USERS, VIDEOS, from_document};

/// Pipeline for the watch history of `user_id`.
pub fn watch_history_pipeline(user_id: &str) -> Vec<Stage> {
    let owner = Lookup::new(USERS, "owner", "_id", "owner")
        .with_pipeline(vec![project(&["fullName", "username", "avatar"])]);
    let videos = Lookup::new(VIDEOS, "watchHistory", "_id", "watchHistory").with_pipeline(vec![
        Stage::Lookup(owner),
        Stage::Collapse("owner".to_string()),
    ]);
    vec![
        Stage::Match(Filter::id(user_id)),
        Stage::Lookup(videos),
        Stage::Project(vec!["watchHistory".to_string()]),
    ]
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRow {
    #[serde(default)]
    watch_history: Vec<WatchedVideo>,
}

/// Load the watch history of `user_id`. An empty history is an empty list.
pub async fn watch_history(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Vec<WatchedVideo>, GraphError> {
    let mut results = store
        .aggregate(USERS, &watch_history_pipeline(user_id))
        .await?;
    if results.is_empty() {
        return Err(GraphError::NotFound("User does not exist".into()));
    }
    let row: HistoryRow = from_document(results.swap_remove(0))?;
    Ok(row.watch_history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::Document;
    use serde_json::{Value, json};

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn store_with(history: Value) -> MemoryStore {
        let store = MemoryStore::with_user_indexes();
        store
            .insert_one(
                USERS,
                doc(json!({
                    "_id": "viewer",
                    "username": "viewer",
                    "email": "viewer@example.com",
                    "fullName": "Viewer",
                    "password": "hash",
                    "avatar": "https://media/v.png",
                    "watchHistory": history,
                })),
            )
            .await
            .unwrap();
        store
            .insert_one(
                USERS,
                doc(json!({
                    "_id": "owner",
                    "username": "maker",
                    "email": "maker@example.com",
                    "fullName": "Maker",
                    "password": "owner-hash",
                    "refreshToken": "rt",
                    "avatar": "https://media/m.png",
                })),
            )
            .await
            .unwrap();
        store
            .insert_one(
                VIDEOS,
                doc(json!({"_id": "v1", "owner": "owner", "title": "First", "duration": 12})),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn empty_history_is_empty_list() {
        let store = store_with(json!([])).await;
        let history = watch_history(&store, "viewer").await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn videos_carry_collapsed_projected_owner() {
        let store = store_with(json!(["v1"])).await;
        let history = watch_history(&store, "viewer").await.unwrap();
        assert_eq!(history.len(), 1);

        let video = &history[0];
        assert_eq!(video.id, "v1");
        assert_eq!(video.details.get("title"), Some(&json!("First")));
        let owner = video.owner.as_ref().unwrap();
        assert_eq!(owner.username, "maker");

        let raw = serde_json::to_value(video).unwrap();
        assert!(raw["owner"].get("password").is_none());
        assert!(raw["owner"].get("refreshToken").is_none());
        assert!(raw["owner"].get("email").is_none());
    }

    #[tokio::test]
    async fn vanished_owner_is_omitted() {
        let store = store_with(json!(["v2"])).await;
        store
            .insert_one(
                VIDEOS,
                doc(json!({"_id": "v2", "owner": "deleted", "title": "Orphan"})),
            )
            .await
            .unwrap();
        let history = watch_history(&store, "viewer").await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].owner.is_none());

        let raw = serde_json::to_value(&history[0]).unwrap();
        assert!(raw.get("owner").is_none());
        assert_eq!(raw["title"], "Orphan");
    }

    #[tokio::test]
    async fn dangling_references_are_skipped() {
        let store = store_with(json!(["v1", "gone"])).await;
        let history = watch_history(&store, "viewer").await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = store_with(json!([])).await;
        let err = watch_history(&store, "nobody").await.unwrap_err();
        assert!(matches!(err, GraphError::NotFound(_)));
    }
}
