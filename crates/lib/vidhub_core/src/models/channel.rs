//! Read shapes produced by the graph aggregations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Directed subscription edge: `subscriber` follows `channel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: String,
    pub subscriber: String,
    pub channel: String,
}

/// Channel profile with derived subscription counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub subscribers_count: u64,
    pub subscribed_to_count: u64,
    pub is_subscribed: bool,
}

/// Owner summary embedded in each watched video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwner {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub avatar: String,
}

/// A watch-history entry: the video document with its owner resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedVideo {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<VideoOwner>,
    /// Descriptive video fields, passed through untouched.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}
