//! Document store boundary.
//!
//! The persistence engine is a collaborator: the core only issues lookups by
//! key, partial updates, deletes and aggregation pipelines through the
//! [`DocumentStore`] trait. [`memory::MemoryStore`] is the bundled engine used
//! by the server binary and by tests.

pub mod memory;
pub mod pipeline;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

pub use pipeline::{Expr, Lookup, Stage};

/// A stored document: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// Collection holding identities.
pub const USERS: &str = "users";
/// Collection holding subscription edges.
pub const SUBSCRIPTIONS: &str = "subscriptions";
/// Collection holding videos (read-only to this crate).
pub const VIDEOS: &str = "videos";

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate key in {collection}: {field}")]
    DuplicateKey { collection: String, field: String },

    #[error("Document is missing an _id")]
    MissingId,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Document predicate. Field paths are dotted; a path that crosses an array
/// matches when any element matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { field: String, value: Value },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    /// Equality on a single field.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Equality on `_id`.
    pub fn id(id: &str) -> Self {
        Self::eq("_id", id)
    }
}

/// Partial update: fields to overwrite and fields to remove.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub set: Vec<(String, Value)>,
    pub unset: Vec<String>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite `field` with `value`.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.push((field.into(), value.into()));
        self
    }

    /// Remove `field` from the document.
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.unset.push(field.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }
}

/// Serialize a typed record into a storable document.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!(
            "expected an object document, got {other}"
        ))),
    }
}

/// Deserialize a stored document into a typed record. Fields the record does
/// not declare are dropped, which is how read paths project them away.
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// Persistence collaborator used by the core.
///
/// Implementations must apply `update_one` atomically per document: the filter
/// is evaluated and the update applied without another writer interleaving.
/// The refresh-token compare-and-swap relies on this.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// First document in `collection` matching `filter`.
    async fn find_one(&self, collection: &str, filter: &Filter)
    -> Result<Option<Document>, StoreError>;

    /// Insert a document. The document must carry an `_id`.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError>;

    /// Apply `update` to the first document matching `filter`. Returns the
    /// number of matched documents (0 or 1).
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, StoreError>;

    /// Delete the first document matching `filter`. Returns the number deleted.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Run an aggregation pipeline over `collection`, returning results in order.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Stage],
    ) -> Result<Vec<Document>, StoreError>;
}
