//! In-memory document engine.
//!
//! Holds every collection behind one `RwLock`. Each trait call takes the lock
//! for the synchronous duration of the operation only, so a write is atomic
//! per document and an aggregation reads a single snapshot of all collections.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::pipeline::{Expr, Lookup, Stage};
use super::{Document, DocumentStore, Filter, StoreError, USERS, Update};

type Collections = HashMap<String, Vec<Document>>;

/// In-memory [`DocumentStore`] with optional unique indexes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    unique: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the unique indexes required by the identity collection.
    pub fn with_user_indexes() -> Self {
        Self::new()
            .with_unique_index(USERS, "username")
            .with_unique_index(USERS, "email")
    }

    /// Reject inserts/updates that would duplicate `field` within `collection`.
    pub fn with_unique_index(mut self, collection: &str, field: &str) -> Self {
        self.unique
            .entry(collection.to_string())
            .or_default()
            .push(field.to_string());
        self
    }

    fn check_unique(
        &self,
        collection: &str,
        docs: &[Document],
        candidate: &Document,
        skip: Option<usize>,
    ) -> Result<(), StoreError> {
        let Some(fields) = self.unique.get(collection) else {
            return Ok(());
        };
        for field in fields {
            let Some(value) = candidate.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = docs
                .iter()
                .enumerate()
                .any(|(i, doc)| Some(i) != skip && doc.get(field) == Some(value));
            if clash {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| matches(doc, filter)))
            .cloned())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        let id = document.get("_id").ok_or(StoreError::MissingId)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|doc| doc.get("_id") == Some(id)) {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                field: "_id".to_string(),
            });
        }
        self.check_unique(collection, docs, &document, None)?;
        docs.push(document);
        Ok(())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let Some(index) = docs.iter().position(|doc| matches(doc, filter)) else {
            return Ok(0);
        };
        if update.is_empty() {
            return Ok(1);
        }
        let mut updated = docs[index].clone();
        for (field, value) in &update.set {
            updated.insert(field.clone(), value.clone());
        }
        for field in &update.unset {
            updated.remove(field);
        }
        self.check_unique(collection, docs, &updated, Some(index))?;
        docs[index] = updated;
        Ok(1)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        match docs.iter().position(|doc| matches(doc, filter)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Stage],
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let input = collections.get(collection).cloned().unwrap_or_default();
        let output = run_pipeline(input, pipeline, &collections);
        debug!(
            collection,
            stages = pipeline.len(),
            results = output.len(),
            "aggregation complete"
        );
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn run_pipeline(mut docs: Vec<Document>, pipeline: &[Stage], all: &Collections) -> Vec<Document> {
    for stage in pipeline {
        docs = match stage {
            Stage::Match(filter) => docs.into_iter().filter(|d| matches(d, filter)).collect(),
            Stage::Lookup(lookup) => docs
                .into_iter()
                .map(|doc| apply_lookup(doc, lookup, all))
                .collect(),
            Stage::AddFields(fields) => docs
                .into_iter()
                .map(|mut doc| {
                    let computed: Vec<(String, Value)> = fields
                        .iter()
                        .map(|(name, expr)| (name.clone(), evaluate(&doc, expr)))
                        .collect();
                    doc.extend(computed);
                    doc
                })
                .collect(),
            Stage::Project(fields) => docs
                .into_iter()
                .map(|mut doc| {
                    doc.retain(|key, _| key == "_id" || fields.iter().any(|f| f == key));
                    doc
                })
                .collect(),
            Stage::Collapse(field) => docs
                .into_iter()
                .map(|mut doc| {
                    let first = match doc.get(field) {
                        Some(Value::Array(items)) => Some(items.first().cloned()),
                        _ => None,
                    };
                    match first {
                        Some(Some(value)) => {
                            doc.insert(field.clone(), value);
                        }
                        Some(None) => {
                            doc.remove(field);
                        }
                        None => {}
                    }
                    doc
                })
                .collect(),
        };
    }
    docs
}

fn apply_lookup(mut doc: Document, lookup: &Lookup, all: &Collections) -> Document {
    let keys: Vec<Value> = values_at(&doc, &lookup.local_field)
        .into_iter()
        .cloned()
        .collect();
    let joined: Vec<Document> = match all.get(&lookup.from) {
        Some(foreign) if !keys.is_empty() => foreign
            .iter()
            .filter(|candidate| {
                values_at(candidate, &lookup.foreign_field)
                    .into_iter()
                    .any(|v| keys.contains(v))
            })
            .cloned()
            .collect(),
        _ => Vec::new(),
    };
    let joined = run_pipeline(joined, &lookup.pipeline, all);
    doc.insert(
        lookup.as_field.clone(),
        Value::Array(joined.into_iter().map(Value::Object).collect()),
    );
    doc
}

fn evaluate(doc: &Document, expr: &Expr) -> Value {
    match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Field(path) => field_at(doc, path).cloned().unwrap_or(Value::Null),
        Expr::Size(path) => {
            let len = match field_at(doc, path) {
                Some(Value::Array(items)) => items.len(),
                _ => 0,
            };
            Value::from(len)
        }
        Expr::Contains { needle, path } => {
            Value::Bool(values_at(doc, path).into_iter().any(|v| v == needle))
        }
    }
}

fn matches(doc: &Document, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { field, value } => values_at(doc, field).into_iter().any(|v| v == value),
        Filter::And(filters) => filters.iter().all(|f| matches(doc, f)),
        Filter::Or(filters) => filters.iter().any(|f| matches(doc, f)),
    }
}

/// The value at a dotted path, walking objects only.
fn field_at<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Every value reachable at a dotted path. Arrays met along the way (and at
/// the end) are traversed element by element.
fn values_at<'a>(doc: &'a Document, path: &str) -> Vec<&'a Value> {
    let mut out = Vec::new();
    collect_object(doc, path, &mut out);
    out
}

fn collect_object<'a>(map: &'a Document, path: &str, out: &mut Vec<&'a Value>) {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let Some(next) = map.get(head) else {
        return;
    };
    match (rest, next) {
        (None, Value::Array(items)) => out.extend(items.iter()),
        (None, value) => out.push(value),
        (Some(rest), value) => collect_value(value, rest, out),
    }
}

fn collect_value<'a>(value: &'a Value, path: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => collect_object(map, path, out),
        Value::Array(items) => {
            for item in items {
                collect_value(item, path, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::pipeline::project;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[tokio::test]
    async fn insert_requires_id() {
        let store = MemoryStore::new();
        let err = store
            .insert_one("things", doc(json!({"name": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingId));
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicates_on_insert_and_update() {
        let store = MemoryStore::with_user_indexes();
        store
            .insert_one(USERS, doc(json!({"_id": "1", "username": "a", "email": "a@x"})))
            .await
            .unwrap();
        let err = store
            .insert_one(USERS, doc(json!({"_id": "2", "username": "a", "email": "b@x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { ref field, .. } if field == "username"));

        store
            .insert_one(USERS, doc(json!({"_id": "2", "username": "b", "email": "b@x"})))
            .await
            .unwrap();
        let err = store
            .update_one(USERS, &Filter::id("2"), &Update::new().set("email", "a@x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { ref field, .. } if field == "email"));

        // Re-setting a document's own value is not a clash.
        let matched = store
            .update_one(USERS, &Filter::id("2"), &Update::new().set("email", "b@x"))
            .await
            .unwrap();
        assert_eq!(matched, 1);
    }

    #[tokio::test]
    async fn empty_update_reports_match_without_writing() {
        let store = MemoryStore::new();
        store
            .insert_one("things", doc(json!({"_id": "1", "a": 1})))
            .await
            .unwrap();
        let matched = store
            .update_one("things", &Filter::id("1"), &Update::new())
            .await
            .unwrap();
        assert_eq!(matched, 1);
        let missed = store
            .update_one("things", &Filter::id("2"), &Update::new())
            .await
            .unwrap();
        assert_eq!(missed, 0);
        let found = store.find_one("things", &Filter::id("1")).await.unwrap().unwrap();
        assert_eq!(found, doc(json!({"_id": "1", "a": 1})));
    }

    #[tokio::test]
    async fn update_sets_and_unsets_fields() {
        let store = MemoryStore::new();
        store
            .insert_one("things", doc(json!({"_id": "1", "a": 1, "b": 2})))
            .await
            .unwrap();
        store
            .update_one(
                "things",
                &Filter::id("1"),
                &Update::new().set("a", 10).unset("b"),
            )
            .await
            .unwrap();
        let found = store.find_one("things", &Filter::id("1")).await.unwrap().unwrap();
        assert_eq!(found.get("a"), Some(&json!(10)));
        assert!(!found.contains_key("b"));
    }

    #[tokio::test]
    async fn conditional_update_matches_only_current_value() {
        let store = MemoryStore::new();
        store
            .insert_one("things", doc(json!({"_id": "1", "token": "old"})))
            .await
            .unwrap();
        let cas = |expected: &str| {
            Filter::And(vec![Filter::id("1"), Filter::eq("token", expected)])
        };
        let first = store
            .update_one("things", &cas("old"), &Update::new().set("token", "new"))
            .await
            .unwrap();
        let second = store
            .update_one("things", &cas("old"), &Update::new().set("token", "newer"))
            .await
            .unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn or_filter_matches_either_field() {
        let store = MemoryStore::new();
        store
            .insert_one("things", doc(json!({"_id": "1", "username": "u", "email": "e"})))
            .await
            .unwrap();
        let filter = Filter::Or(vec![Filter::eq("username", "nope"), Filter::eq("email", "e")]);
        assert!(store.find_one("things", &filter).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_removes_one_document() {
        let store = MemoryStore::new();
        store.insert_one("things", doc(json!({"_id": "1"}))).await.unwrap();
        assert_eq!(store.delete_one("things", &Filter::id("1")).await.unwrap(), 1);
        assert_eq!(store.delete_one("things", &Filter::id("1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn lookup_joins_on_array_local_field_with_nested_collapse() {
        let store = MemoryStore::new();
        store
            .insert_one("people", doc(json!({"_id": "p1", "name": "Ann", "secret": "s"})))
            .await
            .unwrap();
        store
            .insert_one("items", doc(json!({"_id": "i1", "owner": "p1", "title": "one"})))
            .await
            .unwrap();
        store
            .insert_one("items", doc(json!({"_id": "i2", "owner": "p1", "title": "two"})))
            .await
            .unwrap();
        store
            .insert_one("lists", doc(json!({"_id": "l1", "items": ["i2"]})))
            .await
            .unwrap();

        let pipeline = vec![
            Stage::Match(Filter::id("l1")),
            Stage::Lookup(Lookup::new("items", "items", "_id", "items").with_pipeline(vec![
                Stage::Lookup(
                    Lookup::new("people", "owner", "_id", "owner")
                        .with_pipeline(vec![project(&["name"])]),
                ),
                Stage::Collapse("owner".to_string()),
            ])),
        ];
        let out = store.aggregate("lists", &pipeline).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].get("items"),
            Some(&json!([{"_id": "i2", "owner": {"_id": "p1", "name": "Ann"}, "title": "two"}]))
        );
    }

    #[tokio::test]
    async fn add_fields_computes_size_and_membership() {
        let store = MemoryStore::new();
        store
            .insert_one(
                "things",
                doc(json!({"_id": "1", "edges": [{"from": "a"}, {"from": "b"}]})),
            )
            .await
            .unwrap();
        let pipeline = vec![Stage::AddFields(vec![
            ("count".to_string(), Expr::size("edges")),
            ("hasA".to_string(), Expr::contains("a", "edges.from")),
            ("hasC".to_string(), Expr::contains("c", "edges.from")),
            ("missing".to_string(), Expr::size("nothing")),
        ])];
        let out = store.aggregate("things", &pipeline).await.unwrap();
        assert_eq!(out[0].get("count"), Some(&json!(2)));
        assert_eq!(out[0].get("hasA"), Some(&json!(true)));
        assert_eq!(out[0].get("hasC"), Some(&json!(false)));
        assert_eq!(out[0].get("missing"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn aggregate_on_missing_collection_is_empty() {
        let store = MemoryStore::new();
        let out = store
            .aggregate("nothing", &[Stage::Match(Filter::id("1"))])
            .await
            .unwrap();
        assert!(out.is_empty());
    }
}
