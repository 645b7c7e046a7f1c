//! Declarative aggregation stages.
//!
//! A pipeline is an ordered `Vec<Stage>`; the store collaborator compiles or
//! interprets it. Stages mirror the match/lookup/addFields/project vocabulary
//! of document databases, plus `Collapse` for unwrapping one-to-one joins.

use serde_json::Value;

use super::Filter;

/// One pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep documents matching the filter.
    Match(Filter),
    /// Left join against another collection.
    Lookup(Lookup),
    /// Add or overwrite computed fields.
    AddFields(Vec<(String, Expr)>),
    /// Keep only the listed fields (plus `_id`).
    Project(Vec<String>),
    /// Replace an array field by its first element, removing it when empty.
    Collapse(String),
}

/// Left join: for every input document, collect the documents of `from`
/// whose `foreign_field` equals any value at `local_field`, run them through
/// `pipeline`, and store the result array under `as_field`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub from: String,
    pub local_field: String,
    pub foreign_field: String,
    pub as_field: String,
    pub pipeline: Vec<Stage>,
}

impl Lookup {
    pub fn new(
        from: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            as_field: as_field.into(),
            pipeline: Vec::new(),
        }
    }

    /// Attach a sub-pipeline run over each document's joined set.
    pub fn with_pipeline(mut self, pipeline: Vec<Stage>) -> Self {
        self.pipeline = pipeline;
        self
    }
}

/// Computed-field expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant value.
    Literal(Value),
    /// Value at a field path (null when missing).
    Field(String),
    /// Length of the array at a field path (0 when missing).
    Size(String),
    /// Whether `needle` is among the values reachable at a field path.
    Contains { needle: Value, path: String },
}

impl Expr {
    pub fn contains(needle: impl Into<Value>, path: impl Into<String>) -> Self {
        Expr::Contains {
            needle: needle.into(),
            path: path.into(),
        }
    }

    pub fn size(path: impl Into<String>) -> Self {
        Expr::Size(path.into())
    }
}

/// Build a projection stage from field names.
pub fn project(fields: &[&str]) -> Stage {
    Stage::Project(fields.iter().map(|f| f.to_string()).collect())
}
