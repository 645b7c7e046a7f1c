//! # vidhub_core
//!
//! Core domain logic for Vidhub: credentials, session tokens, the document
//! store boundary and the channel graph aggregations built on top of it.

pub mod auth;
pub mod graph;
pub mod media;
pub mod models;
pub mod store;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
