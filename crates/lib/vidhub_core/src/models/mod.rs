//! Domain models.
//!
//! Stored records use the document field names (`_id`, camelCase) so the
//! same types serialize to the store and to the API.

pub mod auth;
pub mod channel;
pub mod user;
