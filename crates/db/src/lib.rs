//! `db` crate — document-store access layer.
//!
//! Opens one connection to a MongoDB logical database and exposes four
//! operations on it (list, create-if-absent, update, get-one) through
//! [`DocumentStoreClient`]. Failures are reported to a [`LogSink`] and returned
//! as [`DbError`]. No business logic lives here.

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod sink;

pub use backend::{DocumentBackend, InMemoryBackend, MongoBackend};
pub use client::{CreateOutcome, DocumentStoreClient};
pub use config::StoreConfig;
pub use error::DbError;
pub use sink::{LogSink, RecordingSink, Severity, TracingSink};

/// A schemaless document: field name to JSON value.
pub type Document = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod client_tests;
