//! Typed error type for the db crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Connection parameters could not be turned into a usable URI.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport or authentication failure while opening the connection.
    #[error("connect error: {0}")]
    Connect(String),

    /// Failure during find/insert/update on an open connection.
    #[error("query error: {0}")]
    Query(String),

    #[error("document not found")]
    NotFound,
}

impl From<mongodb::error::Error> for DbError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Query(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for DbError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        Self::Query(format!("cannot encode document: {err}"))
    }
}
