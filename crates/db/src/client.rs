//! `DocumentStoreClient` — the four CRUD operations over one connection.
//!
//! Every failure is reported to the client's [`LogSink`] at
//! [`Severity::Error`] and then returned as a `DbError`; nothing is dropped
//! and nothing panics. `DbError::NotFound` is an outcome, not a failure, and
//! is not reported to the sink.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::backend::{DocumentBackend, MongoBackend};
use crate::sink::{LogSink, Severity};
use crate::{DbError, Document, StoreConfig};

/// Result of [`DocumentStoreClient::create_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Renders the status strings older callers compare against.
impl fmt::Display for CreateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "create document"),
            Self::AlreadyExists => write!(f, "already existing document"),
        }
    }
}

/// Handle to one logical database. Cheap to clone; clones share the
/// connection and the log sink.
#[derive(Clone)]
pub struct DocumentStoreClient {
    backend: Arc<dyn DocumentBackend>,
    sink: Arc<dyn LogSink>,
}

impl fmt::Debug for DocumentStoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStoreClient").finish_non_exhaustive()
    }
}

impl DocumentStoreClient {
    /// Connect to the store described by `config` and select its database.
    ///
    /// Only returns once the server has answered, so a client value is always
    /// connected.
    ///
    /// # Errors
    /// `DbError::Configuration` if the connection string cannot be built,
    /// `DbError::Connect` if the server cannot be reached or rejects us.
    pub async fn connect(config: &StoreConfig, sink: Arc<dyn LogSink>) -> Result<Self, DbError> {
        let uri = config.connection_string().map_err(|e| report(&*sink, e))?;
        let backend = MongoBackend::connect(&uri, &config.db_name)
            .await
            .map_err(|e| report(&*sink, e))?;

        Ok(Self::with_backend(Arc::new(backend), sink))
    }

    /// Build a client over an already-open backend.
    pub fn with_backend(backend: Arc<dyn DocumentBackend>, sink: Arc<dyn LogSink>) -> Self {
        Self { backend, sink }
    }

    /// Every document in `collection`, in the store's enumeration order.
    #[instrument(skip(self))]
    pub async fn list_all(&self, collection: &str) -> Result<Vec<Document>, DbError> {
        self.backend
            .find(collection, &Document::new())
            .await
            .map_err(|e| self.fail(e))
    }

    /// Insert `fields` unless a document already matches `primary_key`.
    ///
    /// The lookup result itself is checked for emptiness. Older versions of
    /// this layer tested an attribute of the query cursor that was never
    /// set, so they inserted duplicates unconditionally; that behaviour is
    /// intentionally not reproduced.
    #[instrument(skip(self, primary_key, fields))]
    pub async fn create_if_absent(
        &self,
        collection: &str,
        primary_key: &Document,
        fields: Document,
    ) -> Result<CreateOutcome, DbError> {
        let existing = self
            .backend
            .find_first(collection, primary_key)
            .await
            .map_err(|e| self.fail(e))?;

        if existing.is_some() {
            debug!("document already exists, skipping insert");
            return Ok(CreateOutcome::AlreadyExists);
        }

        self.backend
            .insert_one(collection, fields)
            .await
            .map_err(|e| self.fail(e))?;

        self.sink.record(
            &format!("Document ADD with success in {collection}"),
            Severity::Success,
        );
        Ok(CreateOutcome::Created)
    }

    /// Merge `fields` into the first document matching `primary_key`.
    ///
    /// Only the named top-level fields change.
    ///
    /// # Errors
    /// `DbError::NotFound` when nothing matches (the collection is left
    /// untouched), `DbError::Query` when `fields` is empty or the store fails.
    #[instrument(skip(self, primary_key, fields))]
    pub async fn update(
        &self,
        collection: &str,
        primary_key: &Document,
        fields: &Document,
    ) -> Result<(), DbError> {
        if fields.is_empty() {
            return Err(self.fail(DbError::Query("update requires at least one field".into())));
        }

        let matched = self
            .backend
            .update_first(collection, primary_key, fields)
            .await
            .map_err(|e| self.fail(e))?;

        if matched == 0 {
            debug!("no document matched, nothing updated");
            return Err(DbError::NotFound);
        }

        self.sink.record(
            &format!("Document EDIT with success in {collection}"),
            Severity::Success,
        );
        Ok(())
    }

    /// The first document matching `primary_key`.
    #[instrument(skip(self, primary_key))]
    pub async fn get_one(&self, collection: &str, primary_key: &Document) -> Result<Document, DbError> {
        self.backend
            .find_first(collection, primary_key)
            .await
            .map_err(|e| self.fail(e))?
            .ok_or(DbError::NotFound)
    }

    fn fail(&self, err: DbError) -> DbError {
        report(&*self.sink, err)
    }
}

fn report(sink: &dyn LogSink, err: DbError) -> DbError {
    sink.record(&err.to_string(), Severity::Error);
    err
}
