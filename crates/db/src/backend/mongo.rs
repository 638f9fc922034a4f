//! MongoDB-backed storage.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson};
use mongodb::{Client, Collection, Database};
use serde_json::Value;
use tracing::info;

use super::DocumentBackend;
use crate::{DbError, Document};

/// Owns the driver client and the selected logical database.
#[derive(Debug, Clone)]
pub struct MongoBackend {
    client: Client,
    db: Database,
}

impl MongoBackend {
    /// Open a connection from `uri` and select `db_name`.
    ///
    /// The driver connects lazily, so a `ping` is issued to surface
    /// unreachable hosts and bad credentials here rather than on the first
    /// query.
    ///
    /// # Errors
    /// Returns `DbError::Connect` for malformed URIs, unreachable servers and
    /// authentication failures.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, DbError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| DbError::Connect(e.to_string()))?;

        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DbError::Connect(e.to_string()))?;

        info!("Connected to MongoDB database '{}'", db_name);
        Ok(Self { client, db })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn collection(&self, name: &str) -> Collection<bson::Document> {
        self.db.collection(name)
    }
}

fn to_bson(document: &Document) -> Result<bson::Document, DbError> {
    Ok(bson::to_document(document)?)
}

/// BSON-only values (ObjectId, dates, …) come out in relaxed extended JSON.
fn from_bson(document: bson::Document) -> Result<Document, DbError> {
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => Ok(map),
        other => Err(DbError::Query(format!("store returned a non-document value: {other}"))),
    }
}

#[async_trait]
impl DocumentBackend for MongoBackend {
    async fn find(&self, collection: &str, filter: &Document) -> Result<Vec<Document>, DbError> {
        let cursor = self.collection(collection).find(to_bson(filter)?).await?;
        let rows: Vec<bson::Document> = cursor.try_collect().await?;
        rows.into_iter().map(from_bson).collect()
    }

    async fn find_first(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<Option<Document>, DbError> {
        self.collection(collection)
            .find_one(to_bson(filter)?)
            .await?
            .map(from_bson)
            .transpose()
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), DbError> {
        self.collection(collection).insert_one(to_bson(&document)?).await?;
        Ok(())
    }

    async fn update_first(
        &self,
        collection: &str,
        filter: &Document,
        fields: &Document,
    ) -> Result<u64, DbError> {
        let result = self
            .collection(collection)
            .update_one(to_bson(filter)?, doc! { "$set": to_bson(fields)? })
            .await?;
        Ok(result.matched_count)
    }
}
