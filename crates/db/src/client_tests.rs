//! Behavioural tests for `DocumentStoreClient`.
//!
//! These run against `InMemoryBackend` so no MongoDB server is required.
//! Tests against a live server live in `tests/mongo_integration.rs` and are
//! gated behind the `integration` feature flag.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    CreateOutcome, DbError, Document, DocumentBackend, DocumentStoreClient, InMemoryBackend,
    RecordingSink, Severity, StoreConfig,
};

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be a JSON object, got {other}"),
    }
}

fn client() -> (DocumentStoreClient, InMemoryBackend, RecordingSink) {
    let backend = InMemoryBackend::new();
    let sink = RecordingSink::new();
    let client = DocumentStoreClient::with_backend(Arc::new(backend.clone()), Arc::new(sink.clone()));
    (client, backend, sink)
}

/// A backend whose every call fails, standing in for a dropped connection.
struct FailingBackend;

#[async_trait]
impl DocumentBackend for FailingBackend {
    async fn find(&self, _: &str, _: &Document) -> Result<Vec<Document>, DbError> {
        Err(DbError::Query("connection reset".into()))
    }

    async fn find_first(&self, _: &str, _: &Document) -> Result<Option<Document>, DbError> {
        Err(DbError::Query("connection reset".into()))
    }

    async fn insert_one(&self, _: &str, _: Document) -> Result<(), DbError> {
        Err(DbError::Query("connection reset".into()))
    }

    async fn update_first(&self, _: &str, _: &Document, _: &Document) -> Result<u64, DbError> {
        Err(DbError::Query("connection reset".into()))
    }
}

// ============================================================
// list_all
// ============================================================

#[tokio::test]
async fn list_all_returns_every_document() {
    let (client, backend, _) = client();
    for id in 1..=3 {
        backend
            .insert_one("users", doc(json!({ "id": id, "name": format!("u{id}") })))
            .await
            .unwrap();
    }
    backend.insert_one("other", doc(json!({ "id": 99 }))).await.unwrap();

    let mut ids: Vec<i64> = client
        .list_all("users")
        .await
        .expect("list should succeed")
        .iter()
        .map(|d| d["id"].as_i64().unwrap())
        .collect();
    ids.sort_unstable();

    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn list_all_on_unknown_collection_is_empty() {
    let (client, _, sink) = client();
    assert!(client.list_all("nothing-here").await.unwrap().is_empty());
    assert!(sink.records().is_empty());
}

// ============================================================
// create_if_absent
// ============================================================

#[tokio::test]
async fn create_then_get_round_trips() {
    let (client, _, _) = client();

    let outcome = client
        .create_if_absent("users", &doc(json!({ "id": 1 })), doc(json!({ "id": 1, "name": "x" })))
        .await
        .unwrap();
    assert_eq!(outcome, CreateOutcome::Created);

    let found = client.get_one("users", &doc(json!({ "id": 1 }))).await.unwrap();
    assert_eq!(Value::Object(found), json!({ "id": 1, "name": "x" }));
}

/// The existence check must look at the lookup result. A second create with
/// the same key is refused instead of inserting a duplicate.
#[tokio::test]
async fn create_twice_with_same_key_inserts_once() {
    let (client, backend, sink) = client();
    let key = doc(json!({ "id": 1 }));

    let first = client
        .create_if_absent("users", &key, doc(json!({ "id": 1, "name": "x" })))
        .await
        .unwrap();
    let second = client
        .create_if_absent("users", &key, doc(json!({ "id": 1, "name": "other" })))
        .await
        .unwrap();

    assert_eq!(first, CreateOutcome::Created);
    assert_eq!(second, CreateOutcome::AlreadyExists);
    assert_eq!(backend.document_count("users").await, 1);

    let stored = client.get_one("users", &key).await.unwrap();
    assert_eq!(stored["name"], "x");

    assert_eq!(
        sink.records(),
        vec![("Document ADD with success in users".to_string(), Severity::Success)]
    );
}

#[tokio::test]
async fn create_with_distinct_keys_grows_collection_by_one_each() {
    let (client, backend, _) = client();

    for id in 1..=3 {
        let outcome = client
            .create_if_absent("users", &doc(json!({ "id": id })), doc(json!({ "id": id })))
            .await
            .unwrap();
        assert_eq!(outcome, CreateOutcome::Created);
        assert_eq!(backend.document_count("users").await, id as usize);
    }
}

#[test]
fn create_outcome_renders_legacy_status_strings() {
    assert_eq!(CreateOutcome::Created.to_string(), "create document");
    assert_eq!(CreateOutcome::AlreadyExists.to_string(), "already existing document");
}

// ============================================================
// update
// ============================================================

#[tokio::test]
async fn update_merges_only_named_fields() {
    let (client, _, sink) = client();
    let key = doc(json!({ "id": 1 }));
    client
        .create_if_absent("users", &key, doc(json!({ "id": 1, "name": "x", "age": 30 })))
        .await
        .unwrap();

    client
        .update("users", &key, &doc(json!({ "name": "y" })))
        .await
        .expect("update should succeed");

    let found = client.get_one("users", &key).await.unwrap();
    assert_eq!(Value::Object(found), json!({ "id": 1, "name": "y", "age": 30 }));
    assert_eq!(sink.count(Severity::Success), 2);
    assert_eq!(
        sink.records().last().unwrap().0,
        "Document EDIT with success in users"
    );
}

#[tokio::test]
async fn update_touches_only_the_first_match() {
    let (client, backend, _) = client();
    backend.insert_one("tasks", doc(json!({ "n": 1, "group": "a" }))).await.unwrap();
    backend.insert_one("tasks", doc(json!({ "n": 2, "group": "a" }))).await.unwrap();

    client
        .update("tasks", &doc(json!({ "group": "a" })), &doc(json!({ "done": true })))
        .await
        .unwrap();

    let all = client.list_all("tasks").await.unwrap();
    assert_eq!(Value::Object(all[0].clone()), json!({ "n": 1, "group": "a", "done": true }));
    assert_eq!(Value::Object(all[1].clone()), json!({ "n": 2, "group": "a" }));
}

#[tokio::test]
async fn update_without_match_is_not_found_and_changes_nothing() {
    let (client, backend, sink) = client();
    backend.insert_one("users", doc(json!({ "id": 1 }))).await.unwrap();

    let result = client
        .update("users", &doc(json!({ "id": 2 })), &doc(json!({ "name": "y" })))
        .await;

    assert!(matches!(result, Err(DbError::NotFound)));
    assert_eq!(client.list_all("users").await.unwrap(), vec![doc(json!({ "id": 1 }))]);
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn update_with_no_fields_is_rejected_and_logged() {
    let (client, _, sink) = client();

    let result = client
        .update("users", &doc(json!({ "id": 1 })), &Document::new())
        .await;

    assert!(matches!(result, Err(DbError::Query(_))));
    assert_eq!(sink.count(Severity::Error), 1);
}

// ============================================================
// get_one
// ============================================================

#[tokio::test]
async fn get_one_missing_is_not_found() {
    let (client, _, sink) = client();
    let result = client.get_one("users", &doc(json!({ "id": 42 }))).await;
    assert!(matches!(result, Err(DbError::NotFound)));
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn get_one_is_idempotent_and_read_only() {
    let (client, backend, _) = client();
    backend.insert_one("users", doc(json!({ "id": 1, "name": "x" }))).await.unwrap();
    backend.insert_one("users", doc(json!({ "id": 1, "name": "dup" }))).await.unwrap();
    let key = doc(json!({ "id": 1 }));

    let first = client.get_one("users", &key).await.unwrap();
    let second = client.get_one("users", &key).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first["name"], "x");
    assert_eq!(backend.document_count("users").await, 2);
}

// ============================================================
// failures are logged and returned
// ============================================================

#[tokio::test]
async fn store_failures_surface_as_query_errors_and_are_logged() {
    let sink = RecordingSink::new();
    let client = DocumentStoreClient::with_backend(Arc::new(FailingBackend), Arc::new(sink.clone()));
    let key = doc(json!({ "id": 1 }));
    let fields = doc(json!({ "name": "x" }));

    assert!(matches!(client.list_all("users").await, Err(DbError::Query(_))));
    assert!(matches!(
        client.create_if_absent("users", &key, fields.clone()).await,
        Err(DbError::Query(_))
    ));
    assert!(matches!(client.update("users", &key, &fields).await, Err(DbError::Query(_))));
    assert!(matches!(client.get_one("users", &key).await, Err(DbError::Query(_))));

    let records = sink.records();
    assert_eq!(records.len(), 4);
    assert!(records
        .iter()
        .all(|(msg, sev)| *sev == Severity::Error && msg.contains("connection reset")));
}

#[tokio::test]
async fn connect_with_missing_db_name_is_a_logged_configuration_error() {
    let sink = RecordingSink::new();
    let result = DocumentStoreClient::connect(&StoreConfig::default(), Arc::new(sink.clone())).await;

    assert!(matches!(result, Err(DbError::Configuration(_))));
    assert_eq!(sink.count(Severity::Error), 1);
}

#[tokio::test]
async fn connect_with_unsupported_scheme_is_a_connect_error() {
    let sink = RecordingSink::new();
    let config = StoreConfig { scheme: "postgres".into(), ..StoreConfig::new("appdb") };

    let result = DocumentStoreClient::connect(&config, Arc::new(sink.clone())).await;

    assert!(matches!(result, Err(DbError::Connect(_))));
    assert_eq!(sink.count(Severity::Error), 1);
}
