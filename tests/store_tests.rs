/// Document Store Tests
///
/// Exercises the in-process `MemoryStore` against the `DocumentStore`
/// contract: ordered queries, partial updates, the missing-document error,
/// and the injected read failures the resolver tests rely on.
use heritage_portal::store::{DocumentStore, MemoryStore, StoreError};
use serde_json::{Value, json};

#[tokio::test]
async fn memory_store_orders_by_requested_field() {
    let store = MemoryStore::new();
    store
        .set_document("content_herb", "b", json!({"title": "ข่า"}))
        .await
        .unwrap();
    store
        .set_document("content_herb", "a", json!({"title": "กระชาย"}))
        .await
        .unwrap();

    let docs = store
        .query_collection("content_herb", "title")
        .await
        .unwrap();
    let titles: Vec<&str> = docs
        .iter()
        .map(|d| d.fields.get("title").and_then(Value::as_str).unwrap())
        .collect();
    assert_eq!(titles, vec!["กระชาย", "ข่า"]);
}

#[tokio::test]
async fn memory_store_partial_update_keeps_other_fields() {
    let store = MemoryStore::new();
    store
        .set_document("users", "u1", json!({"name": "Ann", "role": "user"}))
        .await
        .unwrap();
    store
        .update_document("users", "u1", json!({"role": "admin"}))
        .await
        .unwrap();

    let doc = store.get_document("users", "u1").await.unwrap().unwrap();
    assert_eq!(doc.fields.get("name").and_then(Value::as_str), Some("Ann"));
    assert_eq!(doc.fields.get("role").and_then(Value::as_str), Some("admin"));
}

#[tokio::test]
async fn memory_store_update_of_missing_document_is_not_found() {
    let store = MemoryStore::new();
    let err = store
        .update_document("users", "ghost", json!({"role": "admin"}))
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound);
}

#[tokio::test]
async fn memory_store_set_replaces_whole_document() {
    let store = MemoryStore::new();
    store
        .set_document("users", "u1", json!({"name": "Ann", "role": "admin"}))
        .await
        .unwrap();
    store
        .set_document("users", "u1", json!({"name": "Ann B"}))
        .await
        .unwrap();

    let doc = store.get_document("users", "u1").await.unwrap().unwrap();
    assert_eq!(doc.fields.get("role"), None);
}

#[tokio::test]
async fn memory_store_delete_reports_whether_anything_was_removed() {
    let store = MemoryStore::new();
    store
        .set_document("users", "u1", json!({"name": "Ann"}))
        .await
        .unwrap();

    assert!(store.delete_document("users", "u1").await.unwrap());
    assert!(!store.delete_document("users", "u1").await.unwrap());
    assert!(store.get_document("users", "u1").await.unwrap().is_none());
}

#[tokio::test]
async fn memory_store_injected_failure_hits_reads_only() {
    let store = MemoryStore::new();
    store.fail_reads_with(StoreError::PermissionDenied);

    store
        .set_document("users", "u1", json!({"email": "a@x.com"}))
        .await
        .expect("writes stay unaffected");
    let err = store.get_document("users", "u1").await.unwrap_err();
    assert_eq!(err, StoreError::PermissionDenied);

    store.clear_read_failure();
    assert!(store.get_document("users", "u1").await.unwrap().is_some());
}
