/// Current UTC timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a fresh document id.
///
/// Catalog documents and transactions are keyed by random UUID strings,
/// following the document-store convention of the CRUD layer that feeds
/// the catalog.
pub fn new_doc_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
