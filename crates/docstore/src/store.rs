use {async_trait::async_trait, serde_json::Value, tokio::sync::broadcast};

use crate::error::Result;

/// The document-database operations the relay needs, and nothing more.
///
/// Paths are slash-separated, e.g. `users/u1` for a single document and
/// `users/u1/chats/default/messages` for a collection. Documents travel as
/// JSON values; callers own the shape of their own documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a single document. `Ok(None)` when it does not exist.
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// Merge-write fields into a single document, creating it if absent.
    /// Fields not named in `fields` are preserved, never nulled.
    async fn merge(&self, path: &str, fields: Value) -> Result<()>;

    /// Add a new document to a collection. Returns the generated document id.
    async fn add(&self, collection: &str, doc: Value) -> Result<String>;

    /// List a collection ordered ascending by the named field.
    /// Returns `(document id, document)` pairs.
    async fn list(&self, collection: &str, order_by: &str) -> Result<Vec<(String, Value)>>;

    /// Delete one document from a collection. Deleting a missing document
    /// is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// A change signal for a collection: one unit per observed mutation.
    /// Consumers refetch a full snapshot on every signal; the signal itself
    /// carries no data, so a lagged receiver loses nothing.
    fn changes(&self, collection: &str) -> broadcast::Receiver<()>;
}
