use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use {async_trait::async_trait, serde_json::Value, tokio::sync::broadcast};

use crate::{
    error::Result,
    store::DocumentStore,
};

/// In-process document store used by tests and local runs.
///
/// Mutations signal the collection's change channel the same way the remote
/// store does after a successful write, so live-sync consumers behave
/// identically against either backend.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: Mutex<HashMap<String, Value>>,
    collections: Mutex<HashMap<String, Vec<(String, Value)>>>,
    signals: Mutex<HashMap<String, broadcast::Sender<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn signal(&self, key: &str) {
        if let Some(tx) = lock(&self.signals).get(key) {
            // No receivers is fine; nobody is watching yet.
            let _ = tx.send(());
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        Ok(lock(&self.docs).get(path).cloned())
    }

    async fn merge(&self, path: &str, fields: Value) -> Result<()> {
        {
            let mut docs = lock(&self.docs);
            let entry = docs
                .entry(path.to_string())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            match (entry.as_object_mut(), fields.as_object()) {
                (Some(existing), Some(incoming)) => {
                    for (key, value) in incoming {
                        existing.insert(key.clone(), value.clone());
                    }
                },
                _ => *entry = fields,
            }
        }
        self.signal(path);
        Ok(())
    }

    async fn add(&self, collection: &str, doc: Value) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), doc));
        self.signal(collection);
        Ok(id)
    }

    async fn list(&self, collection: &str, order_by: &str) -> Result<Vec<(String, Value)>> {
        let mut entries = lock(&self.collections)
            .get(collection)
            .cloned()
            .unwrap_or_default();
        entries.sort_by(|(_, a), (_, b)| {
            let a = a.get(order_by).and_then(Value::as_str).unwrap_or("");
            let b = b.get(order_by).and_then(Value::as_str).unwrap_or("");
            a.cmp(b)
        });
        Ok(entries)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let removed = {
            let mut collections = lock(&self.collections);
            match collections.get_mut(collection) {
                Some(entries) => {
                    let before = entries.len();
                    entries.retain(|(entry_id, _)| entry_id != id);
                    entries.len() != before
                },
                None => false,
            }
        };
        if removed {
            self.signal(collection);
        }
        Ok(())
    }

    fn changes(&self, collection: &str) -> broadcast::Receiver<()> {
        lock(&self.signals)
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(16).0)
            .subscribe()
    }
}
