use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    serde_json::Value,
    tokio::sync::broadcast,
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    store::DocumentStore,
};

/// Document store backed by a hosted JSON-over-HTTP document API.
///
/// Wire shape:
/// - `GET {base}/{path}` — single document, 404 when absent
/// - `PATCH {base}/{path}` — merge-write fields
/// - `POST {base}/{collection}` — add, responds `{"id": "..."}`
/// - `GET {base}/{collection}?order_by={field}` — ordered listing of
///   `{"id": "...", "doc": {...}}` entries
/// - `DELETE {base}/{collection}/{id}` — remove one entry
///
/// The change signal fires after this client's own successful writes.
/// Server-push change notification is the backend's business, not ours.
pub struct RestDocumentStore {
    base_url: String,
    auth_token: Option<Secret<String>>,
    client: &'static reqwest::Client,
    signals: Mutex<HashMap<String, broadcast::Sender<()>>>,
}

#[derive(Deserialize)]
struct AddResponse {
    id: String,
}

#[derive(Deserialize)]
struct ListEntry {
    id: String,
    doc: Value,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RestDocumentStore {
    #[must_use]
    pub fn new(base_url: impl Into<String>, auth_token: Option<Secret<String>>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token,
            client: crate::shared_http_client(),
            signals: Mutex::new(HashMap::new()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header(
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            ),
            None => request,
        }
    }

    fn signal(&self, key: &str) {
        if let Some(tx) = lock(&self.signals).get(key) {
            let _ = tx.send(());
        }
    }

    async fn fail_from(response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Error::backend(status, body)
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let response = self.authorize(self.client.get(self.url(path))).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::fail_from(response).await);
        }
        Ok(Some(response.json().await?))
    }

    async fn merge(&self, path: &str, fields: Value) -> Result<()> {
        let response = self
            .authorize(self.client.patch(self.url(path)))
            .json(&fields)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail_from(response).await);
        }
        debug!(path, "merged document");
        self.signal(path);
        Ok(())
    }

    async fn add(&self, collection: &str, doc: Value) -> Result<String> {
        let response = self
            .authorize(self.client.post(self.url(collection)))
            .json(&doc)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail_from(response).await);
        }
        let added: AddResponse = response.json().await?;
        debug!(collection, id = %added.id, "added document");
        self.signal(collection);
        Ok(added.id)
    }

    async fn list(&self, collection: &str, order_by: &str) -> Result<Vec<(String, Value)>> {
        let response = self
            .authorize(self.client.get(self.url(collection)))
            .query(&[("order_by", order_by)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail_from(response).await);
        }
        let entries: Vec<ListEntry> = response.json().await?;
        Ok(entries.into_iter().map(|e| (e.id, e.doc)).collect())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let response = self
            .authorize(self.client.delete(self.url(&format!("{collection}/{id}"))))
            .send()
            .await?;
        // A missing document counts as deleted.
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(Self::fail_from(response).await);
        }
        self.signal(collection);
        Ok(())
    }

    fn changes(&self, collection: &str) -> broadcast::Receiver<()> {
        lock(&self.signals)
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(16).0)
            .subscribe()
    }
}
