//! Narrow interface to the hosted document database.
//!
//! The relay only ever touches the backend through six calls: get a single
//! document, merge-write a single document, add to a collection, list a
//! collection in field order, delete one collection entry, and observe a
//! change signal for a collection. Everything else about the backend
//! (storage engine, indexing, replication) stays on the other side of this
//! seam.
//!
//! Two implementations ship: [`RestDocumentStore`] for the hosted backend
//! and [`MemoryDocumentStore`] for tests and local runs.

pub mod error;
pub mod memory;
pub mod rest;
pub mod store;

pub use {
    error::{Error, Result},
    memory::MemoryDocumentStore,
    rest::RestDocumentStore,
    store::DocumentStore,
};

/// Shared HTTP client for document-store backends.
///
/// Reused so all remote stores share connection pools, DNS cache, and TLS
/// sessions.
pub fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}
