//! Per-user provider API keys.
//!
//! One credential document per user identity at `users/{user_id}`, written
//! with merge semantics so unrelated fields on the user document survive a
//! key update. Keys are never encrypted at rest by this crate; that is the
//! backend's concern.

pub mod error;
pub mod provider;
pub mod store;

pub use {
    error::{Error, Result},
    provider::ProviderKind,
    store::{CredentialStore, UserCredential},
};
