//! Identity resolution and post-auth routing.
//!
//! This crate owns the one piece of genuinely stateful startup logic in the
//! relay: deciding exactly once per process whether a user is signed in,
//! and which surface (chat or setup) they should land on. Two resolution
//! paths race — the provider's cached/observed state and a pending
//! interactive-result check — and the first to report wins; a bounded wait
//! covers the case where the provider never reports at all.

pub mod error;
pub mod http;
pub mod identity;
pub mod routing;
pub mod startup;

pub use {
    error::{Error, Result},
    http::HttpIdentityProvider,
    identity::{Identity, IdentityProvider},
    routing::{Surface, route_after_auth},
    startup::{AuthState, STARTUP_WAIT, resolve_on_startup},
};
