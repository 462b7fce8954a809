//! The model gateway: one `send` over a closed set of provider adapters.
//!
//! Each supported provider maps to a chat-completion adapter with a fixed
//! endpoint and model id. The request/response shapes are the small
//! OpenAI-compatible subset this relay actually uses; anything else about
//! the upstream APIs is out of scope.

pub mod error;
pub mod gateway;

pub use {
    error::{Error, Result},
    gateway::{MAX_TOKENS, ModelGateway, TEMPERATURE},
};

/// Shared HTTP client for completion requests.
///
/// Reused across gateways to share connection pools, DNS cache, and TLS
/// sessions.
pub fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}
