use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tokio::sync::watch,
};

use crate::error::Result;

/// An authenticated identity as reported by the provider.
///
/// `user_id` is the only field business logic depends on; name and email
/// exist for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            email: None,
        }
    }
}

/// The narrow surface of the third-party identity provider.
///
/// Two ways of learning about an identity coexist: the blocking
/// interactive flow ([`sign_in`](IdentityProvider::sign_in)) and the
/// deferred flow, where a previously started interactive sign-in completes
/// out of band and is picked up at startup via
/// [`redirect_result`](IdentityProvider::redirect_result). Both feed the
/// same observable state.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the interactive sign-in flow to completion.
    async fn sign_in(&self) -> Result<Identity>;

    /// One-shot check for an interactive result that completed while this
    /// process was not running. `Ok(None)` when nothing is pending.
    async fn redirect_result(&self) -> Result<Option<Identity>>;

    /// Observable authentication state. Seeded with any cached session the
    /// provider already knows about.
    fn observe(&self) -> watch::Receiver<Option<Identity>>;

    /// The currently authenticated identity, if any.
    fn current(&self) -> Option<Identity>;

    /// Terminate the session. Idempotent.
    async fn sign_out(&self) -> Result<()>;
}
