use std::time::Duration;

use tracing::{debug, warn};

use crate::identity::{Identity, IdentityProvider};

/// How long startup waits for the provider to report before giving up.
pub const STARTUP_WAIT: Duration = Duration::from_secs(15);

/// Outcome of the startup resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Authenticated(Identity),
    Unauthenticated,
}

/// Resolve the authentication state exactly once at process startup.
///
/// Two paths race: the provider's observable state (which is seeded with
/// any cached session) and the one-shot pending-result check. Whichever
/// reports an identity first wins; the losing branch is dropped with the
/// `select`, so a late second report cannot trigger anything. If neither
/// path reports within `wait`, the state resolves to `Unauthenticated`.
///
/// A failing pending-result check only disables that path — the
/// observation path keeps waiting until the deadline.
pub async fn resolve_on_startup(provider: &dyn IdentityProvider, wait: Duration) -> AuthState {
    let mut observed = provider.observe();

    let via_observation = async move {
        loop {
            if let Some(identity) = observed.borrow_and_update().clone() {
                debug!(user_id = %identity.user_id, "identity resolved via state observation");
                return identity;
            }
            if observed.changed().await.is_err() {
                // Provider dropped its state channel; nothing more will come
                // from this path.
                futures::future::pending::<()>().await;
            }
        }
    };

    let via_redirect = async {
        match provider.redirect_result().await {
            Ok(Some(identity)) => {
                debug!(user_id = %identity.user_id, "identity resolved via pending interactive result");
                identity
            },
            Ok(None) => futures::future::pending().await,
            Err(err) => {
                warn!(error = %err, "pending sign-in check failed");
                futures::future::pending().await
            },
        }
    };

    let first = async {
        tokio::select! {
            identity = via_observation => identity,
            identity = via_redirect => identity,
        }
    };

    match tokio::time::timeout(wait, first).await {
        Ok(identity) => AuthState::Authenticated(identity),
        Err(_) => {
            debug!("no identity reported before the startup deadline");
            AuthState::Unauthenticated
        },
    }
}
