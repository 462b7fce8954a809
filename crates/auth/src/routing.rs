use tracing::{debug, warn};

use crate::identity::Identity;

/// The page surface a freshly authenticated user lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// A credential is on record; go straight to the conversation.
    Chat,
    /// No credential yet; go to key setup.
    Setup,
}

/// The exactly-once post-auth routing decision.
///
/// `lookup` asks the credential store whether this user has a key on
/// record. A lookup failure never fails the startup — we route to setup,
/// where the user can (re-)enter a key.
pub async fn route_after_auth<F, Fut, C, E>(identity: &Identity, lookup: F) -> Surface
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<Option<C>, E>>,
    E: std::fmt::Display,
{
    match lookup(identity.user_id.clone()).await {
        Ok(Some(_)) => {
            debug!(user_id = %identity.user_id, "credential on record, routing to chat");
            Surface::Chat
        },
        Ok(None) => {
            debug!(user_id = %identity.user_id, "no credential on record, routing to setup");
            Surface::Setup
        },
        Err(err) => {
            warn!(user_id = %identity.user_id, error = %err, "credential lookup failed, defaulting to setup");
            Surface::Setup
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn credential_on_record_routes_to_chat() {
        let surface = route_after_auth(&Identity::new("u1"), |_uid| async {
            Ok::<_, crate::Error>(Some("credential"))
        })
        .await;
        assert_eq!(surface, Surface::Chat);
    }

    #[tokio::test]
    async fn missing_credential_routes_to_setup() {
        let surface = route_after_auth(&Identity::new("u1"), |_uid| async {
            Ok::<Option<&str>, crate::Error>(None)
        })
        .await;
        assert_eq!(surface, Surface::Setup);
    }

    #[tokio::test]
    async fn lookup_failure_defaults_to_setup() {
        let surface = route_after_auth(&Identity::new("u1"), |_uid| async {
            Err::<Option<&str>, _>(crate::Error::message("backend down"))
        })
        .await;
        assert_eq!(surface, Surface::Setup);
    }
}
