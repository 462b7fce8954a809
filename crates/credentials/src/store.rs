use std::sync::Arc;

use {
    chrono::{SecondsFormat, Utc},
    secrecy::Secret,
    serde_json::{Value, json},
    tracing::debug,
};

use {wren_auth::Identity, wren_docstore::DocumentStore};

use crate::{
    error::{Error, Result},
    provider::ProviderKind,
};

/// A user's stored provider credential. The key itself debug-prints
/// redacted.
#[derive(Debug, Clone)]
pub struct UserCredential {
    pub api_key: Secret<String>,
    pub provider: ProviderKind,
    pub updated_at: Option<String>,
}

/// Reads and merge-upserts the credential document at `users/{user_id}`.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn DocumentStore>,
}

fn doc_path(user_id: &str) -> String {
    format!("users/{user_id}")
}

impl CredentialStore {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Upsert the credential for the active identity.
    ///
    /// Merge semantics: fields this write does not name are preserved on
    /// the user document. Backend failures surface to the caller; there is
    /// no retry here.
    pub async fn save(
        &self,
        identity: Option<&Identity>,
        api_key: &str,
        provider: ProviderKind,
    ) -> Result<()> {
        let identity = identity.ok_or(Error::NotAuthenticated)?;
        let fields = json!({
            "apiKey": api_key,
            "provider": provider,
            "updatedAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        self.store
            .merge(&doc_path(&identity.user_id), fields)
            .await?;
        debug!(user_id = %identity.user_id, provider = %provider, "saved credential");
        Ok(())
    }

    /// Load the credential for the active identity, or `None` when no key
    /// is on record. A document without an `apiKey` field counts as no
    /// credential; a missing `provider` field defaults to `openai`.
    pub async fn load(&self, identity: Option<&Identity>) -> Result<Option<UserCredential>> {
        let identity = identity.ok_or(Error::NotAuthenticated)?;
        let Some(doc) = self.store.get(&doc_path(&identity.user_id)).await? else {
            return Ok(None);
        };
        let Some(api_key) = doc
            .get("apiKey")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
        else {
            return Ok(None);
        };
        let provider = ProviderKind::parse(doc.get("provider").and_then(Value::as_str))?;
        let updated_at = doc
            .get("updatedAt")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Some(UserCredential {
            api_key: Secret::new(api_key.to_string()),
            provider,
            updated_at,
        }))
    }
}
