use serde::{Deserialize, Serialize};

/// Top-level configuration. Every section and field has a default so the
/// binary runs without any config file at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WrenConfig {
    pub identity: IdentityConfig,
    pub docstore: DocstoreConfig,
    pub providers: ProviderEndpoints,
    pub chat: ChatConfig,
}

/// Identity service endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    pub base_url: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9099".to_string(),
        }
    }
}

/// Document store endpoint and optional bearer token. The token value
/// usually arrives via `${ENV_VAR}` substitution rather than being written
/// into the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocstoreConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
}

impl Default for DocstoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            auth_token: None,
        }
    }
}

/// Completion endpoint overrides, one section per supported provider.
/// Model ids are fixed per provider and are not configurable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderEndpoints {
    pub openai: ProviderEndpoint,
    pub together: ProviderEndpoint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderEndpoint {
    pub base_url: Option<String>,
}

impl ProviderEndpoints {
    /// OpenAI endpoint, configured or default.
    #[must_use]
    pub fn openai_base_url(&self) -> String {
        self.openai
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
    }

    /// Together endpoint, configured or default.
    #[must_use]
    pub fn together_base_url(&self) -> String {
        self.together
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.together.xyz/v1".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatConfig {
    pub chat_id: String,
    /// How many trailing messages go to the model with each request.
    pub history_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            chat_id: "default".to_string(),
            history_limit: 20,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config: WrenConfig = toml::from_str("").unwrap();
        assert_eq!(config, WrenConfig::default());
        assert_eq!(config.chat.chat_id, "default");
        assert_eq!(config.chat.history_limit, 20);
        assert!(config.docstore.auth_token.is_none());
        assert_eq!(
            config.providers.openai_base_url(),
            "https://api.openai.com/v1"
        );
    }

    #[test]
    fn partial_sections_keep_defaults_elsewhere() {
        let config: WrenConfig = toml::from_str(
            r#"
            [docstore]
            base_url = "https://store.example.com"
            auth_token = "tok"

            [providers.together]
            base_url = "https://llm.internal/v1"
            "#,
        )
        .unwrap();
        assert_eq!(config.docstore.base_url, "https://store.example.com");
        assert_eq!(config.docstore.auth_token.as_deref(), Some("tok"));
        assert_eq!(
            config.providers.together_base_url(),
            "https://llm.internal/v1"
        );
        assert_eq!(
            config.providers.openai_base_url(),
            "https://api.openai.com/v1"
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<WrenConfig>("[chat]\nchatid = \"x\"\n").is_err());
    }
}
