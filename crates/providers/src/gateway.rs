use {
    secrecy::ExposeSecret,
    serde_json::{Value, json},
    tracing::debug,
};

use {
    wren_common::ChatTurn,
    wren_credentials::{ProviderKind, UserCredential},
};

use crate::error::{Error, Result};

/// Completion length cap sent with every request.
pub const MAX_TOKENS: u32 = 1000;
/// Sampling temperature sent with every request.
pub const TEMPERATURE: f64 = 0.7;

/// One provider's chat-completion endpoint and its fixed model id.
struct Adapter {
    name: &'static str,
    model: &'static str,
    base_url: String,
}

/// Sends conversation history to whichever provider the user's credential
/// names and returns the assistant's reply text.
pub struct ModelGateway {
    openai: Adapter,
    together: Adapter,
    client: &'static reqwest::Client,
}

impl Default for ModelGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_urls("https://api.openai.com/v1", "https://api.together.xyz/v1")
    }

    /// Gateway with overridden endpoints. Model ids and request parameters
    /// stay fixed; only the hosts move.
    #[must_use]
    pub fn with_base_urls(openai_base: impl Into<String>, together_base: impl Into<String>) -> Self {
        Self {
            openai: Adapter {
                name: "OpenAI",
                model: "gpt-4o",
                base_url: openai_base.into(),
            },
            together: Adapter {
                name: "Together",
                model: "meta-llama/Llama-2-70b-chat-hf",
                base_url: together_base.into(),
            },
            client: crate::shared_http_client(),
        }
    }

    fn adapter(&self, kind: ProviderKind) -> &Adapter {
        match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Together => &self.together,
        }
    }

    /// Send `turns` as one chat-completion request.
    ///
    /// The whole history goes in the request body; the providers are
    /// stateless between calls. Returns the first choice's message content.
    pub async fn send(
        &self,
        turns: &[ChatTurn],
        credential: Option<&UserCredential>,
    ) -> Result<String> {
        let credential = credential.ok_or(Error::NoCredential)?;
        let adapter = self.adapter(credential.provider);
        debug!(
            provider = adapter.name,
            model = adapter.model,
            turns = turns.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", adapter.base_url))
            .bearer_auth(credential.api_key.expose_secret())
            .json(&json!({
                "model": adapter.model,
                "messages": turns,
                "max_tokens": MAX_TOKENS,
                "temperature": TEMPERATURE,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                provider: adapter.name,
                status: status.as_u16(),
                message: upstream_error_message(&body),
            });
        }

        let body: Value = response.json().await?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::message("completion response carried no message content"))
    }
}

/// Pull the error text out of an OpenAI-style `{"error": {"message": ...}}`
/// body, falling back to the raw body for anything else.
fn upstream_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
