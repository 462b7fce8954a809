use {
    tokio::sync::watch,
    tracing::{debug, warn},
};

use {
    wren_auth::Identity,
    wren_common::Role,
    wren_credentials::CredentialStore,
    wren_providers::ModelGateway,
    wren_sessions::{ConversationLog, HISTORY_LIMIT},
};

/// Assistant reply when the user has no API key on record.
pub const NO_KEY_REPLY: &str =
    "I cannot respond because no API key is configured. Please set up your API key in the settings.";

/// Assistant reply when any step after the user's message is persisted
/// fails. Upstream error detail goes to the log, never the transcript.
pub const ERROR_REPLY: &str =
    "Sorry, I encountered an error while processing your message. Please try again.";

/// One signed-in user's active conversation.
pub struct ChatSession {
    identity: Identity,
    credentials: CredentialStore,
    log: ConversationLog,
    gateway: ModelGateway,
    composing: watch::Sender<bool>,
    history_limit: usize,
}

impl ChatSession {
    #[must_use]
    pub fn new(
        identity: Identity,
        credentials: CredentialStore,
        log: ConversationLog,
        gateway: ModelGateway,
    ) -> Self {
        let (composing, _) = watch::channel(false);
        Self {
            identity,
            credentials,
            log,
            gateway,
            composing,
            history_limit: HISTORY_LIMIT,
        }
    }

    /// Override how many trailing messages go to the model.
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// True while a reply is being composed. Observers can use this to show
    /// a typing indicator.
    #[must_use]
    pub fn composing(&self) -> watch::Receiver<bool> {
        self.composing.subscribe()
    }

    /// Run one message round-trip.
    ///
    /// Whitespace-only input is a no-op. Otherwise the user's message is
    /// persisted, then credential, history, and completion are resolved in
    /// turn. Every failure, the first persist included, degrades to a fixed
    /// assistant reply instead of an error: a conversation surface must
    /// survive a store hiccup, and upstream detail belongs in the log, not
    /// the transcript.
    pub async fn submit(&self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("ignoring empty submission");
            return;
        }

        if let Err(error) = self.log.append(Role::User, trimmed).await {
            warn!(%error, "failed to persist user message");
            self.append_reply(ERROR_REPLY.to_string()).await;
            return;
        }

        self.composing.send_replace(true);
        let reply = self.compose_reply().await;
        self.composing.send_replace(false);

        self.append_reply(reply).await;
    }

    /// Best effort: if even the reply cannot be persisted, the failure is
    /// logged and the transcript simply stays short.
    async fn append_reply(&self, reply: String) {
        if let Err(error) = self.log.append(Role::Assistant, reply).await {
            warn!(%error, "failed to persist assistant reply");
        }
    }

    /// Produce the assistant's reply text. Infallible: every failure maps
    /// to one of the fixed replies.
    async fn compose_reply(&self) -> String {
        let credential = match self.credentials.load(Some(&self.identity)).await {
            Ok(Some(credential)) => credential,
            Ok(None) => return NO_KEY_REPLY.to_string(),
            Err(error) => {
                warn!(%error, "credential lookup failed");
                return ERROR_REPLY.to_string();
            }
        };

        let turns = match self.log.history(self.history_limit).await {
            Ok(turns) => turns,
            Err(error) => {
                warn!(%error, "history read failed");
                return ERROR_REPLY.to_string();
            }
        };

        match self.gateway.send(&turns, Some(&credential)).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(%error, "completion request failed");
                ERROR_REPLY.to_string()
            }
        }
    }
}
