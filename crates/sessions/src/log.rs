use std::sync::Arc;

use {
    chrono::{SecondsFormat, Utc},
    futures::future::join_all,
    serde::{Deserialize, Serialize},
    serde_json::{Value, json},
    tracing::{debug, warn},
};

use {
    wren_common::{ChatTurn, Role},
    wren_docstore::DocumentStore,
};

use crate::error::Result;

/// How many trailing messages `history` returns for a model request.
pub const HISTORY_LIMIT: usize = 20;

/// Identifies one user's conversation. Every user currently has a single
/// conversation named `default`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationKey {
    pub user_id: String,
    pub chat_id: String,
}

impl ConversationKey {
    #[must_use]
    pub fn new(user_id: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            chat_id: chat_id.into(),
        }
    }

    #[must_use]
    pub fn default_chat(user_id: impl Into<String>) -> Self {
        Self::new(user_id, "default")
    }

    /// Collection path holding this conversation's message documents.
    #[must_use]
    pub fn collection(&self) -> String {
        format!("users/{}/chats/{}/messages", self.user_id, self.chat_id)
    }
}

/// One persisted message. `timestamp` is RFC 3339 with millisecond
/// precision so lexicographic order matches chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(skip)]
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

impl MessageRecord {
    #[must_use]
    pub fn turn(&self) -> ChatTurn {
        ChatTurn::new(self.role, &self.content)
    }
}

/// Append-only message log for one conversation.
#[derive(Clone)]
pub struct ConversationLog {
    store: Arc<dyn DocumentStore>,
    key: ConversationKey,
}

impl ConversationLog {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, key: ConversationKey) -> Self {
        Self { store, key }
    }

    #[must_use]
    pub fn key(&self) -> &ConversationKey {
        &self.key
    }

    /// Persist one message, stamping it with the current time. Returns the
    /// stored record including its backend-assigned id.
    pub async fn append(&self, role: Role, content: impl Into<String>) -> Result<MessageRecord> {
        let content = content.into();
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let doc = json!({
            "role": role,
            "content": content,
            "timestamp": timestamp,
        });
        let id = self.store.add(&self.key.collection(), doc).await?;
        debug!(id = %id, role = %role, "appended message");
        Ok(MessageRecord {
            id,
            role,
            content,
            timestamp,
        })
    }

    /// All messages, oldest first. Documents that fail to deserialize are
    /// skipped with a warning rather than poisoning the whole snapshot.
    pub async fn snapshot(&self) -> Result<Vec<MessageRecord>> {
        let docs = self.store.list(&self.key.collection(), "timestamp").await?;
        let mut records = Vec::with_capacity(docs.len());
        for (id, doc) in docs {
            match serde_json::from_value::<MessageRecord>(doc) {
                Ok(mut record) => {
                    record.id = id;
                    records.push(record);
                }
                Err(error) => warn!(id = %id, %error, "skipping malformed message document"),
            }
        }
        Ok(records)
    }

    /// The last `limit` messages as model-ready turns, oldest first.
    pub async fn history(&self, limit: usize) -> Result<Vec<ChatTurn>> {
        let records = self.snapshot().await?;
        let start = records.len().saturating_sub(limit);
        Ok(records[start..].iter().map(MessageRecord::turn).collect())
    }

    /// Delete every message in the conversation. Deletes run concurrently;
    /// the first failure is surfaced after all of them settle.
    pub async fn clear(&self) -> Result<()> {
        let collection = self.key.collection();
        let records = self.snapshot().await?;
        let deletes = records
            .iter()
            .map(|record| self.store.delete(&collection, &record.id));
        let results = join_all(deletes).await;
        let total = results.len();
        for outcome in results {
            outcome?;
        }
        debug!(count = total, "cleared conversation");
        Ok(())
    }
}
