//! Per-user conversation persistence and the live message feed.
//!
//! Messages live as documents under `users/{user_id}/chats/{chat_id}/messages`
//! and carry an RFC 3339 timestamp that doubles as the sort key. The log is
//! append-only in normal operation; `clear` exists as an explicit reset.

pub mod error;
pub mod feed;
pub mod log;

pub use {
    error::{Error, Result},
    feed::{LiveFeed, Subscription},
    log::{ConversationKey, ConversationLog, HISTORY_LIMIT, MessageRecord},
};
