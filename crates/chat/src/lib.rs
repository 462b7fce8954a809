//! The message round-trip: persist the user's message, gather context,
//! call the model, persist the reply.
//!
//! Submission never surfaces errors; failures become fixed assistant
//! replies so the conversation stays coherent and upstream error detail
//! stays out of the transcript.

pub mod render;
pub mod session;

pub use session::{ChatSession, ERROR_REPLY, NO_KEY_REPLY};
