//! Shared types and error plumbing used across all wren crates.

pub mod error;
pub mod message;

pub use {
    error::{Error, FromMessage, Result},
    message::{ChatTurn, Role},
};
