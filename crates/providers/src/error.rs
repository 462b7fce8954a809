use wren_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `send` was called without a credential. Callers are expected to
    /// check first; this guard exists for the ones that do not.
    #[error("no API key configured")]
    NoCredential,

    /// The upstream answered with a non-success status. `message` is the
    /// upstream-supplied error text when the body carries one.
    #[error("{provider} API error HTTP {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

wren_common::impl_context!();
