use wren_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The provider rejected the request outright — wrong project id,
    /// missing client configuration, malformed request.
    #[error("identity provider is misconfigured: {message}")]
    Misconfigured { message: String },

    /// The provider refused this caller. Typically the running origin or
    /// host has not been allow-listed with the provider.
    #[error("this origin is not authorized for sign-in: {message}")]
    UnauthorizedOrigin { message: String },

    /// The user dismissed the interactive flow before it completed.
    #[error("sign-in was cancelled")]
    Cancelled,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

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
