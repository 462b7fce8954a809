use wren_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operation that requires an active identity was called without one.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A stored credential names a provider this build does not know.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider { name: String },

    #[error(transparent)]
    Store(#[from] wren_docstore::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn unsupported_provider(name: impl Into<String>) -> Self {
        Self::UnsupportedProvider { name: name.into() }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

wren_common::impl_context!();
