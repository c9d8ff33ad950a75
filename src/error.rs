//! Error types for docgate

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure surfaced by the gateway originates from a backend operation.
/// The variants only describe how it failed; callers treat them uniformly
/// except for [`Error::NotFound`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("Document not found: {index}/{id}")]
    NotFound { index: String, id: String },

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation abandoned before completion")]
    Abandoned,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(index: impl Into<String>, id: impl Into<String>) -> Self {
        Error::NotFound {
            index: index.into(),
            id: id.into(),
        }
    }

    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Error::Backend {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Error::InvalidResponse(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
