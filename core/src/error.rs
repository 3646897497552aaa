//! Error types for the JSON:API adapter.
//!
//! # Design
//! One enum covers every way a CRUD call can fail. The three response
//! classifications (`Transport`, `Api`, `MissingData`) render exactly the
//! message the backend conversation produced, so callers can show them as-is.
//! Store failures are boxed and displayed unchanged.

use crate::document::ErrorObject;

/// Boxed error raised by a [`Store`](crate::store::Store) implementation.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by adapter operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The response body was not JSON at all, typically a gateway error page.
    /// Carries the raw body text.
    #[error("{0}")]
    Transport(String),

    /// The server answered with status >= 400 and a JSON:API error document.
    /// The message uses the first error object only.
    #[error("{status}: {title} - {detail}")]
    Api {
        status: u16,
        title: String,
        detail: String,
        errors: Vec<ErrorObject>,
    },

    /// Status < 400 but the document has no `data` member.
    #[error("Invalid response (No Data)")]
    MissingData,

    /// Status >= 400 but the document has no error objects.
    #[error("{status}: Invalid response (No Errors)")]
    MissingErrors { status: u16 },

    /// Status >= 400 but the first error object lacks `title` or `detail`.
    #[error("{status}: Invalid response (Malformed Errors)")]
    MalformedErrors { status: u16, errors: Vec<ErrorObject> },

    /// The body is JSON but not a usable JSON:API document.
    #[error("invalid response document: {0}")]
    MalformedDocument(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The transport could not complete the round-trip.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Adapter configuration could not be read.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Store(StoreError),
}

impl Error {
    pub(crate) fn store<E>(err: E) -> Self
    where
        E: Into<StoreError>,
    {
        Error::Store(err.into())
    }

    /// HTTP status of the response that caused the failure, when known.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. }
            | Error::MissingErrors { status }
            | Error::MalformedErrors { status, .. } => Some(*status),
            _ => None,
        }
    }
}
