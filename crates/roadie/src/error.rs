//! Error taxonomy for talking to the media server.

use thiserror::Error;

use crate::session::ConnectionState;

/// Errors raised by the transport layer.
///
/// Every variant has a matching [`ConnectionState`]; the owning
/// connection records that state before the error is returned, so
/// callers that swallow the error can still read the diagnosis off
/// the session.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The server could not be reached at all (DNS failure,
    /// connection refused, timeout).
    #[error("network error when accessing '{url}': {message}")]
    Network { url: String, message: String },

    /// The server rejected the supplied credentials.
    #[error("incorrect login data (request returned 401)")]
    IncorrectLogin,

    /// The server answered with an unexpected non-success status.
    /// This likely means the URL does not point at an actual ingest
    /// server.
    #[error("unexpected {status} response when accessing {url}")]
    ResponseNotOk { url: String, status: u16 },

    /// The response body was not what we expected (e.g. malformed
    /// JSON).
    #[error("invalid response when accessing {url}: {message}")]
    InvalidResponse { url: String, message: String },
}

impl RequestError {
    /// The connection state this error classifies as.
    pub fn state(&self) -> ConnectionState {
        match self {
            RequestError::Network { .. } => ConnectionState::NetworkError,
            RequestError::IncorrectLogin => ConnectionState::IncorrectLogin,
            RequestError::ResponseNotOk { .. } => ConnectionState::ResponseNotOk,
            RequestError::InvalidResponse { .. } => ConnectionState::InvalidResponse,
        }
    }
}

/// Why an upload did not happen.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The connection was not in the `LoggedIn` state when the
    /// pipeline started; no ingest call was made.
    #[error("connection is not ready to upload (state: {0})")]
    NotReady(ConnectionState),

    /// A recording's declared content type is not a valid MIME type.
    #[error("invalid content type '{0}' on a recording")]
    InvalidContentType(String),

    /// A pipeline step failed; the session state has the details.
    #[error(transparent)]
    Request(#[from] RequestError),
}
