//! Typed transport errors.

use thiserror::Error;

/// Failure of a catalog fetch or font download.
///
/// Messages are captured as strings so the error can be cloned into task
/// results shared between threads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The URL could not be parsed or uses a scheme other than HTTP(S).
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The request failed before a response was received (DNS, TLS, timeout).
    #[error("Request to '{url}' failed: {message}")]
    Request {
        /// Requested URL.
        url: String,
        /// Underlying error message.
        message: String,
    },

    /// The server answered with a non-success status code.
    #[error("Request to '{url}' returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response was not JSON when JSON was expected.
    #[error("Unexpected content type '{content_type}' from '{url}'")]
    ContentType {
        /// Requested URL.
        url: String,
        /// Content type reported by the server.
        content_type: String,
    },

    /// Reading the response body failed or exceeded the size limit.
    #[error("Failed to read response body from '{url}': {message}")]
    Body {
        /// Requested URL.
        url: String,
        /// Underlying error message.
        message: String,
    },

    /// Staging the downloaded bytes on disk failed.
    #[error("Failed to stage download: {0}")]
    Io(String),
}
