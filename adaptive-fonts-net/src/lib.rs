//! Transport capability for adaptive-fonts.
//!
//! The resolution pipeline only talks to the network through the
//! [`Transport`] trait, so the HTTP backend can be swapped (or faked in tests)
//! without touching the pipeline. [`HttpTransport`] is the `ureq` backend.

mod error;
mod http;

pub use error::TransportError;
pub use http::{HttpTransport, MAX_API_RESPONSE_SIZE, MAX_DOWNLOAD_SIZE, validate_url};

use std::path::PathBuf;

/// Network operations needed to resolve fonts.
pub trait Transport: Send + Sync {
    /// GET `url` with the given query parameters and return the JSON body bytes.
    fn fetch_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Vec<u8>, TransportError>;

    /// GET `url` and stage the body in a temporary file.
    ///
    /// Returns the location of the staged file; the caller is responsible for
    /// moving it to its final place.
    fn download_file(&self, url: &str) -> Result<PathBuf, TransportError>;
}
