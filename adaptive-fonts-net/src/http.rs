//! HTTP transport backed by `ureq` with native-tls support.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use ureq::Agent;
use ureq::http::header::CONTENT_TYPE;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};

use crate::{Transport, TransportError};

/// Maximum response body size for catalog responses (10 MB).
pub const MAX_API_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum response body size for font downloads (50 MB).
pub const MAX_DOWNLOAD_SIZE: u64 = 50 * 1024 * 1024;

/// Validate that a URL can be requested by the transport.
///
/// Only `http` and `https` URLs are accepted; `file://`, `ftp://` and
/// anything unparseable are rejected before any network activity.
pub fn validate_url(url: &str) -> Result<url::Url, TransportError> {
    let parsed = url::Url::parse(url).map_err(|e| TransportError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "https" | "http" => Ok(parsed),
        scheme => Err(TransportError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", scheme),
        }),
    }
}

/// `ureq`-backed [`Transport`].
pub struct HttpTransport {
    agent: Agent,
    user_agent: String,
}

impl HttpTransport {
    /// Create a transport with the given global timeout and User-Agent.
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        let tls_config = TlsConfig::builder()
            .provider(TlsProvider::NativeTls)
            .root_certs(RootCerts::PlatformVerifier)
            .build();

        let agent = Agent::config_builder()
            .tls_config(tls_config)
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            agent,
            user_agent: user_agent.into(),
        }
    }

    fn get(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<ureq::http::Response<ureq::Body>, TransportError> {
        validate_url(url)?;

        let mut request = self.agent.get(url).header("User-Agent", &self.user_agent);
        for (key, value) in params {
            request = request.query(*key, *value);
        }

        request.call().map_err(|e| match e {
            ureq::Error::StatusCode(status) => TransportError::Status {
                url: url.to_string(),
                status,
            },
            other => TransportError::Request {
                url: url.to_string(),
                message: other.to_string(),
            },
        })
    }
}

impl Transport for HttpTransport {
    fn fetch_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Vec<u8>, TransportError> {
        let response = self.get(url, params)?;

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            && !is_json_content_type(content_type)
        {
            return Err(TransportError::ContentType {
                url: url.to_string(),
                content_type: content_type.to_string(),
            });
        }

        response
            .into_body()
            .with_config()
            .limit(MAX_API_RESPONSE_SIZE)
            .read_to_vec()
            .map_err(|e| TransportError::Body {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    fn download_file(&self, url: &str) -> Result<PathBuf, TransportError> {
        let bytes = self
            .get(url, &[])?
            .into_body()
            .with_config()
            .limit(MAX_DOWNLOAD_SIZE)
            .read_to_vec()
            .map_err(|e| TransportError::Body {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        log::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        stage_bytes(&bytes)
    }
}

/// Write downloaded bytes to a uniquely named temporary file that outlives
/// this call.
fn stage_bytes(bytes: &[u8]) -> Result<PathBuf, TransportError> {
    let mut file = tempfile::Builder::new()
        .prefix("adaptive-fonts-")
        .suffix(".part")
        .tempfile()
        .map_err(|e| TransportError::Io(e.to_string()))?;
    file.write_all(bytes)
        .map_err(|e| TransportError::Io(e.to_string()))?;
    file.into_temp_path()
        .keep()
        .map_err(|e| TransportError::Io(e.to_string()))
}

fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json") || mime == "text/json"
}
