//! Downloader: fetch a font file and move it into the store.

use std::path::PathBuf;
use std::sync::Arc;

use adaptive_fonts_net::Transport;
use url::Url;

use crate::error::ResolveError;
use crate::font::FontIdentity;
use crate::store::Store;

/// Downloads font files to their canonical store location.
///
/// Holds no mutable state besides the store, so downloads of different
/// identities may run concurrently.
#[derive(Clone)]
pub struct Downloader {
    store: Store,
    transport: Arc<dyn Transport>,
}

impl Downloader {
    pub fn new(store: Store, transport: Arc<dyn Transport>) -> Self {
        Self { store, transport }
    }

    /// Download `url` and store it as the file for `font`, replacing any
    /// existing file. Returns the final location.
    pub fn download(&self, font: &FontIdentity, url: &Url) -> Result<PathBuf, ResolveError> {
        log::info!("Downloading {} from {}", font, url);
        let staged = self.transport.download_file(url.as_str())?;

        match self.store.adopt_font(font, &staged) {
            Ok(path) => {
                log::info!("Stored {} at {:?}", font, path);
                Ok(path)
            }
            Err(e) => {
                let _ = std::fs::remove_file(&staged);
                Err(ResolveError::Storage(e.to_string()))
            }
        }
    }
}
