//! Catalog cache: remote listing of families and their downloadable files.
//!
//! The remote endpoint returns
//! `{ "items": [ { "family": "...", "files": { "<token>": "<url>" } } ] }`.
//! Only the 18 recognized variant tokens are kept, and each kept URL is
//! forced to HTTPS and tagged with its token as the URL fragment.

use std::collections::HashMap;
use std::sync::Arc;

use adaptive_fonts_net::{Transport, TransportError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::font::{FontIdentity, Variant};
use crate::store::Store;

/// API key slot shared with the facade; read at every fetch.
pub type SharedApiKey = Arc<RwLock<String>>;

/// One downloadable file of a family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFile {
    pub variant: Variant,
    pub url: Url,
}

/// Parsed catalog: family name -> ordered list of files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    families: HashMap<String, Vec<CatalogFile>>,
}

#[derive(Deserialize)]
struct RemoteFamily {
    family: String,
    /// Insertion-ordered (`preserve_order`), so files keep document order.
    files: serde_json::Map<String, serde_json::Value>,
}

impl Catalog {
    /// Parse a remote catalog document.
    ///
    /// Invalid JSON is an error; a document without `items`, and items
    /// without a usable `family`/`files` pair, are skipped.
    pub fn from_remote(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let document: serde_json::Value = serde_json::from_slice(bytes)?;
        let Some(items) = document.get("items").and_then(|v| v.as_array()) else {
            return Ok(Self::default());
        };

        let mut families = HashMap::with_capacity(items.len());
        for item in items {
            let Ok(remote) = serde_json::from_value::<RemoteFamily>(item.clone()) else {
                continue;
            };
            let files = remote
                .files
                .iter()
                .filter_map(|(token, url)| normalize_file(token, url.as_str()?))
                .collect();
            families.insert(remote.family, files);
        }

        Ok(Self { families })
    }

    /// Files of `family`, in catalog order.
    pub fn family(&self, family: &str) -> Option<&[CatalogFile]> {
        self.families.get(family).map(Vec::as_slice)
    }

    /// Download URL for the variant of `font`, if listed.
    pub fn url_for(&self, font: &FontIdentity) -> Option<&Url> {
        self.family(font.family())?
            .iter()
            .find(|file| file.variant == font.variant())
            .map(|file| &file.url)
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

/// Keep recognized tokens only; force HTTPS and tag the URL with its token.
fn normalize_file(token: &str, url: &str) -> Option<CatalogFile> {
    let variant = Variant::from_token(token)?;
    let mut url = Url::parse(url).ok()?;
    url.set_scheme("https").ok()?;
    url.set_fragment(Some(token));
    Some(CatalogFile { variant, url })
}

/// Remote catalog mirrored in memory and on disk.
///
/// Once populated (by fetch or disk load) the in-memory copy is used for the
/// rest of the process.
pub struct CatalogCache {
    store: Store,
    transport: Arc<dyn Transport>,
    endpoint: String,
    api_key: SharedApiKey,
    cache: Option<Arc<Catalog>>,
}

impl CatalogCache {
    pub fn new(
        store: Store,
        transport: Arc<dyn Transport>,
        endpoint: impl Into<String>,
        api_key: SharedApiKey,
    ) -> Self {
        Self {
            store,
            transport,
            endpoint: endpoint.into(),
            api_key,
            cache: None,
        }
    }

    /// Fetch the catalog from the remote endpoint.
    ///
    /// On success the result is cached and persisted. On failure any
    /// persisted catalog is deleted so [`exists`](Self::exists) reports
    /// `false` afterwards.
    pub fn fetch(&mut self) -> Result<Arc<Catalog>, TransportError> {
        let api_key = self.api_key.read().clone();
        let params: Vec<(&str, &str)> = if api_key.is_empty() {
            Vec::new()
        } else {
            vec![("key", api_key.as_str())]
        };

        log::info!("Fetching font catalog from {}", self.endpoint);
        let result = self
            .transport
            .fetch_json(&self.endpoint, &params)
            .and_then(|bytes| {
                Catalog::from_remote(&bytes).map_err(|e| TransportError::Body {
                    url: self.endpoint.clone(),
                    message: format!("invalid catalog JSON: {}", e),
                })
            });

        match result {
            Ok(catalog) => {
                log::info!("Fetched catalog with {} families", catalog.len());
                self.persist(&catalog);
                let catalog = Arc::new(catalog);
                self.cache = Some(Arc::clone(&catalog));
                Ok(catalog)
            }
            Err(e) => {
                log::warn!("Catalog fetch failed: {}", e);
                if let Err(remove_err) = self.store.remove_catalog() {
                    log::warn!("Failed to remove stale catalog: {}", remove_err);
                }
                Err(e)
            }
        }
    }

    /// The cached catalog, loading the persisted copy if nothing is cached.
    ///
    /// A missing or unparseable persisted catalog yields an empty catalog
    /// (which is not cached).
    pub fn family_entries(&mut self) -> Arc<Catalog> {
        if let Some(cache) = &self.cache {
            return Arc::clone(cache);
        }

        let bytes = match self.store.read_catalog() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::debug!("No persisted catalog: {}", e);
                return Arc::new(Catalog::default());
            }
        };

        match serde_json::from_slice::<Catalog>(&bytes) {
            Ok(catalog) => {
                log::debug!("Loaded persisted catalog with {} families", catalog.len());
                let catalog = Arc::new(catalog);
                self.cache = Some(Arc::clone(&catalog));
                catalog
            }
            Err(e) => {
                log::warn!("Failed to parse persisted catalog: {}", e);
                Arc::new(Catalog::default())
            }
        }
    }

    /// Download URL for `font`.
    ///
    /// Looks in the cached catalog first, then in `entries`, then in the
    /// persisted catalog.
    pub fn url_for(&mut self, font: &FontIdentity, entries: Option<&Catalog>) -> Option<Url> {
        if let Some(cache) = &self.cache {
            return cache.url_for(font).cloned();
        }
        if let Some(entries) = entries {
            return entries.url_for(font).cloned();
        }
        self.family_entries().url_for(font).cloned()
    }

    /// Whether a persisted catalog exists.
    pub fn exists(&self) -> bool {
        self.store.catalog_exists()
    }

    fn persist(&self, catalog: &Catalog) {
        let result = serde_json::to_vec(catalog)
            .map_err(|e| e.to_string())
            .and_then(|bytes| self.store.write_catalog(&bytes).map_err(|e| e.to_string()));
        if let Err(e) = result {
            log::warn!("Failed to persist catalog: {}", e);
        }
    }
}
