//! Resolution pipeline: the per-request state machine.
//!
//! ```text
//! lookup name ──found──────────────────────────────────────────> Succeeded(font)
//!     │
//!     ├─ file stored ──────────> register ──> finalize ────────> Succeeded(font | none)
//!     ├─ catalog persisted ───> download ──┘
//!     └─ no catalog ─> fetch ─> download ──┘
//!                        │          │
//!                        └──────────┴─ error ──────────────────> Failed
//! ```
//!
//! Cancellation is checked on entry, after the catalog fetch, and before
//! every terminal transition. A cancelled pipeline ends in `Cancelled` and
//! delivers nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use adaptive_fonts_net::Transport;
use adaptive_fonts_registry::{FontHandle, FontRegistry};
use url::Url;

use crate::catalog::{Catalog, CatalogCache, SharedApiKey};
use crate::downloader::Downloader;
use crate::error::ResolveError;
use crate::font::FontIdentity;
use crate::name_cache::NameCache;
use crate::registrar::Registrar;
use crate::store::Store;

/// Lifecycle of a resolution. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Created,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Cancelled
        )
    }
}

/// Terminal outcome of a resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Finalize ran. `None` means the font is genuinely unavailable.
    Succeeded(Option<FontHandle>),
    /// A transport or storage error stopped the pipeline before finalize.
    Failed(ResolveError),
    /// Cancelled before completion; nothing was delivered.
    Cancelled,
}

impl Resolution {
    pub fn state(&self) -> TaskState {
        match self {
            Resolution::Succeeded(_) => TaskState::Succeeded,
            Resolution::Failed(_) => TaskState::Failed,
            Resolution::Cancelled => TaskState::Cancelled,
        }
    }

    /// The resolved font; `None` for every outcome that produced no font.
    pub fn font(&self) -> Option<&FontHandle> {
        match self {
            Resolution::Succeeded(font) => font.as_ref(),
            _ => None,
        }
    }

    pub fn into_font(self) -> Option<FontHandle> {
        match self {
            Resolution::Succeeded(font) => font,
            _ => None,
        }
    }
}

/// A font request: identity, point size and an optional fallback URL used
/// when the catalog has no file for the identity.
#[derive(Debug, Clone)]
pub struct FontRequest {
    pub font: FontIdentity,
    pub size: f32,
    pub fallback_url: Option<Url>,
}

impl FontRequest {
    pub fn new(font: FontIdentity, size: f32) -> Self {
        Self {
            font,
            size,
            fallback_url: None,
        }
    }

    pub fn with_fallback_url(mut self, url: Url) -> Self {
        self.fallback_url = Some(url);
        self
    }
}

/// Components a pipeline runs against.
///
/// Owned by the scheduler's worker, so caches are only ever touched by one
/// pipeline at a time.
pub struct Resolver {
    registry: Arc<dyn FontRegistry>,
    store: Store,
    names: NameCache,
    catalog: CatalogCache,
    downloader: Downloader,
    registrar: Registrar,
}

impl Resolver {
    pub fn new(
        store: Store,
        transport: Arc<dyn Transport>,
        registry: Arc<dyn FontRegistry>,
        catalog_endpoint: impl Into<String>,
        api_key: SharedApiKey,
    ) -> Self {
        Self {
            names: NameCache::new(store.clone(), Arc::clone(&registry)),
            catalog: CatalogCache::new(
                store.clone(),
                Arc::clone(&transport),
                catalog_endpoint,
                api_key,
            ),
            downloader: Downloader::new(store.clone(), transport),
            registrar: Registrar::new(store.clone(), Arc::clone(&registry)),
            registry,
            store,
        }
    }

    /// Name cache lookup followed by handle construction at `size`.
    fn lookup_font(&mut self, font: &FontIdentity, size: f32) -> Option<FontHandle> {
        let name = self.names.lookup(font)?;
        self.registry.font(&name, size)
    }

    /// Registration failures are soft: finalize reports the font as
    /// unavailable.
    fn register(&mut self, font: &FontIdentity) {
        if let Err(e) = self.registrar.register(font, &mut self.names) {
            log::warn!("Failed to register {}: {}", font, e);
        }
    }
}

enum Step {
    Lookup,
    Register,
    FetchCatalog,
    Download(Option<Arc<Catalog>>),
    Finalize,
    Fail(ResolveError),
}

/// One request's pass through the resolution steps.
pub struct ResolutionPipeline {
    request: FontRequest,
}

impl ResolutionPipeline {
    pub fn new(request: FontRequest) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &FontRequest {
        &self.request
    }

    /// Run to a terminal state. Consumes the pipeline; there is no re-entry.
    pub fn run(self, resolver: &mut Resolver, cancelled: &AtomicBool) -> Resolution {
        let is_cancelled = || cancelled.load(Ordering::Acquire);
        let FontRequest {
            font,
            size,
            fallback_url,
        } = self.request;

        if is_cancelled() {
            log::debug!("{}: cancelled before start", font);
            return Resolution::Cancelled;
        }

        let mut step = Step::Lookup;
        loop {
            step = match step {
                Step::Lookup => {
                    if let Some(handle) = resolver.lookup_font(&font, size) {
                        log::debug!("{}: resolved from name cache", font);
                        return Resolution::Succeeded(Some(handle));
                    }
                    if resolver.store.font_exists(&font) {
                        log::debug!("{}: registering stored file", font);
                        Step::Register
                    } else if resolver.catalog.exists() {
                        Step::Download(None)
                    } else {
                        Step::FetchCatalog
                    }
                }
                Step::Register => {
                    resolver.register(&font);
                    Step::Finalize
                }
                Step::FetchCatalog => match resolver.catalog.fetch() {
                    Ok(_) if is_cancelled() => {
                        log::debug!("{}: cancelled after catalog fetch", font);
                        return Resolution::Cancelled;
                    }
                    Ok(catalog) => Step::Download(Some(catalog)),
                    Err(e) => Step::Fail(e.into()),
                },
                Step::Download(entries) => {
                    let url = resolver
                        .catalog
                        .url_for(&font, entries.as_deref())
                        .or_else(|| fallback_url.clone());
                    match url {
                        Some(url) => match resolver.downloader.download(&font, &url) {
                            Ok(_) => Step::Register,
                            Err(e) => Step::Fail(e),
                        },
                        None => Step::Fail(ResolveError::NoUrl(font.key())),
                    }
                }
                Step::Finalize => {
                    if is_cancelled() {
                        log::debug!("{}: cancelled before finalize", font);
                        return Resolution::Cancelled;
                    }
                    let handle = resolver.lookup_font(&font, size);
                    if handle.is_none() {
                        log::debug!("{}: no font after registration", font);
                    }
                    return Resolution::Succeeded(handle);
                }
                Step::Fail(e) => {
                    if is_cancelled() {
                        return Resolution::Cancelled;
                    }
                    log::warn!("{}: resolution failed: {}", font, e);
                    return Resolution::Failed(e);
                }
            };
        }
    }
}
