//! Public entry point.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use adaptive_fonts_config::Config;
use adaptive_fonts_net::{HttpTransport, Transport};
use adaptive_fonts_registry::{FontDbRegistry, FontHandle, FontRegistry};
use anyhow::{Context, Result};
use parking_lot::RwLock;
use url::Url;

use crate::catalog::SharedApiKey;
use crate::font::FontIdentity;
use crate::pipeline::{FontRequest, Resolution, Resolver};
use crate::scheduler::{FontTask, Scheduler};
use crate::store::Store;

/// Resolves font requests to registered fonts, downloading them on demand.
///
/// Requests run one at a time on a dedicated worker. The catalog has
/// priority over the fallback URL: the fallback is only used when the
/// catalog lists no file for the requested family and variant.
pub struct AdaptiveFonts {
    scheduler: Scheduler,
    api_key: SharedApiKey,
    store: Store,
}

impl AdaptiveFonts {
    /// Create with the HTTP transport and a registration table seeded with
    /// system fonts.
    pub fn new(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(
            Duration::from_secs(config.http_timeout_secs),
            config.user_agent.clone(),
        );
        Self::with_parts(
            config,
            Arc::new(transport),
            Arc::new(FontDbRegistry::with_system_fonts()),
        )
    }

    /// Create with explicit transport and registration table.
    pub fn with_parts(
        config: &Config,
        transport: Arc<dyn Transport>,
        registry: Arc<dyn FontRegistry>,
    ) -> Result<Self> {
        let store = Store::new(config.resolved_storage_dir());
        let api_key: SharedApiKey = Arc::new(RwLock::new(config.api_key.clone()));

        let resolver = Resolver::new(
            store.clone(),
            transport,
            registry,
            config.catalog_endpoint.clone(),
            Arc::clone(&api_key),
        );
        let scheduler = Scheduler::spawn(resolver).context("Failed to start font worker")?;

        log::info!("Font storage at {:?}", store.root());
        Ok(Self {
            scheduler,
            api_key,
            store,
        })
    }

    /// Replace the catalog API key. Takes effect on the next catalog fetch;
    /// cached catalog data stays valid.
    pub fn set_api_key(&self, api_key: impl Into<String>) {
        *self.api_key.write() = api_key.into();
    }

    pub fn api_key(&self) -> String {
        self.api_key.read().clone()
    }

    pub fn storage_dir(&self) -> &Path {
        self.store.root()
    }

    /// Resolve `font` at `size` and hand the result to `completion`.
    ///
    /// `completion` runs on the delivery thread with `None` when no font was
    /// produced. It is not called if the task is cancelled.
    pub fn font<F>(
        &self,
        font: FontIdentity,
        size: f32,
        fallback_url: Option<Url>,
        completion: F,
    ) -> FontTask
    where
        F: FnOnce(Option<FontHandle>) + Send + 'static,
    {
        self.scheduler
            .submit(request(font, size, fallback_url), Some(Box::new(completion)))
    }

    /// Resolve `font` at `size`; observe the result through the returned task.
    pub fn request(&self, font: FontIdentity, size: f32, fallback_url: Option<Url>) -> FontTask {
        self.scheduler
            .submit(request(font, size, fallback_url), None)
    }

    /// Resolve `font` at `size`, blocking until the queue has processed it.
    ///
    /// Must not be called from a completion callback chain that the worker
    /// depends on; called on the worker thread it returns `None` at once.
    pub fn font_sync(
        &self,
        font: FontIdentity,
        size: f32,
        fallback_url: Option<Url>,
    ) -> Option<FontHandle> {
        if self.scheduler.on_worker_thread() {
            log::error!("font_sync called on the font worker thread; refusing to deadlock");
            return None;
        }
        self.resolve_sync(font, size, fallback_url).into_font()
    }

    /// Blocking form that exposes the terminal [`Resolution`].
    pub fn resolve_sync(
        &self,
        font: FontIdentity,
        size: f32,
        fallback_url: Option<Url>,
    ) -> Resolution {
        self.request(font, size, fallback_url).wait_resolution()
    }
}

fn request(font: FontIdentity, size: f32, fallback_url: Option<Url>) -> FontRequest {
    FontRequest {
        font,
        size,
        fallback_url,
    }
}
