//! Shared integration test helpers for adaptive-fonts.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{FakeRegistry, FakeTransport, TestContext};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a subset
//! of helpers are used per file.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adaptive_fonts::{
    AdaptiveFonts, Config, FontHandle, FontRegistry, Registration, RegistrationId, RegistryError,
    Store, Transport, TransportError,
};
use tempfile::TempDir;

pub const CATALOG_URL: &str = "https://catalog.test/webfonts/v1/webfonts";

/// Catalog document listing Roboto regular and bold over plain HTTP.
pub const ROBOTO_CATALOG: &str = r#"{
    "items": [
        {
            "family": "Roboto",
            "files": {
                "regular": "http://x/roboto.ttf",
                "700": "http://x/roboto-bold.ttf"
            }
        }
    ]
}"#;

/// Bytes the fake registry accepts as a font named `name` in `family`.
pub fn fake_font_bytes(family: &str, name: &str) -> Vec<u8> {
    format!("FAKEFONT:{}:{}", family, name).into_bytes()
}

fn parse_fake_font(data: &[u8]) -> Option<(String, String)> {
    let text = std::str::from_utf8(data).ok()?;
    let rest = text.strip_prefix("FAKEFONT:")?;
    let (family, name) = rest.split_once(':')?;
    Some((family.to_string(), name.to_string()))
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Scripted transport that records every call.
pub struct FakeTransport {
    catalog: Mutex<Result<Vec<u8>, TransportError>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    fetches: AtomicUsize,
    downloads: Mutex<Vec<String>>,
    params: Mutex<Vec<Vec<(String, String)>>>,
    gate: Mutex<Option<Receiver<()>>>,
    staging: TempDir,
    staged: AtomicUsize,
}

impl FakeTransport {
    /// A transport whose catalog fetch fails with HTTP 503 and that serves no files.
    pub fn offline() -> Self {
        Self {
            catalog: Mutex::new(Err(TransportError::Status {
                url: CATALOG_URL.to_string(),
                status: 503,
            })),
            files: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
            downloads: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
            staging: TempDir::new().expect("Failed to create staging dir"),
            staged: AtomicUsize::new(0),
        }
    }

    /// A transport serving `catalog` as the catalog document.
    pub fn with_catalog(catalog: &str) -> Self {
        let transport = Self::offline();
        transport.set_catalog(Ok(catalog.as_bytes().to_vec()));
        transport
    }

    pub fn set_catalog(&self, result: Result<Vec<u8>, TransportError>) {
        *self.catalog.lock().unwrap() = result;
    }

    /// Serve `data` for downloads of exactly `url`.
    pub fn serve(self, url: &str, data: Vec<u8>) -> Self {
        self.files.lock().unwrap().insert(url.to_string(), data);
        self
    }

    /// Block the next catalog fetch until the returned sender fires.
    pub fn gate_next_fetch(&self) -> Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn fetch_params(&self) -> Vec<Vec<(String, String)>> {
        self.params.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn fetch_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Vec<u8>, TransportError> {
        assert_eq!(url, CATALOG_URL);
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.recv_timeout(Duration::from_secs(10));
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.params.lock().unwrap().push(
            params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self.catalog.lock().unwrap().clone()
    }

    fn download_file(&self, url: &str) -> Result<PathBuf, TransportError> {
        self.downloads.lock().unwrap().push(url.to_string());
        let data = self
            .files
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                url: url.to_string(),
                status: 404,
            })?;
        let n = self.staged.fetch_add(1, Ordering::SeqCst);
        let path = self.staging.path().join(format!("download-{}.part", n));
        std::fs::write(&path, data).map_err(|e| TransportError::Io(e.to_string()))?;
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

struct RegistryInner {
    /// Live fonts: canonical name -> (family, bytes)
    live: HashMap<String, (String, Vec<u8>)>,
    /// Registrations made through `register`
    registrations: HashMap<RegistrationId, String>,
    /// Fonts installed by other means
    installed: HashSet<String>,
    next_id: u64,
    register_calls: usize,
    unregister_calls: usize,
}

impl Default for RegistryInner {
    fn default() -> Self {
        Self {
            live: HashMap::new(),
            registrations: HashMap::new(),
            installed: HashSet::new(),
            // 0 is RegistrationId::EXTERNAL
            next_id: 1,
            register_calls: 0,
            unregister_calls: 0,
        }
    }
}

/// In-memory registration table understanding [`fake_font_bytes`].
#[derive(Default)]
pub struct FakeRegistry {
    inner: Mutex<RegistryInner>,
    panics: AtomicBool,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a font installed outside the pipeline (bundled, system).
    pub fn install(&self, family: &str, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.live.insert(
            name.to_string(),
            (family.to_string(), fake_font_bytes(family, name)),
        );
        inner.installed.insert(name.to_string());
    }

    /// Make every following `register` call panic.
    pub fn panic_on_register(&self) {
        self.panics.store(true, Ordering::SeqCst);
    }

    /// Stop panicking in `register`.
    pub fn recover(&self) {
        self.panics.store(false, Ordering::SeqCst);
    }

    pub fn register_calls(&self) -> usize {
        self.inner.lock().unwrap().register_calls
    }

    pub fn unregister_calls(&self) -> usize {
        self.inner.lock().unwrap().unregister_calls
    }

    pub fn live_count(&self) -> usize {
        self.inner.lock().unwrap().live.len()
    }
}

impl FontRegistry for FakeRegistry {
    fn lookup(&self, family: &str, display_name: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .live
            .iter()
            .find(|(name, (fam, _))| {
                fam.eq_ignore_ascii_case(family) && name.eq_ignore_ascii_case(display_name)
            })
            .map(|(name, _)| name.clone())
    }

    fn contains(&self, name: &str) -> bool {
        self.inner.lock().unwrap().live.contains_key(name)
    }

    fn register(&self, data: Vec<u8>) -> Result<Registration, RegistryError> {
        // Checked before locking so a panic does not poison the table.
        if self.panics.load(Ordering::SeqCst) {
            panic!("registration table failure");
        }
        let mut inner = self.inner.lock().unwrap();
        inner.register_calls += 1;

        let Some((family, name)) = parse_fake_font(&data) else {
            return Err(RegistryError::InvalidFont { len: data.len() });
        };

        if name.is_empty() {
            let id = RegistrationId(inner.next_id);
            inner.next_id += 1;
            return Ok(Registration {
                id,
                name: None,
                fresh: true,
            });
        }

        if inner.live.contains_key(&name) {
            let id = inner
                .registrations
                .iter()
                .find(|(_, n)| **n == name)
                .map(|(id, _)| *id)
                .unwrap_or(RegistrationId::EXTERNAL);
            return Ok(Registration {
                id,
                name: Some(name),
                fresh: false,
            });
        }

        let id = RegistrationId(inner.next_id);
        inner.next_id += 1;
        inner.live.insert(name.clone(), (family, data));
        inner.registrations.insert(id, name.clone());
        Ok(Registration {
            id,
            name: Some(name),
            fresh: true,
        })
    }

    fn unregister(&self, id: RegistrationId) {
        let mut inner = self.inner.lock().unwrap();
        inner.unregister_calls += 1;
        if let Some(name) = inner.registrations.remove(&id) {
            inner.live.remove(&name);
        }
    }

    fn font(&self, name: &str, size: f32) -> Option<FontHandle> {
        let inner = self.inner.lock().unwrap();
        let (_, data) = inner.live.get(name)?;
        Some(FontHandle::new(name, size, Arc::new(data.clone()), 0))
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Configuration pointing at a storage directory inside `temp`.
pub fn test_config(temp: &TempDir) -> Config {
    Config::new()
        .with_storage_dir(temp.path().join("store"))
        .with_catalog_endpoint(CATALOG_URL)
        .with_api_key("test-key")
}

/// A running [`AdaptiveFonts`] wired to fakes.
///
/// The `TempDir` must be kept alive for the duration of the test.
pub struct TestContext {
    pub temp: TempDir,
    pub transport: Arc<FakeTransport>,
    pub registry: Arc<FakeRegistry>,
    pub fonts: AdaptiveFonts,
}

impl TestContext {
    pub fn new(transport: FakeTransport) -> Self {
        Self::with_registry(transport, FakeRegistry::new())
    }

    pub fn with_registry(transport: FakeTransport, registry: FakeRegistry) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let transport = Arc::new(transport);
        let registry = Arc::new(registry);
        let fonts = AdaptiveFonts::with_parts(
            &test_config(&temp),
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&registry) as Arc<dyn FontRegistry>,
        )
        .expect("Failed to start AdaptiveFonts");
        Self {
            temp,
            transport,
            registry,
            fonts,
        }
    }

    pub fn store(&self) -> Store {
        Store::new(self.fonts.storage_dir())
    }
}
