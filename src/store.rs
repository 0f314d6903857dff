//! Persistent store: file layout of the private storage area.
//!
//! ```text
//! <root>/
//!   names.json              # identity key -> registered name
//!   catalog.json            # parsed remote catalog
//!   <family>-<token>.ttf    # one per downloaded font
//! ```
//!
//! Cache blobs are opaque here; their owners serialize them. Blob writes are
//! atomic: a temp file is written and renamed over the target, so a failed
//! write never leaves a partially overwritten file behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::font::FontIdentity;

const NAMES_FILE: &str = "names.json";
const CATALOG_FILE: &str = "catalog.json";

/// Files in the private storage area.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // --- font files ---

    /// Canonical location of the stored file for `font`.
    pub fn font_path(&self, font: &FontIdentity) -> PathBuf {
        self.root.join(font.filename())
    }

    pub fn font_exists(&self, font: &FontIdentity) -> bool {
        self.font_path(font).is_file()
    }

    pub fn read_font(&self, font: &FontIdentity) -> Result<Vec<u8>, StorageError> {
        let path = self.font_path(font);
        fs::read(&path).map_err(|e| StorageError::io(path, e))
    }

    /// Move a staged download to the canonical location for `font`,
    /// replacing any existing file there.
    pub fn adopt_font(&self, font: &FontIdentity, staged: &Path) -> Result<PathBuf, StorageError> {
        self.ensure_root()?;
        let target = self.font_path(font);

        if fs::rename(staged, &target).is_err() {
            // Staging may live on another filesystem; fall back to copying.
            fs::copy(staged, &target).map_err(|e| StorageError::io(&target, e))?;
            if let Err(e) = fs::remove_file(staged) {
                log::warn!("Failed to remove staged download {:?}: {}", staged, e);
            }
        }

        Ok(target)
    }

    pub fn remove_font(&self, font: &FontIdentity) -> Result<(), StorageError> {
        remove_if_exists(&self.font_path(font))
    }

    // --- catalog ---

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(CATALOG_FILE)
    }

    pub fn catalog_exists(&self) -> bool {
        self.catalog_path().is_file()
    }

    pub fn read_catalog(&self) -> Result<Vec<u8>, StorageError> {
        let path = self.catalog_path();
        fs::read(&path).map_err(|e| StorageError::io(path, e))
    }

    pub fn write_catalog(&self, contents: &[u8]) -> Result<(), StorageError> {
        self.write_atomic(&self.catalog_path(), contents)
    }

    pub fn remove_catalog(&self) -> Result<(), StorageError> {
        remove_if_exists(&self.catalog_path())
    }

    // --- name cache ---

    pub fn names_path(&self) -> PathBuf {
        self.root.join(NAMES_FILE)
    }

    /// Read the persisted name mapping; `Ok(None)` if it was never written.
    pub fn read_names(&self) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.names_path();
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    pub fn write_names(&self, contents: &[u8]) -> Result<(), StorageError> {
        self.write_atomic(&self.names_path(), contents)
    }

    // --- helpers ---

    fn ensure_root(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(|e| StorageError::io(&self.root, e))
    }

    /// Write to a temp file first, then rename over the target.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<(), StorageError> {
        self.ensure_root()?;
        let temp_path = path.with_extension("json.tmp");

        fs::write(&temp_path, contents).map_err(|e| StorageError::io(&temp_path, e))?;
        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(StorageError::io(path, e));
        }
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io(path, e)),
    }
}
