//! Name cache: font identity -> canonical registered name.

use std::collections::HashMap;
use std::sync::Arc;

use adaptive_fonts_registry::FontRegistry;

use crate::error::StorageError;
use crate::font::FontIdentity;
use crate::store::Store;

/// Maps identities to the names their fonts were registered under.
///
/// The persisted mapping is loaded into memory on first access and reused for
/// the rest of the process. The in-memory mirror may run ahead of disk when a
/// write fails.
pub struct NameCache {
    store: Store,
    registry: Arc<dyn FontRegistry>,
    mirror: Option<HashMap<String, String>>,
}

impl NameCache {
    pub fn new(store: Store, registry: Arc<dyn FontRegistry>) -> Self {
        Self {
            store,
            registry,
            mirror: None,
        }
    }

    /// Canonical name for `font`, if known.
    ///
    /// Fonts already present in the registration table (bundled or installed
    /// by other means) are recognized by their display name without
    /// consulting the persisted mapping.
    pub fn lookup(&mut self, font: &FontIdentity) -> Option<String> {
        if let Some(name) = self.registry.lookup(font.family(), &font.display_name()) {
            return Some(name);
        }
        self.mirror().get(&font.key()).cloned()
    }

    /// Record `name` for `font` and persist the whole mapping.
    ///
    /// The in-memory mirror is updated even when the write fails.
    pub fn store(&mut self, font: &FontIdentity, name: &str) -> Result<(), StorageError> {
        let key = font.key();
        let mirror = self.mirror();
        if let Some(previous) = mirror.get(&key)
            && previous != name
        {
            log::warn!(
                "Registered name for {} changed from '{}' to '{}'",
                key,
                previous,
                name
            );
        }
        mirror.insert(key, name.to_string());

        let contents = serde_json::to_vec_pretty(&*mirror).map_err(|e| StorageError::Serialize {
            what: "name cache",
            message: e.to_string(),
        })?;
        self.store.write_names(&contents)
    }

    fn mirror(&mut self) -> &mut HashMap<String, String> {
        let store = &self.store;
        self.mirror.get_or_insert_with(|| load_names(store))
    }
}

/// Load the persisted mapping; unreadable or corrupt files count as empty.
fn load_names(store: &Store) -> HashMap<String, String> {
    let bytes = match store.read_names() {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return HashMap::new(),
        Err(e) => {
            log::warn!("Failed to read name cache: {}", e);
            return HashMap::new();
        }
    };

    match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
        Ok(names) => {
            log::debug!("Loaded {} registered names", names.len());
            names
        }
        Err(e) => {
            log::warn!(
                "Failed to parse name cache {:?}: {}",
                store.names_path(),
                e
            );
            HashMap::new()
        }
    }
}
