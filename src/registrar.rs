//! Registrar: register a stored font file and record its canonical name.

use std::sync::Arc;

use adaptive_fonts_registry::FontRegistry;

use crate::error::RegistrationError;
use crate::font::FontIdentity;
use crate::name_cache::NameCache;
use crate::store::Store;

/// Registers stored fonts with the registration table.
///
/// A font is never left registered without a recorded name: any failure
/// after a fresh registration rolls it back.
pub struct Registrar {
    store: Store,
    registry: Arc<dyn FontRegistry>,
}

impl Registrar {
    pub fn new(store: Store, registry: Arc<dyn FontRegistry>) -> Self {
        Self { store, registry }
    }

    /// Register the stored file for `font` and record the resulting name.
    ///
    /// If `font` already has a recorded name that is live in the table,
    /// nothing is registered and that name is returned.
    pub fn register(
        &self,
        font: &FontIdentity,
        names: &mut NameCache,
    ) -> Result<String, RegistrationError> {
        if let Some(name) = names.lookup(font)
            && self.registry.contains(&name)
        {
            log::debug!("{} already registered as '{}'", font, name);
            return Ok(name);
        }

        let data = self
            .store
            .read_font(font)
            .map_err(RegistrationError::Storage)?;
        let registration = self.registry.register(data)?;

        let Some(name) = registration.name else {
            log::warn!("{} registered without a canonical name, rolling back", font);
            if registration.fresh {
                self.registry.unregister(registration.id);
            }
            return Err(RegistrationError::MissingName);
        };

        if let Err(e) = names.store(font, &name) {
            // A registration shared with another font stays; only what this
            // call added is rolled back.
            if registration.fresh {
                log::warn!(
                    "Failed to record name '{}' for {}, rolling back: {}",
                    name,
                    font,
                    e
                );
                self.registry.unregister(registration.id);
            } else {
                log::warn!("Failed to record name '{}' for {}: {}", name, font, e);
            }
            return Err(RegistrationError::NameNotRecorded(e));
        }

        log::info!("Registered {} as '{}'", font, name);
        Ok(name)
    }
}
