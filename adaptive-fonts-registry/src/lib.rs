//! Font registration table for adaptive-fonts.
//!
//! This crate provides:
//! - The [`FontRegistry`] capability: query, register and unregister fonts
//!   by canonical (PostScript) name, and construct renderable handles
//! - [`FontDbRegistry`], a `fontdb`-backed implementation
//! - [`FontHandle`], a sized font validated by swash
//!
//! The registry is an explicit, injectable capability rather than ambient
//! global state, so resolution logic can be exercised against a fake.

mod error;
mod fontdb_registry;
mod handle;

pub use error::RegistryError;
pub use fontdb_registry::FontDbRegistry;
pub use handle::FontHandle;

/// Opaque identifier of one registration, used to roll it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(pub u64);

impl RegistrationId {
    /// Stands for fonts present in the table that no registration made
    /// through it owns (system or bundled fonts). Unregistering it is a no-op.
    pub const EXTERNAL: RegistrationId = RegistrationId(0);
}

/// Result of registering font bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Handle for [`FontRegistry::unregister`]
    pub id: RegistrationId,
    /// Canonical name the font is registered under, if the font provides one
    pub name: Option<String>,
    /// Whether this call added faces to the table. Only fresh registrations
    /// may be rolled back by the caller; others are shared with whoever
    /// registered the font first.
    pub fresh: bool,
}

/// The process-wide font registration table.
pub trait FontRegistry: Send + Sync {
    /// Find the canonical name of a registered face of `family` whose name
    /// matches `display_name` (case-insensitive).
    fn lookup(&self, family: &str, display_name: &str) -> Option<String>;

    /// Whether a font is registered under the canonical `name`.
    fn contains(&self, name: &str) -> bool;

    /// Register font bytes.
    ///
    /// Registering a font whose canonical name is already live returns the
    /// existing registration (or [`RegistrationId::EXTERNAL`]) with
    /// `fresh == false`.
    fn register(&self, data: Vec<u8>) -> Result<Registration, RegistryError>;

    /// Remove a registration. Unknown ids are ignored.
    fn unregister(&self, id: RegistrationId);

    /// Construct a renderable handle for the registered font `name` at `size`.
    fn font(&self, name: &str, size: f32) -> Option<FontHandle>;
}
