//! On-demand font resolution.
//!
//! A caller asks for a font by family, variant and size; the crate answers
//! with a renderable [`FontHandle`] or an explicit "unavailable", hiding
//! whether the font was already registered, already downloaded, or had to be
//! fetched from a remote catalog.
//!
//! # Architecture
//!
//! Leaves first:
//! 1. [`Store`]: file layout of the private storage area
//! 2. [`NameCache`]: identity -> registered name, mirrored in memory
//! 3. [`CatalogCache`]: family -> downloadable files, fetched remotely
//! 4. [`Downloader`] and [`Registrar`]: download and registration glue
//! 5. [`ResolutionPipeline`]: the per-request state machine
//! 6. [`Scheduler`]: single-flight worker plus a delivery thread
//!
//! [`AdaptiveFonts`] wires these together. The network and the font
//! registration table are injected capabilities ([`Transport`],
//! [`FontRegistry`]) so the pipeline can run against fakes.

pub mod adaptive_fonts;
pub mod catalog;
pub mod downloader;
pub mod error;
pub mod font;
pub mod name_cache;
pub mod pipeline;
pub mod registrar;
pub mod scheduler;
pub mod store;

// Re-export main types for convenience
pub use adaptive_fonts::AdaptiveFonts;
pub use catalog::{Catalog, CatalogCache, CatalogFile, SharedApiKey};
pub use downloader::Downloader;
pub use error::{RegistrationError, ResolveError, StorageError};
pub use font::{FontIdentity, Variant};
pub use name_cache::NameCache;
pub use pipeline::{FontRequest, Resolution, ResolutionPipeline, Resolver, TaskState};
pub use registrar::Registrar;
pub use scheduler::{Completion, FontTask, Scheduler};
pub use store::Store;

pub use adaptive_fonts_config::Config;
pub use adaptive_fonts_net::{HttpTransport, Transport, TransportError};
pub use adaptive_fonts_registry::{
    FontDbRegistry, FontHandle, FontRegistry, Registration, RegistrationId, RegistryError,
};
