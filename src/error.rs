//! Typed error types for font resolution.
//!
//! Only [`ResolveError`] reaches callers (through
//! [`Resolution::Failed`](crate::Resolution::Failed)); storage and
//! registration errors are absorbed by the pipeline and logged.

use std::path::PathBuf;

use adaptive_fonts_net::TransportError;
use adaptive_fonts_registry::RegistryError;
use thiserror::Error;

/// File read/write failure in the private storage area.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O operation on a stored file failed.
    #[error("Storage I/O failed for '{}': {source}", path.display())]
    Io {
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A cache could not be serialized.
    #[error("Failed to serialize {what}: {message}")]
    Serialize {
        /// Which cache was being written.
        what: &'static str,
        /// Serializer error message.
        message: String,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure to register a stored font and record its name.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The stored font file could not be read.
    #[error("Stored font unreadable: {0}")]
    Storage(#[source] StorageError),

    /// The registration table rejected the bytes.
    #[error("Registration rejected: {0}")]
    Registry(#[from] RegistryError),

    /// The font registered but exposes no canonical name; rolled back.
    #[error("Registered font has no canonical name")]
    MissingName,

    /// The canonical name could not be persisted; rolled back.
    #[error("Failed to record registered name: {0}")]
    NameNotRecorded(#[source] StorageError),
}

/// Why a resolution ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Catalog fetch or font download failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Neither the catalog nor the caller supplied a download URL.
    #[error("No download URL for '{0}'")]
    NoUrl(String),

    /// The downloaded file could not be moved into storage.
    #[error("Storage failure: {0}")]
    Storage(String),

    /// The pipeline panicked; the worker recovered and moved on.
    #[error("Resolution aborted: {0}")]
    Aborted(String),
}
