use thiserror::Error;

/// Rejection by the registration table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The bytes do not contain a usable font face.
    #[error("font data contains no usable face ({len} bytes)")]
    InvalidFont {
        /// Length of the rejected data.
        len: usize,
    },
}
