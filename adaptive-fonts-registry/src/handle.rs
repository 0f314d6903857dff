//! Renderable font handle.

use std::sync::Arc;
use swash::{FontRef, Metrics};

/// A registered font at a specific point size.
///
/// Owns (a shared reference to) the font bytes, so the handle stays valid
/// after the font is unregistered.
#[derive(Clone)]
pub struct FontHandle {
    name: String,
    size: f32,
    data: Arc<Vec<u8>>,
    face_index: usize,
}

impl std::fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontHandle")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("data_len", &self.data.len())
            .field("face_index", &self.face_index)
            .finish()
    }
}

impl FontHandle {
    /// Create a handle from font bytes and a face index.
    ///
    /// The bytes are not parsed here; registries only hand out faces they
    /// have already loaded. [`font_ref`](Self::font_ref) reports unreadable data.
    pub fn new(name: impl Into<String>, size: f32, data: Arc<Vec<u8>>, face_index: usize) -> Self {
        Self {
            name: name.into(),
            size,
            data,
            face_index,
        }
    }

    /// Canonical name the font is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Point size requested for this handle.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Raw font bytes (TTF/OTF/TTC).
    pub fn data(&self) -> &Arc<Vec<u8>> {
        &self.data
    }

    /// Face index within [`data`](Self::data).
    pub fn face_index(&self) -> usize {
        self.face_index
    }

    /// Swash reference for glyph lookups and rasterization.
    ///
    /// `None` if the bytes do not contain a readable face at the index.
    pub fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(self.data.as_slice(), self.face_index)
    }

    /// Font metrics scaled to the handle's size.
    pub fn metrics(&self) -> Option<Metrics> {
        self.font_ref()
            .map(|font| font.metrics(&[]).scale(self.size))
    }

    /// A handle to the same face at another size.
    pub fn with_size(&self, size: f32) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }
}
