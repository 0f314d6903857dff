//! `fontdb`-backed registration table.

use std::collections::HashMap;
use std::sync::Arc;

use fontdb::{Database, FaceInfo, ID, Source};
use parking_lot::Mutex;

use crate::{FontHandle, FontRegistry, Registration, RegistrationId, RegistryError};

struct Inner {
    db: Database,
    /// Faces added by each registration made through this table
    registrations: HashMap<RegistrationId, Vec<ID>>,
    next_id: u64,
}

impl Inner {
    fn allocate(&mut self, faces: Vec<ID>) -> RegistrationId {
        let id = RegistrationId(self.next_id);
        self.next_id += 1;
        self.registrations.insert(id, faces);
        id
    }

    fn owner_of(&self, face: ID) -> Option<RegistrationId> {
        self.registrations
            .iter()
            .find(|(_, faces)| faces.contains(&face))
            .map(|(id, _)| *id)
    }
}

/// Registration table backed by a `fontdb::Database`.
pub struct FontDbRegistry {
    inner: Mutex<Inner>,
}

impl Default for FontDbRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontDbRegistry {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::from_database(Database::new())
    }

    /// Create a table pre-populated with the system's installed fonts, so
    /// fonts available by other means resolve without a download.
    pub fn with_system_fonts() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        log::info!("Loaded {} system fonts", db.len());
        Self::from_database(db)
    }

    /// Wrap an existing database.
    pub fn from_database(db: Database) -> Self {
        Self {
            inner: Mutex::new(Inner {
                db,
                registrations: HashMap::new(),
                // 0 is RegistrationId::EXTERNAL
                next_id: 1,
            }),
        }
    }

    /// Number of faces currently in the table.
    pub fn face_count(&self) -> usize {
        self.inner.lock().db.len()
    }
}

fn has_family(face: &FaceInfo, family: &str) -> bool {
    face.families
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case(family))
}

fn canonical_name(face: &FaceInfo) -> Option<&str> {
    let name = face.post_script_name.trim();
    (!name.is_empty()).then_some(name)
}

impl FontRegistry for FontDbRegistry {
    fn lookup(&self, family: &str, display_name: &str) -> Option<String> {
        let inner = self.inner.lock();
        inner
            .db
            .faces()
            .filter(|face| has_family(face, family))
            .filter_map(canonical_name)
            .find(|name| name.eq_ignore_ascii_case(display_name))
            .map(str::to_string)
    }

    fn contains(&self, name: &str) -> bool {
        let inner = self.inner.lock();
        inner
            .db
            .faces()
            .any(|face| canonical_name(face) == Some(name))
    }

    fn register(&self, data: Vec<u8>) -> Result<Registration, RegistryError> {
        let len = data.len();
        let mut inner = self.inner.lock();

        let source: Arc<dyn AsRef<[u8]> + Sync + Send> = Arc::new(data);
        let added: Vec<ID> = inner.db.load_font_source(Source::Binary(source)).to_vec();
        if added.is_empty() {
            return Err(RegistryError::InvalidFont { len });
        }

        let name = added
            .iter()
            .filter_map(|id| inner.db.face(*id))
            .find_map(canonical_name)
            .map(str::to_string);

        // Re-registering a live font: drop the duplicate faces and hand back
        // the registration that already owns the name.
        if let Some(name) = &name {
            let existing = inner
                .db
                .faces()
                .find(|face| {
                    !added.contains(&face.id) && canonical_name(face) == Some(name.as_str())
                })
                .map(|face| face.id);
            if let Some(existing) = existing {
                for id in &added {
                    inner.db.remove_face(*id);
                }
                let id = inner
                    .owner_of(existing)
                    .unwrap_or(RegistrationId::EXTERNAL);
                log::debug!("Font '{}' already registered as {:?}", name, id);
                return Ok(Registration {
                    id,
                    name: Some(name.clone()),
                    fresh: false,
                });
            }
        }

        let id = inner.allocate(added);
        log::info!(
            "Registered font {:?} ({} bytes) as {:?}",
            name.as_deref().unwrap_or("<unnamed>"),
            len,
            id
        );
        Ok(Registration {
            id,
            name,
            fresh: true,
        })
    }

    fn unregister(&self, id: RegistrationId) {
        let mut inner = self.inner.lock();
        if let Some(faces) = inner.registrations.remove(&id) {
            for face in faces {
                inner.db.remove_face(face);
            }
            log::info!("Unregistered {:?}", id);
        }
    }

    fn font(&self, name: &str, size: f32) -> Option<FontHandle> {
        let inner = self.inner.lock();
        let face = inner
            .db
            .faces()
            .find(|face| canonical_name(face) == Some(name))?
            .id;

        let handle = inner.db.with_face_data(face, |data, index| {
            FontHandle::new(name, size, Arc::new(data.to_vec()), index as usize)
        })?;

        handle.font_ref().is_some().then_some(handle)
    }
}
