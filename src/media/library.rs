use std::sync::Arc;
use uuid::Uuid;

use crate::media::entry::MediaEntry;

/// Flat in-memory list of the entries produced by one scan.
///
/// Entries are shared (`Arc`) so the serving layer and background extraction
/// can hold them at the same time; every entry guards its own state.
#[derive(Debug, Default)]
pub struct MediaLibrary {
    pub entries: Vec<Arc<MediaEntry>>,
}

impl MediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: MediaEntry) {
        self.entries.push(Arc::new(entry));
    }

    pub fn find(&self, id: &Uuid) -> Option<Arc<MediaEntry>> {
        self.entries
            .iter()
            .find(|e| e.identity().id == *id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries rebuilt from a snapshot or already extracted.
    pub fn initialized_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_initialized()).count()
    }
}
