use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::media::mime::{classify, MediaKind};

/// Derive a machine-specific UUID namespace by seeding UUIDv5 from the machine UID.
/// Falls back to "unknown" if machine_uid::get() fails.
pub fn build_machine_namespace() -> Uuid {
    let machine_id = machine_uid::get().unwrap_or_else(|_| "unknown".to_string());
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, machine_id.as_bytes())
}

/// Cached machine-specific UUID namespace. Computed once at first access.
pub static MACHINE_NAMESPACE: std::sync::LazyLock<Uuid> =
    std::sync::LazyLock::new(build_machine_namespace);

/// Stable UUIDv5 for a media file: same canonical path on the same machine,
/// same id across restarts.
pub fn media_item_id(namespace: &Uuid, canonical_path: &Path) -> Uuid {
    Uuid::new_v5(namespace, canonical_path.as_os_str().as_encoded_bytes())
}

/// Key under which a snapshot is stored. Changes whenever the file's size or
/// modification time changes, so an edited file is extracted again.
pub fn snapshot_key(id: &Uuid, file_size: u64, modified: Option<SystemTime>) -> Uuid {
    let mtime = modified
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let mut seed = Vec::with_capacity(24);
    seed.extend_from_slice(&file_size.to_le_bytes());
    seed.extend_from_slice(&mtime.to_le_bytes());
    Uuid::new_v5(id, &seed)
}

/// Who a [`MediaEntry`](crate::media::entry::MediaEntry) is: the file it was
/// built from, as seen by the scan that discovered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub id: Uuid,
    pub cache_key: Uuid,
    pub path: PathBuf,
    pub file_size: u64,
    pub modified: Option<SystemTime>,
    pub mime: &'static str,
}

impl FileIdentity {
    /// Build the identity of a video file on disk. Returns `None` when the
    /// path is not a recognized video container.
    pub fn from_path(path: &Path) -> std::io::Result<Option<Self>> {
        let Some((MediaKind::Video, mime)) = classify(path) else {
            return Ok(None);
        };
        let canonical = std::fs::canonicalize(path)?;
        let meta = std::fs::metadata(&canonical)?;
        Ok(Some(Self::new(
            &MACHINE_NAMESPACE,
            canonical,
            meta.len(),
            meta.modified().ok(),
            mime,
        )))
    }

    pub fn new(
        namespace: &Uuid,
        path: PathBuf,
        file_size: u64,
        modified: Option<SystemTime>,
        mime: &'static str,
    ) -> Self {
        let id = media_item_id(namespace, &path);
        let cache_key = snapshot_key(&id, file_size, modified);
        Self {
            id,
            cache_key,
            path,
            file_size,
            modified,
            mime,
        }
    }

    /// Title derived from the file name alone (stem, no extension).
    pub fn base_title(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
