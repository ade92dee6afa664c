//! Where entry snapshots go. The entry only needs the notification hook;
//! `load` lets the scanner skip extraction for files it has seen before.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use crate::media::codec::EntrySnapshot;
use crate::media::identity::FileIdentity;

pub trait CacheStore: Send + Sync {
    /// Called once after each mutation of an entry's persisted fields.
    ///
    /// Fire-and-forget: failures are the store's to log. The entry's lock is
    /// held during the call, so implementations must not call back into it.
    fn notify_updated(&self, identity: &FileIdentity, snapshot: &EntrySnapshot);

    /// Encoded snapshot previously stored for this identity, if any.
    fn load(&self, identity: &FileIdentity) -> Option<Vec<u8>>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl CacheStore for NullStore {
    fn notify_updated(&self, _identity: &FileIdentity, _snapshot: &EntrySnapshot) {}

    fn load(&self, _identity: &FileIdentity) -> Option<Vec<u8>> {
        None
    }
}

/// Keeps encoded snapshots in process memory, keyed by cache key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Uuid, Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notifications received so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn get(&self, cache_key: &Uuid) -> Option<Vec<u8>> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(cache_key)
            .cloned()
    }

    pub fn insert(&self, cache_key: Uuid, bytes: Vec<u8>) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cache_key, bytes);
    }
}

impl CacheStore for MemoryStore {
    fn notify_updated(&self, identity: &FileIdentity, snapshot: &EntrySnapshot) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        match snapshot.encode() {
            Ok(bytes) => self.insert(identity.cache_key, bytes),
            Err(e) => tracing::warn!(
                "Cannot encode snapshot for {}: {}",
                identity.path.display(),
                e
            ),
        }
    }

    fn load(&self, identity: &FileIdentity) -> Option<Vec<u8>> {
        self.get(&identity.cache_key)
    }
}

/// Content-addressed snapshot cache under a directory, keyed by cache key.
///
/// Backed by cacache, so a torn write is never read back as a snapshot.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    /// Use `dir` as the cache directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CacheStore for DirectoryStore {
    fn notify_updated(&self, identity: &FileIdentity, snapshot: &EntrySnapshot) {
        let bytes = match snapshot.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    "Cannot encode snapshot for {}: {}",
                    identity.path.display(),
                    e
                );
                return;
            }
        };
        let key = identity.cache_key.to_string();
        if let Err(e) = cacache::write_sync(&self.dir, &key, bytes) {
            tracing::warn!(
                "Failed to store snapshot for {}: {}",
                identity.path.display(),
                e
            );
        }
    }

    fn load(&self, identity: &FileIdentity) -> Option<Vec<u8>> {
        let key = identity.cache_key.to_string();
        match cacache::read_sync(&self.dir, &key) {
            Ok(bytes) => Some(bytes),
            Err(cacache::Error::EntryNotFound(_, _)) => None,
            Err(e) => {
                tracing::warn!(
                    "Cannot read snapshot for {}: {}",
                    identity.path.display(),
                    e
                );
                None
            }
        }
    }
}
