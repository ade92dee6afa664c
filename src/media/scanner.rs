use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

use crate::media::entry::{MediaContext, MediaEntry};
use crate::media::identity::FileIdentity;
use crate::media::library::MediaLibrary;

/// Scan all provided paths and build one entry per video file.
///
/// Files with a stored snapshot for their current size and modification time
/// are restored without extraction; everything else starts uninitialized.
/// Symlinks are followed. Missing or unreadable paths log a warning and the
/// scan continues.
pub fn scan(paths: &[PathBuf], ctx: &MediaContext) -> MediaLibrary {
    let start = Instant::now();
    let mut library = MediaLibrary::new();
    let mut restored = 0usize;

    for root in paths {
        if !root.exists() {
            tracing::warn!("Scan path does not exist, skipping: {}", root.display());
            continue;
        }
        for entry in WalkDir::new(root).follow_links(true) {
            match entry {
                Err(e) => {
                    tracing::warn!("Cannot access entry: {}", e);
                }
                Ok(entry) if entry.file_type().is_file() => {
                    if let Some(media) = process_file(entry.path(), ctx) {
                        if media.is_initialized() {
                            restored += 1;
                        }
                        library.push(media);
                    }
                }
                Ok(_) => {}
            }
        }
    }

    tracing::info!(
        "Scanned {} video files ({} restored from cache) in {:.1}s",
        library.len(),
        restored,
        start.elapsed().as_secs_f64()
    );

    library
}

fn process_file(path: &Path, ctx: &MediaContext) -> Option<MediaEntry> {
    let identity = match FileIdentity::from_path(path) {
        Ok(Some(identity)) => identity,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Cannot stat {}: {}", path.display(), e);
            return None;
        }
    };

    let Some(bytes) = ctx.store.load(&identity) else {
        tracing::debug!("new {} -> {}", identity.id, identity.path.display());
        return Some(MediaEntry::new(identity, ctx.clone()));
    };

    match MediaEntry::restore(identity.clone(), ctx.clone(), &bytes) {
        Ok(entry) => {
            tracing::debug!("restored {} -> {}", identity.id, identity.path.display());
            Some(entry)
        }
        Err(e) => {
            tracing::warn!(
                "Discarding unreadable snapshot for {}: {}",
                identity.path.display(),
                e
            );
            Some(MediaEntry::new(identity, ctx.clone()))
        }
    }
}
