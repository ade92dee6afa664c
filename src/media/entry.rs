//! The per-file metadata entity and its one-shot extraction latch.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{CodecError, MediaError};
use crate::media::codec::{duration_to_ticks, ticks_to_duration, EntrySnapshot, SubtitleSnapshot};
use crate::media::identity::FileIdentity;
use crate::media::properties::{format_short_duration, Properties};
use crate::media::resource::{ContentStream, MediaResource};
use crate::media::store::CacheStore;
use crate::media::subtitle::{Subtitle, SubtitleResolver};
use crate::media::tags::{DescriptiveTags, TagReader};

/// Durations below this are container noise and reported as unknown.
pub const MIN_DURATION: Duration = Duration::from_millis(100);

/// Glyph between the file title and the tag title in [`MediaEntry::display_title`].
pub const TITLE_SEPARATOR: &str = " — ";

/// Collaborators every entry needs. Built once from the configuration and
/// shared by all entries of a library.
#[derive(Clone)]
pub struct MediaContext {
    pub tag_reader: Arc<dyn TagReader>,
    pub subtitles: SubtitleResolver,
    pub store: Arc<dyn CacheStore>,
}

impl MediaContext {
    pub fn new(
        tag_reader: Arc<dyn TagReader>,
        subtitles: SubtitleResolver,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            tag_reader,
            subtitles,
            store,
        }
    }
}

impl std::fmt::Debug for MediaContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaContext")
            .field("subtitles", &self.subtitles)
            .finish_non_exhaustive()
    }
}

/// Pixel dimensions. Only exists when both sides are known and non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    fn from_parts(width: Option<u32>, height: Option<u32>) -> Option<Self> {
        Self::new(width?, height?)
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct VideoMeta {
    actors: Option<Vec<String>>,
    description: Option<String>,
    director: Option<String>,
    genre: Option<String>,
    title: Option<String>,
    duration: Option<Duration>,
    resolution: Option<Resolution>,
}

#[derive(Debug, Default)]
struct EntryState {
    initialized: bool,
    meta: VideoMeta,
    bookmark: Option<u64>,
    subtitle: Option<Arc<Subtitle>>,
}

impl EntryState {
    fn to_snapshot(&self) -> EntrySnapshot {
        let meta = &self.meta;
        EntrySnapshot {
            actors: meta.actors.clone(),
            description: meta.description.clone(),
            director: meta.director.clone(),
            genre: meta.genre.clone(),
            title: meta.title.clone(),
            width: meta.resolution.map_or(0, |r| r.width),
            height: meta.resolution.map_or(0, |r| r.height),
            bookmark: self.bookmark.unwrap_or(0),
            duration_ticks: duration_to_ticks(meta.duration),
            subtitle: self.subtitle.as_ref().map(|s| SubtitleSnapshot {
                text: s.text().map(str::to_owned),
            }),
        }
    }
}

enum Extraction {
    Extracted(VideoMeta),
    /// The reader recognized the file as permanently unreadable.
    Rejected,
    /// Anything else; left for the next access to retry.
    Failed,
}

/// Metadata for one video file.
///
/// Every metadata getter runs extraction on first use. Extraction happens at
/// most once: the state mutex is held for its whole duration, so concurrent
/// first readers wait for the one doing the work and then see its result.
#[derive(Debug)]
pub struct MediaEntry {
    identity: FileIdentity,
    ctx: MediaContext,
    state: Mutex<EntryState>,
}

impl MediaEntry {
    /// A freshly discovered file; nothing is read until the first getter.
    pub fn new(identity: FileIdentity, ctx: MediaContext) -> Self {
        Self {
            identity,
            ctx,
            state: Mutex::new(EntryState::default()),
        }
    }

    /// Rebuild an entry from a stored snapshot. The result is initialized and
    /// will never run extraction.
    pub fn from_snapshot(identity: FileIdentity, ctx: MediaContext, snapshot: EntrySnapshot) -> Self {
        let state = EntryState {
            initialized: true,
            meta: VideoMeta {
                actors: snapshot.actors,
                description: snapshot.description,
                director: snapshot.director,
                genre: snapshot.genre,
                title: snapshot.title,
                duration: ticks_to_duration(snapshot.duration_ticks),
                resolution: Resolution::new(snapshot.width, snapshot.height),
            },
            bookmark: (snapshot.bookmark != 0).then_some(snapshot.bookmark),
            subtitle: snapshot
                .subtitle
                .map(|s| Arc::new(Subtitle::from_optional(s.text))),
        };
        Self {
            identity,
            ctx,
            state: Mutex::new(state),
        }
    }

    /// Decode `bytes` and rebuild the entry from them.
    pub fn restore(identity: FileIdentity, ctx: MediaContext, bytes: &[u8]) -> Result<Self, CodecError> {
        let snapshot = EntrySnapshot::decode(bytes)?;
        Ok(Self::from_snapshot(identity, ctx, snapshot))
    }

    pub fn identity(&self) -> &FileIdentity {
        &self.identity
    }

    /// Whether extraction has run (or the entry came from a snapshot).
    /// Does not trigger extraction.
    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// Run extraction if it has not run yet. Returns the latch state
    /// afterwards: `false` means the attempt failed and will be retried.
    pub fn ensure_initialized(&self) -> bool {
        self.initialized_state().initialized
    }

    /// Run extraction on tokio's blocking pool so request handlers never do
    /// it inline. Readers arriving meanwhile block on this entry only.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_prefetch(self: &Arc<Self>) -> tokio::task::JoinHandle<bool> {
        let entry = Arc::clone(self);
        tokio::task::spawn_blocking(move || entry.ensure_initialized())
    }

    pub fn actors(&self) -> Option<Vec<String>> {
        self.initialized_state().meta.actors.clone()
    }

    pub fn description(&self) -> Option<String> {
        self.initialized_state().meta.description.clone()
    }

    pub fn director(&self) -> Option<String> {
        self.initialized_state().meta.director.clone()
    }

    /// Genre from the tags. A missing or blank genre is
    /// [`MediaError::NotSupported`], never an empty string.
    pub fn genre(&self) -> Result<String, MediaError> {
        match self.initialized_state().meta.genre.as_deref() {
            Some(genre) if !genre.trim().is_empty() => Ok(genre.to_string()),
            _ => Err(MediaError::NotSupported("genre")),
        }
    }

    /// Title tag as stored in the file, without the file name.
    pub fn tag_title(&self) -> Option<String> {
        self.initialized_state().meta.title.clone()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.initialized_state().meta.duration
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.initialized_state().meta.resolution
    }

    pub fn width(&self) -> Option<u32> {
        self.resolution().map(|r| r.width)
    }

    pub fn height(&self) -> Option<u32> {
        self.resolution().map(|r| r.height)
    }

    /// File title, suffixed with the tag title when there is a non-blank one.
    pub fn display_title(&self) -> String {
        let base = self.identity.base_title();
        match self.tag_title() {
            Some(title) if !title.trim().is_empty() => format!("{base}{TITLE_SEPARATOR}{title}"),
            _ => base,
        }
    }

    /// Resume position. Reading it never triggers extraction.
    pub fn bookmark(&self) -> Option<u64> {
        self.lock().bookmark
    }

    /// Set (`Some`) or clear (`None`) the resume position.
    ///
    /// Setting always persists. Clearing persists only when a bookmark was
    /// actually removed, so a restart does not bring a cleared one back.
    /// `Some(0)` is the on-disk "no bookmark" value and clears.
    pub fn set_bookmark(&self, value: Option<u64>) {
        let value = value.filter(|v| *v != 0);
        let mut state = self.initialized_state();
        let previous = std::mem::replace(&mut state.bookmark, value);
        if value.is_some() || previous.is_some() {
            self.notify(&state);
        }
    }

    /// The entry's subtitle, resolved on first access and kept afterwards.
    ///
    /// When subtitle lookup is disabled an empty subtitle is returned and
    /// nothing is recorded, so enabling it later still finds sidecars.
    pub fn subtitle(&self) -> Arc<Subtitle> {
        let mut state = self.initialized_state();
        if let Some(subtitle) = &state.subtitle {
            return Arc::clone(subtitle);
        }
        if !self.ctx.subtitles.is_enabled() {
            return Arc::new(Subtitle::empty());
        }

        let subtitle = Arc::new(self.ctx.subtitles.resolve(&self.identity.path));
        state.subtitle = Some(Arc::clone(&subtitle));
        self.notify(&state);
        subtitle
    }

    /// Persisted fields, extracting first if needed.
    pub fn snapshot(&self) -> EntrySnapshot {
        self.initialized_state().to_snapshot()
    }

    fn lock(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn initialized_state(&self) -> MutexGuard<'_, EntryState> {
        let mut state = self.lock();
        if !state.initialized {
            self.initialize(&mut state);
        }
        state
    }

    fn initialize(&self, state: &mut EntryState) {
        match self.extract() {
            Extraction::Extracted(meta) => {
                state.meta = meta;
                state.initialized = true;
                self.notify(state);
            }
            Extraction::Rejected => {
                state.initialized = true;
            }
            Extraction::Failed => {}
        }
    }

    fn extract(&self) -> Extraction {
        let path = &self.identity.path;
        let mut file = match self.ctx.tag_reader.open(path) {
            Ok(file) => file,
            Err(e) if e.is_permanent() => {
                tracing::debug!("Failed to read metadata for {}: {}", path.display(), e);
                return Extraction::Rejected;
            }
            Err(e) => {
                tracing::warn!(
                    "Unhandled error reading metadata for {}: {}",
                    path.display(),
                    e
                );
                return Extraction::Failed;
            }
        };

        let mut meta = VideoMeta::default();

        match file.properties() {
            Ok(props) => {
                meta.duration = props.duration.filter(|d| *d >= MIN_DURATION);
                meta.resolution = Resolution::from_parts(props.width, props.height);
            }
            Err(e) => tracing::debug!("Failed to read stream properties of {}: {}", path.display(), e),
        }

        match file.tags() {
            Ok(tags) => apply_tags(&mut meta, tags),
            Err(e) => tracing::debug!("Failed to read tags of {}: {}", path.display(), e),
        }

        Extraction::Extracted(meta)
    }

    /// Hand the current state to the store. Skipped while uninitialized: a
    /// snapshot always restores as initialized, so persisting an entry whose
    /// extraction has not succeeded would suppress it forever.
    fn notify(&self, state: &EntryState) {
        if !state.initialized {
            tracing::debug!(
                "Not persisting {} before its metadata is read",
                self.identity.path.display()
            );
            return;
        }
        self.ctx.store.notify_updated(&self.identity, &state.to_snapshot());
    }
}

fn non_empty(values: Option<Vec<String>>) -> Option<Vec<String>> {
    values.filter(|v| !v.is_empty())
}

fn apply_tags(meta: &mut VideoMeta, tags: DescriptiveTags) {
    meta.title = tags.title;
    meta.genre = tags.genre;
    meta.description = tags.comment;
    meta.director = tags
        .composer_sort
        .filter(|d| !d.trim().is_empty())
        .or(tags.composer);
    meta.actors = non_empty(tags.performers_sort)
        .or_else(|| non_empty(tags.performers))
        .or(tags.album_artists);
}

impl MediaResource for MediaEntry {
    fn id(&self) -> String {
        self.identity.id.to_string()
    }

    fn mime(&self) -> &'static str {
        self.identity.mime
    }

    fn size(&self) -> Option<u64> {
        Some(self.identity.file_size)
    }

    /// Description, Actors, Director, Duration, Genre, Resolution, in that
    /// order, each only when known.
    fn properties(&self) -> Properties {
        let state = self.initialized_state();
        let meta = &state.meta;
        let mut props = Properties::new();
        if let Some(description) = &meta.description {
            props.add("Description", description.clone());
        }
        if let Some(actors) = meta.actors.as_ref().filter(|a| !a.is_empty()) {
            props.add("Actors", actors.join(", "));
        }
        if let Some(director) = &meta.director {
            props.add("Director", director.clone());
        }
        if let Some(duration) = meta.duration {
            props.add("Duration", format_short_duration(duration));
        }
        if let Some(genre) = &meta.genre {
            props.add("Genre", genre.clone());
        }
        if let Some(resolution) = meta.resolution {
            props.add("Resolution", resolution.to_string());
        }
        props
    }

    fn content_stream(&self) -> Result<ContentStream, MediaError> {
        let file = std::fs::File::open(&self.identity.path)?;
        Ok(Box::new(file))
    }

    fn title(&self) -> Result<String, MediaError> {
        Ok(self.display_title())
    }

    fn compare_to(&self, other: &dyn MediaResource) -> Result<Ordering, MediaError> {
        let mine = self.display_title().to_lowercase();
        let theirs = other.title()?.to_lowercase();
        Ok(mine.cmp(&theirs).then_with(|| self.id().cmp(&other.id())))
    }

    fn same_item(&self, other: &dyn MediaResource) -> Result<bool, MediaError> {
        Ok(self.id() == other.id())
    }
}
