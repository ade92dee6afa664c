#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use vidmeta::error::{ConvertError, TagError};
use vidmeta::media::convert::SubtitleConverter;
use vidmeta::media::entry::{MediaContext, MediaEntry};
use vidmeta::media::identity::FileIdentity;
use vidmeta::media::store::MemoryStore;
use vidmeta::media::subtitle::SubtitleResolver;
use vidmeta::media::tags::{DescriptiveTags, StreamProperties, TagFile, TagReader};

// ── Tag reader ───────────────────────────────────────────────────────────────

/// Serves fixed tags and counts how often a file is opened. `None` for
/// properties or tags makes that read fail.
pub struct FakeTagReader {
    opens: AtomicUsize,
    open_failures: Mutex<VecDeque<TagError>>,
    properties: Option<StreamProperties>,
    tags: Option<DescriptiveTags>,
    delay: Option<Duration>,
}

impl FakeTagReader {
    pub fn new(properties: Option<StreamProperties>, tags: Option<DescriptiveTags>) -> Self {
        Self {
            opens: AtomicUsize::new(0),
            open_failures: Mutex::new(VecDeque::new()),
            properties,
            tags,
            delay: None,
        }
    }

    /// Reader whose every open fails with `err()`.
    pub fn failing(err: fn() -> TagError, times: usize) -> Self {
        let reader = Self::new(None, None);
        {
            let mut failures = reader.open_failures.lock().unwrap();
            for _ in 0..times {
                failures.push_back(err());
            }
        }
        reader
    }

    /// Queue a failure for the next open; later opens succeed.
    pub fn fail_next_open(self, err: TagError) -> Self {
        self.open_failures.lock().unwrap().push_back(err);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl TagReader for FakeTagReader {
    fn open(&self, _path: &Path) -> Result<Box<dyn TagFile>, TagError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if let Some(err) = self.open_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(Box::new(FakeTagFile {
            properties: self.properties.clone(),
            tags: self.tags.clone(),
        }))
    }
}

struct FakeTagFile {
    properties: Option<StreamProperties>,
    tags: Option<DescriptiveTags>,
}

impl TagFile for FakeTagFile {
    fn properties(&mut self) -> Result<StreamProperties, TagError> {
        self.properties
            .clone()
            .ok_or_else(|| TagError::Other("properties unavailable".to_string()))
    }

    fn tags(&mut self) -> Result<DescriptiveTags, TagError> {
        self.tags
            .clone()
            .ok_or_else(|| TagError::Other("tags unavailable".to_string()))
    }
}

pub fn props(seconds: f64, width: Option<u32>, height: Option<u32>) -> StreamProperties {
    StreamProperties {
        duration: Some(Duration::from_secs_f64(seconds)),
        width,
        height,
    }
}

pub fn strings(values: &[&str]) -> Option<Vec<String>> {
    Some(values.iter().map(|s| s.to_string()).collect())
}

// ── Subtitle converter ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Conversion {
    Text(String),
    NotSupported,
    Fail,
}

/// Answers per path from a queue; the last answer repeats. Unknown paths are
/// not convertible. Records every call in order.
#[derive(Default)]
pub struct FakeConverter {
    answers: Mutex<HashMap<PathBuf, VecDeque<Conversion>>>,
    calls: Mutex<Vec<PathBuf>>,
}

impl FakeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(self, path: impl Into<PathBuf>, answers: Vec<Conversion>) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(path.into(), answers.into_iter().collect());
        self
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

impl SubtitleConverter for FakeConverter {
    fn convert(&self, path: &Path) -> Result<String, ConvertError> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        let mut answers = self.answers.lock().unwrap();
        let answer = match answers.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        match answer {
            Some(Conversion::Text(text)) => Ok(text),
            Some(Conversion::Fail) => Err(ConvertError::Failed("boom".to_string())),
            Some(Conversion::NotSupported) | None => {
                Err(ConvertError::NotSupported("no answer".to_string()))
            }
        }
    }
}

// ── Entry wiring ─────────────────────────────────────────────────────────────

pub fn identity(path: impl Into<PathBuf>) -> FileIdentity {
    FileIdentity::new(&Uuid::NAMESPACE_OID, path.into(), 1_048_576, None, "video/mp4")
}

pub struct Harness {
    pub reader: Arc<FakeTagReader>,
    pub converter: Arc<FakeConverter>,
    pub store: Arc<MemoryStore>,
    pub ctx: MediaContext,
}

impl Harness {
    pub fn new(reader: FakeTagReader) -> Self {
        Self::with_converter(reader, FakeConverter::new())
    }

    pub fn with_converter(reader: FakeTagReader, converter: FakeConverter) -> Self {
        let reader = Arc::new(reader);
        let converter = Arc::new(converter);
        let store = Arc::new(MemoryStore::new());
        let ctx = MediaContext::new(
            reader.clone(),
            SubtitleResolver::new(converter.clone()),
            store.clone(),
        );
        Self {
            reader,
            converter,
            store,
            ctx,
        }
    }

    pub fn entry(&self, path: impl Into<PathBuf>) -> MediaEntry {
        MediaEntry::new(identity(path), self.ctx.clone())
    }
}
