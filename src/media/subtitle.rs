//! Companion subtitle lookup and the in-memory subtitle resource.

use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{ConvertError, MediaError};
use crate::media::convert::SubtitleConverter;
use crate::media::mime::SUBTITLE_MIME;
use crate::media::properties::{format_file_size, Properties};
use crate::media::resource::{ContentStream, MediaResource};

/// Sidecar extensions, in search order. Both cases are listed because the
/// lookup is a plain path probe and the file system may be case-sensitive.
pub const SUBTITLE_EXTENSIONS: &[&str] = &[
    ".srt", ".SRT", ".ass", ".ASS", ".ssa", ".SSA", ".sub", ".SUB", ".vtt", ".VTT",
];

/// Identifier every subtitle resource reports; subtitles are addressed through
/// their media entry, never on their own.
pub const SUBTITLE_ID: &str = "ad-hoc-subtitle:";

/// Case-sensitive check of a dotted extension (`".srt"`) against the list.
pub fn subtitle_format_supported(ext: &str) -> bool {
    SUBTITLE_EXTENSIONS.contains(&ext)
}

fn path_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| subtitle_format_supported(&format!(".{e}")))
}

/// SubRip text attached to a media entry, or the explicit absence of one.
///
/// Immutable after construction. The UTF-8 form is built on the first
/// content request and shared by every stream handed out afterwards.
#[derive(Debug, Clone)]
pub struct Subtitle {
    text: Option<String>,
    encoded: OnceLock<Arc<[u8]>>,
    created: DateTime<Utc>,
}

impl Subtitle {
    /// A subtitle resource with nothing to stream.
    pub fn empty() -> Self {
        Self {
            text: None,
            encoded: OnceLock::new(),
            created: Utc::now(),
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::empty()
        }
    }

    pub(crate) fn from_optional(text: Option<String>) -> Self {
        Self {
            text,
            ..Self::empty()
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// False for absent or whitespace-only text.
    pub fn has_subtitle(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// The cached UTF-8 bytes, materialized on first call.
    pub fn bytes(&self) -> Result<Arc<[u8]>, MediaError> {
        match self.text.as_deref() {
            Some(text) if self.has_subtitle() => Ok(Arc::clone(
                self.encoded.get_or_init(|| Arc::from(text.as_bytes())),
            )),
            _ => Err(MediaError::NotSupported("subtitle content")),
        }
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

impl Default for Subtitle {
    fn default() -> Self {
        Self::empty()
    }
}

impl MediaResource for Subtitle {
    fn id(&self) -> String {
        SUBTITLE_ID.to_string()
    }

    fn mime(&self) -> &'static str {
        SUBTITLE_MIME
    }

    fn size(&self) -> Option<u64> {
        self.bytes().ok().map(|b| b.len() as u64)
    }

    fn properties(&self) -> Properties {
        let mut props = Properties::new();
        props.add("Type", self.mime());
        if let Some(size) = self.size() {
            props.add("SizeRaw", size.to_string());
            props.add("Size", format_file_size(size));
        }
        props.add("Date", self.created.format("%Y-%m-%d %H:%M:%S").to_string());
        props.add(
            "DateO",
            self.created.to_rfc3339_opts(SecondsFormat::Micros, true),
        );
        props
    }

    fn content_stream(&self) -> Result<ContentStream, MediaError> {
        Ok(Box::new(Cursor::new(self.bytes()?)))
    }
}

/// Finds and converts the subtitle belonging to a media file.
#[derive(Clone)]
pub struct SubtitleResolver {
    converter: Arc<dyn SubtitleConverter>,
    enabled: bool,
}

impl std::fmt::Debug for SubtitleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubtitleResolver")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl SubtitleResolver {
    pub fn new(converter: Arc<dyn SubtitleConverter>) -> Self {
        Self {
            converter,
            enabled: true,
        }
    }

    /// Turn the lookup on or off. A disabled resolver never touches the
    /// file system and always yields [`Subtitle::empty`].
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Search the sidecar candidates of `media` in order and return the first
    /// one that converts to non-empty text. Never fails: when nothing
    /// converts, the result is an empty subtitle.
    pub fn resolve(&self, media: &Path) -> Subtitle {
        if !self.enabled {
            return Subtitle::empty();
        }

        for ext in SUBTITLE_EXTENSIONS {
            let Some(candidate) = sidecar_candidate(media, ext) else {
                continue;
            };
            if !path_supported(&candidate) {
                continue;
            }
            if let Some(text) = self.try_convert(&candidate) {
                tracing::debug!(
                    "Subtitle for {} from {}",
                    media.display(),
                    candidate.display()
                );
                return Subtitle::from_text(text);
            }
        }

        // Text subtitle handed in as the media file itself.
        if path_supported(media) {
            if let Some(text) = self.try_convert(media) {
                return Subtitle::from_text(text);
            }
        }

        Subtitle::empty()
    }

    fn try_convert(&self, candidate: &Path) -> Option<String> {
        match self.converter.convert(candidate) {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => {
                tracing::debug!("Empty subtitle from {}", candidate.display());
                None
            }
            Err(ConvertError::NotSupported(why)) => {
                tracing::trace!("Cannot convert {}: {}", candidate.display(), why);
                None
            }
            Err(e) => {
                tracing::debug!("Failed to get subtitle from {}: {}", candidate.display(), e);
                None
            }
        }
    }
}

/// `movie.srt` if it exists, else `movie.mp4.srt` if that exists.
fn sidecar_candidate(media: &Path, ext: &str) -> Option<PathBuf> {
    let replaced = media.with_extension(ext.trim_start_matches('.'));
    if exists(&replaced) {
        return Some(replaced);
    }

    let mut appended: OsString = media.as_os_str().to_owned();
    appended.push(ext);
    let appended = PathBuf::from(appended);
    if exists(&appended) {
        return Some(appended);
    }
    None
}

fn exists(path: &Path) -> bool {
    match path.try_exists() {
        Ok(found) => found && path.is_file(),
        Err(e) => {
            tracing::debug!("Cannot probe {}: {}", path.display(), e);
            false
        }
    }
}
