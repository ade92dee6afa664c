//! [`TagReader`] backed by the container headers of the file itself.
//!
//! MP4-family files are read twice: the mp4 crate for the video track
//! dimensions, symphonia for tags. Everything else goes through symphonia's
//! probe alone, which covers duration and tags but not frame dimensions.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatReader;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataRevision, StandardTagKey};
use symphonia::core::probe::{Hint, ProbeResult};

use crate::error::TagError;
use crate::media::mime::{classify, is_mp4};
use crate::media::tags::{DescriptiveTags, StreamProperties, TagFile, TagReader};

/// Reads tags straight from container headers. Stateless; share it freely.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerTagReader;

impl TagReader for ContainerTagReader {
    fn open(&self, path: &Path) -> Result<Box<dyn TagFile>, TagError> {
        let mime = classify(path).map(|(_, mime)| mime).unwrap_or("");
        if is_mp4(mime) {
            return open_mp4(path);
        }

        let mut probed = probe(path)?;
        let tags = collect_tags(&mut probed);
        Ok(Box::new(ProbedFile {
            format: probed.format,
            tags,
        }))
    }
}

/// The mp4 crate parses the header for dimensions; symphonia's isomp4 reader
/// exposes the full ilst tag list. Either can reject a file the other
/// accepts, so the file is only refused when both do.
fn open_mp4(path: &Path) -> Result<Box<dyn TagFile>, TagError> {
    let properties = read_mp4_properties(path);
    let tags = probe(path).map(|mut probed| collect_tags(&mut probed));

    match (properties, tags) {
        (Err(header), Err(probe)) => {
            tracing::trace!("mp4 header of {} unreadable: {}", path.display(), header);
            // A transient header failure wins so the next access retries.
            Err(if header.is_permanent() { probe } else { header })
        }
        (properties, tags) => Ok(Box::new(Mp4File {
            properties: Some(properties),
            tags: Some(tags),
        })),
    }
}

fn read_mp4_properties(path: &Path) -> Result<StreamProperties, TagError> {
    use mp4::TrackType;

    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let header =
        mp4::Mp4Reader::read_header(BufReader::new(file), file_len).map_err(mp4_error)?;

    let mut props = StreamProperties {
        duration: Some(header.duration()),
        ..Default::default()
    };
    for track in header.tracks().values() {
        if matches!(track.track_type(), Ok(TrackType::Video)) {
            props.width = Some(u32::from(track.width()));
            props.height = Some(u32::from(track.height()));
            break;
        }
    }
    Ok(props)
}

/// An ISO-BMFF container; each half was read independently at open.
struct Mp4File {
    properties: Option<Result<StreamProperties, TagError>>,
    tags: Option<Result<Vec<RawTag>, TagError>>,
}

impl TagFile for Mp4File {
    fn properties(&mut self) -> Result<StreamProperties, TagError> {
        self.properties.take().unwrap_or_else(|| {
            Err(TagError::Other("stream properties already taken".to_string()))
        })
    }

    fn tags(&mut self) -> Result<DescriptiveTags, TagError> {
        let tags = self
            .tags
            .take()
            .unwrap_or_else(|| Err(TagError::Other("tags already taken".to_string())))?;
        Ok(fold_tags(&tags))
    }
}

/// A container opened through symphonia's probe.
struct ProbedFile {
    format: Box<dyn FormatReader>,
    tags: Vec<RawTag>,
}

impl TagFile for ProbedFile {
    fn properties(&mut self) -> Result<StreamProperties, TagError> {
        let track = self
            .format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| TagError::Other("no decodable track".to_string()))?;

        // n_frames is missing for streams without an index (VBR without Xing,
        // some MPEG-TS); leave duration unknown rather than guessing.
        let duration = track.codec_params.time_base.and_then(|tb| {
            track.codec_params.n_frames.map(|n| {
                let t = tb.calc_time(n);
                Duration::from_secs(t.seconds) + Duration::from_secs_f64(t.frac)
            })
        });

        Ok(StreamProperties {
            duration,
            width: None,
            height: None,
        })
    }

    fn tags(&mut self) -> Result<DescriptiveTags, TagError> {
        Ok(fold_tags(&self.tags))
    }
}

#[derive(Debug, Clone)]
struct RawTag {
    key: Option<StandardTagKey>,
    value: String,
}

fn probe(path: &Path) -> Result<ProbeResult, TagError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    symphonia::default::get_probe()
        .format(&hint, mss, &Default::default(), &Default::default())
        .map_err(symphonia_error)
}

/// Tags can live ahead of the container (ID3v2 on a TS file) or inside it.
/// The outer block is gathered first and wins single-value lookups.
fn collect_tags(probed: &mut ProbeResult) -> Vec<RawTag> {
    let mut tags = Vec::new();
    if let Some(metadata) = probed.metadata.get() {
        if let Some(rev) = metadata.current() {
            push_revision(rev, &mut tags);
        }
    }
    let metadata = probed.format.metadata();
    if let Some(rev) = metadata.current() {
        push_revision(rev, &mut tags);
    }
    tags
}

fn push_revision(rev: &MetadataRevision, out: &mut Vec<RawTag>) {
    for tag in rev.tags() {
        out.push(RawTag {
            key: tag.std_key,
            value: tag.value.to_string(),
        });
    }
}

fn first(tags: &[RawTag], key: StandardTagKey) -> Option<String> {
    tags.iter()
        .find(|t| t.key == Some(key))
        .map(|t| t.value.clone())
}

fn all(tags: &[RawTag], key: StandardTagKey) -> Option<Vec<String>> {
    let values: Vec<String> = tags
        .iter()
        .filter(|t| t.key == Some(key))
        .map(|t| t.value.clone())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn fold_tags(tags: &[RawTag]) -> DescriptiveTags {
    let performers =
        all(tags, StandardTagKey::Artist).or_else(|| all(tags, StandardTagKey::Performer));
    DescriptiveTags {
        title: first(tags, StandardTagKey::TrackTitle),
        genre: first(tags, StandardTagKey::Genre),
        comment: first(tags, StandardTagKey::Comment),
        composer_sort: first(tags, StandardTagKey::SortComposer),
        composer: first(tags, StandardTagKey::Composer),
        performers_sort: all(tags, StandardTagKey::SortArtist),
        performers,
        album_artists: all(tags, StandardTagKey::AlbumArtist),
    }
}

fn symphonia_error(err: SymphoniaError) -> TagError {
    match err {
        SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            TagError::Corrupt(format!("unexpected end of stream: {e}"))
        }
        SymphoniaError::IoError(e) => TagError::Io(e),
        SymphoniaError::Unsupported(what) => TagError::UnsupportedFormat(what.to_string()),
        SymphoniaError::DecodeError(what) => TagError::Corrupt(what.to_string()),
        other => TagError::Other(other.to_string()),
    }
}

fn mp4_error(err: mp4::Error) -> TagError {
    match err {
        mp4::Error::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            TagError::Corrupt(format!("truncated header: {e}"))
        }
        mp4::Error::IoError(e) => TagError::Io(e),
        other => TagError::Corrupt(other.to_string()),
    }
}
