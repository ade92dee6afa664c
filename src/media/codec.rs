//! Presence-encoded snapshot format.
//!
//! A record lists the tags it carries first and their values second:
//!
//! ```text
//! u8 count
//! count × (u8 tag_len, tag bytes)
//! count × (u32 LE value_len, value bytes)
//! ```
//!
//! A decoder fills only the fields whose tags it finds and skips tags it does
//! not know, so fields can be added or dropped without a version number. Tag
//! names are part of the on-disk format and must never be reused.
//!
//! Value encodings: strings are raw UTF-8; `w`/`h` are `u32` LE; `b` is `u64`
//! LE; `du` is an `i64` LE count of 100ns ticks; `a` is a `u32` LE count
//! followed by `u32` LE length-prefixed strings; `st` is a nested record.
//!
//! The layout (tag list first, values second) is fixed by the files already
//! on disk and no serde format produces it, so it is framed by hand below.
//! Values longer than `u32::MAX` bytes cannot be framed and fail to encode.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::CodecError;

pub const TAG_ACTORS: &str = "a";
pub const TAG_DESCRIPTION: &str = "de";
pub const TAG_DIRECTOR: &str = "di";
pub const TAG_GENRE: &str = "g";
pub const TAG_TITLE: &str = "t";
pub const TAG_WIDTH: &str = "w";
pub const TAG_HEIGHT: &str = "h";
pub const TAG_BOOKMARK: &str = "b";
pub const TAG_DURATION: &str = "du";
pub const TAG_SUBTITLE: &str = "st";
pub const TAG_SUBTITLE_TEXT: &str = "tx";

/// Duration unit on disk.
pub const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: u128 = 100;

/// Persisted fields of a media entry, in their on-disk shape: zero sentinels
/// for the integer fields, `None` for strings and lists that were never set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub actors: Option<Vec<String>>,
    pub description: Option<String>,
    pub director: Option<String>,
    pub genre: Option<String>,
    pub title: Option<String>,
    pub width: u32,
    pub height: u32,
    pub bookmark: u64,
    pub duration_ticks: i64,
    pub subtitle: Option<SubtitleSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleSnapshot {
    pub text: Option<String>,
}

/// Ticks for a duration; `None` shares the zero sentinel with a zero-length
/// duration, so the two cannot be told apart after a reload.
pub fn duration_to_ticks(duration: Option<Duration>) -> i64 {
    duration
        .map(|d| i64::try_from(d.as_nanos() / NANOS_PER_TICK).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Inverse of [`duration_to_ticks`]; non-positive tick counts are absent.
pub fn ticks_to_duration(ticks: i64) -> Option<Duration> {
    if ticks <= 0 {
        return None;
    }
    let ticks = ticks as u64;
    let secs = ticks / TICKS_PER_SECOND as u64;
    let nanos = (ticks % TICKS_PER_SECOND as u64) * NANOS_PER_TICK as u64;
    Some(Duration::new(secs, nanos as u32))
}

impl EntrySnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut rec = RecordWriter::default();
        if let Some(actors) = &self.actors {
            rec.field(TAG_ACTORS, encode_strings(TAG_ACTORS, actors)?);
        }
        rec.string(TAG_DESCRIPTION, self.description.as_deref());
        rec.string(TAG_DIRECTOR, self.director.as_deref());
        rec.string(TAG_GENRE, self.genre.as_deref());
        rec.string(TAG_TITLE, self.title.as_deref());
        rec.field(TAG_WIDTH, self.width.to_le_bytes().to_vec());
        rec.field(TAG_HEIGHT, self.height.to_le_bytes().to_vec());
        rec.field(TAG_BOOKMARK, self.bookmark.to_le_bytes().to_vec());
        rec.field(TAG_DURATION, self.duration_ticks.to_le_bytes().to_vec());
        if let Some(subtitle) = &self.subtitle {
            rec.field(TAG_SUBTITLE, subtitle.encode()?);
        }
        rec.finish()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut snapshot = EntrySnapshot::default();
        for (tag, value) in read_record(bytes)? {
            match tag {
                TAG_ACTORS => snapshot.actors = Some(decode_strings(tag, value)?),
                TAG_DESCRIPTION => snapshot.description = Some(decode_string(tag, value)?),
                TAG_DIRECTOR => snapshot.director = Some(decode_string(tag, value)?),
                TAG_GENRE => snapshot.genre = Some(decode_string(tag, value)?),
                TAG_TITLE => snapshot.title = Some(decode_string(tag, value)?),
                TAG_WIDTH => snapshot.width = u32::from_le_bytes(fixed(tag, value)?),
                TAG_HEIGHT => snapshot.height = u32::from_le_bytes(fixed(tag, value)?),
                TAG_BOOKMARK => snapshot.bookmark = u64::from_le_bytes(fixed(tag, value)?),
                TAG_DURATION => snapshot.duration_ticks = i64::from_le_bytes(fixed(tag, value)?),
                TAG_SUBTITLE => snapshot.subtitle = Some(SubtitleSnapshot::decode(value)?),
                unknown => tracing::trace!("Skipping unknown snapshot field `{}`", unknown),
            }
        }
        Ok(snapshot)
    }
}

impl SubtitleSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut rec = RecordWriter::default();
        rec.string(TAG_SUBTITLE_TEXT, self.text.as_deref());
        rec.finish()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut snapshot = SubtitleSnapshot::default();
        for (tag, value) in read_record(bytes)? {
            match tag {
                TAG_SUBTITLE_TEXT => snapshot.text = Some(decode_string(tag, value)?),
                unknown => tracing::trace!("Skipping unknown subtitle field `{}`", unknown),
            }
        }
        Ok(snapshot)
    }
}

#[derive(Default)]
struct RecordWriter {
    fields: Vec<(&'static str, Vec<u8>)>,
}

impl RecordWriter {
    fn field(&mut self, tag: &'static str, value: Vec<u8>) {
        self.fields.push((tag, value));
    }

    fn string(&mut self, tag: &'static str, value: Option<&str>) {
        if let Some(value) = value {
            self.field(tag, value.as_bytes().to_vec());
        }
    }

    fn finish(self) -> Result<Vec<u8>, CodecError> {
        // Records are built from the fixed tag lists above; far below u8::MAX.
        debug_assert!(self.fields.len() <= u8::MAX as usize);
        let mut out = vec![self.fields.len() as u8];
        for (tag, _) in &self.fields {
            out.push(tag.len() as u8);
            out.extend_from_slice(tag.as_bytes());
        }
        for (tag, value) in &self.fields {
            out.extend_from_slice(&length_prefix(tag, value.len())?);
            out.extend_from_slice(value);
        }
        Ok(out)
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(CodecError::Truncated {
                offset: self.pos,
                needed: n,
            })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(raw))
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Split a record into `(tag, value)` pairs, in tag-list order.
fn read_record(bytes: &[u8]) -> Result<Vec<(&str, &[u8])>, CodecError> {
    let mut reader = Reader::new(bytes);
    let count = reader.u8()? as usize;

    let mut seen = HashSet::with_capacity(count);
    let mut tags = Vec::with_capacity(count);
    for _ in 0..count {
        let len = reader.u8()? as usize;
        let raw = reader.take(len)?;
        let tag = std::str::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8 {
            tag: String::from_utf8_lossy(raw).into_owned(),
        })?;
        if !seen.insert(tag) {
            return Err(CodecError::DuplicateTag(tag.to_string()));
        }
        tags.push(tag);
    }

    let mut fields = Vec::with_capacity(count);
    for tag in tags {
        let len = reader.u32()? as usize;
        fields.push((tag, reader.take(len)?));
    }

    match reader.remaining() {
        0 => Ok(fields),
        extra => Err(CodecError::TrailingBytes(extra)),
    }
}

fn decode_string(tag: &str, value: &[u8]) -> Result<String, CodecError> {
    String::from_utf8(value.to_vec()).map_err(|_| CodecError::InvalidUtf8 {
        tag: tag.to_string(),
    })
}

fn fixed<const N: usize>(tag: &str, value: &[u8]) -> Result<[u8; N], CodecError> {
    value.try_into().map_err(|_| CodecError::BadLength {
        tag: tag.to_string(),
        expected: N,
        found: value.len(),
    })
}

/// The `u32` LE length prefix written ahead of a value or list.
pub fn length_prefix(tag: &str, len: usize) -> Result<[u8; 4], CodecError> {
    u32::try_from(len)
        .map(u32::to_le_bytes)
        .map_err(|_| CodecError::TooLarge {
            tag: tag.to_string(),
            len,
        })
}

fn encode_strings(tag: &str, values: &[String]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    out.extend_from_slice(&length_prefix(tag, values.len())?);
    for value in values {
        out.extend_from_slice(&length_prefix(tag, value.len())?);
        out.extend_from_slice(value.as_bytes());
    }
    Ok(out)
}

fn decode_strings(tag: &str, value: &[u8]) -> Result<Vec<String>, CodecError> {
    let mut reader = Reader::new(value);
    let count = reader.u32()? as usize;
    // Each element needs at least its length prefix.
    let mut out = Vec::with_capacity(count.min(reader.remaining() / 4));
    for _ in 0..count {
        let len = reader.u32()? as usize;
        out.push(decode_string(tag, reader.take(len)?)?);
    }
    match reader.remaining() {
        0 => Ok(out),
        extra => Err(CodecError::TrailingBytes(extra)),
    }
}
