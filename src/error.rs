//! Error types shared by the media modules.

use thiserror::Error;

/// Failure signalled by a [`TagReader`](crate::media::tags::TagReader).
///
/// `Corrupt` and `UnsupportedFormat` are permanent: a file that produced them
/// will never parse, so the entry caches the negative result. Everything else
/// is treated as transient and retried on the next access.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("corrupt file: {0}")]
    Corrupt(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl TagError {
    /// True for failures that a retry can never fix.
    pub fn is_permanent(&self) -> bool {
        matches!(self, TagError::Corrupt(_) | TagError::UnsupportedFormat(_))
    }
}

/// Failure signalled by a [`SubtitleConverter`](crate::media::convert::SubtitleConverter).
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The candidate cannot be converted at all (no converter, no subtitle stream).
    #[error("subtitle conversion not supported: {0}")]
    NotSupported(String),

    #[error("subtitle conversion failed: {0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed snapshot bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("snapshot truncated: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("field `{tag}` is not valid UTF-8")]
    InvalidUtf8 { tag: String },

    #[error("field `{tag}` has length {found}, expected {expected}")]
    BadLength {
        tag: String,
        expected: usize,
        found: usize,
    },

    #[error("field `{0}` appears more than once")]
    DuplicateTag(String),

    #[error("{0} trailing bytes after snapshot")]
    TrailingBytes(usize),

    #[error("field `{tag}` is {len} bytes, too long to encode")]
    TooLarge { tag: String, len: usize },
}

/// Errors surfaced to consumers of a media resource.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The resource deliberately lacks this capability, or the value is unavailable.
    #[error("{0} is not supported")]
    NotSupported(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn is_not_supported(&self) -> bool {
        matches!(self, MediaError::NotSupported(_))
    }
}
