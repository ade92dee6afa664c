use std::path::Path;
use std::time::Duration;

use crate::error::TagError;

/// Structural properties of a container. `None` when the container does not
/// expose the value; 0 is never used to mean "unknown" here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamProperties {
    pub duration: Option<Duration>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Descriptive tags as stored in the container, before any fallback logic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptiveTags {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub comment: Option<String>,
    pub composer_sort: Option<String>,
    pub composer: Option<String>,
    pub performers_sort: Option<Vec<String>>,
    pub performers: Option<Vec<String>>,
    pub album_artists: Option<Vec<String>>,
}

/// Opens media files for tag reading.
///
/// `open` is where a file is classified: a permanent [`TagError`] there is
/// cached by the entry as a negative result. The two reads on the returned
/// [`TagFile`] fail independently of each other.
pub trait TagReader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn TagFile>, TagError>;
}

/// An opened media file.
pub trait TagFile {
    fn properties(&mut self) -> Result<StreamProperties, TagError>;
    fn tags(&mut self) -> Result<DescriptiveTags, TagError>;
}
