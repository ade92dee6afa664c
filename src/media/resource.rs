use std::cmp::Ordering;
use std::io::Read;

use crate::error::MediaError;
use crate::media::properties::Properties;

/// Readable body of a resource. Every call to
/// [`MediaResource::content_stream`] hands out a new, independent one.
pub type ContentStream = Box<dyn Read + Send>;

/// Something the serving layer can list and stream.
///
/// The item-level operations have defaults that refuse with
/// [`MediaError::NotSupported`]; resources that are not full media items
/// (subtitles) keep those defaults so callers get an explicit signal rather
/// than an empty value.
pub trait MediaResource {
    fn id(&self) -> String;

    fn mime(&self) -> &'static str;

    fn size(&self) -> Option<u64>;

    fn properties(&self) -> Properties;

    fn content_stream(&self) -> Result<ContentStream, MediaError>;

    fn title(&self) -> Result<String, MediaError> {
        Err(MediaError::NotSupported("title"))
    }

    fn cover(&self) -> Result<Vec<u8>, MediaError> {
        Err(MediaError::NotSupported("cover art"))
    }

    fn set_id(&mut self, _id: String) -> Result<(), MediaError> {
        Err(MediaError::NotSupported("assigning an id"))
    }

    fn compare_to(&self, _other: &dyn MediaResource) -> Result<Ordering, MediaError> {
        Err(MediaError::NotSupported("ordering"))
    }

    fn same_item(&self, _other: &dyn MediaResource) -> Result<bool, MediaError> {
        Err(MediaError::NotSupported("equality"))
    }
}
