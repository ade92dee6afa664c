pub mod codec;
pub mod convert;
pub mod entry;
pub mod identity;
pub mod library;
pub mod metadata;
pub mod mime;
pub mod properties;
pub mod resource;
pub mod scanner;
pub mod store;
pub mod subtitle;
pub mod tags;
