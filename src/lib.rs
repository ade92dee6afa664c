//! Video metadata core for media servers: lazy tag extraction, subtitle lookup,
//! and a presence-encoded snapshot cache so extraction never repeats for an
//! unchanged file.

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
