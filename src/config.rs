use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::media::convert::FfmpegConverter;
use crate::media::entry::MediaContext;
use crate::media::metadata::ContainerTagReader;
use crate::media::store::DirectoryStore;
use crate::media::subtitle::SubtitleResolver;

const DEFAULT_FFMPEG: &str = "ffmpeg";

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("vidmeta"))
        .unwrap_or_else(|| PathBuf::from(".vidmeta-cache"))
}

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub cache_dir: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
    pub subtitles: Option<bool>,
    pub prefetch: Option<bool>,
}

#[derive(Debug)]
pub struct Config {
    pub paths: Vec<PathBuf>,
    pub cache_dir: PathBuf,
    pub ffmpeg: PathBuf,
    pub subtitles: bool,
    pub prefetch: bool,
}

impl Config {
    /// CLI flags win over the config file, which wins over defaults.
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Self {
        let file = file.unwrap_or_default();
        Config {
            paths: args.paths.clone(),
            cache_dir: args
                .cache_dir
                .clone()
                .or(file.cache_dir)
                .unwrap_or_else(default_cache_dir),
            ffmpeg: args
                .ffmpeg
                .clone()
                .or(file.ffmpeg)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG)),
            subtitles: !args.no_subtitles && file.subtitles.unwrap_or(true),
            prefetch: !args.no_prefetch && file.prefetch.unwrap_or(true),
        }
    }

    /// Wire up the collaborators every entry shares.
    pub fn media_context(&self) -> std::io::Result<MediaContext> {
        let store = DirectoryStore::open(&self.cache_dir)?;
        let subtitles = SubtitleResolver::new(Arc::new(FfmpegConverter::new(&self.ffmpeg)))
            .enabled(self.subtitles);
        Ok(MediaContext::new(
            Arc::new(ContainerTagReader),
            subtitles,
            Arc::new(store),
        ))
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("vidmeta.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let xdg_config = config_dir.join("vidmeta").join("config.toml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}
