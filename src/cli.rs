use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vidmeta",
    about = "Read, cache and print video metadata and subtitles for media directories",
    long_about = None,
    version,
    arg_required_else_help = true,
)]
pub struct Args {
    /// One or more directories containing video files
    #[arg(num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Path to TOML config file (overrides default search: ./vidmeta.toml, ~/.config/vidmeta/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for metadata snapshots [default: ~/.cache/vidmeta]
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// ffmpeg binary used to convert subtitles [default: ffmpeg]
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Skip companion subtitle lookup
    #[arg(long)]
    pub no_subtitles: bool,

    /// Read metadata lazily on output instead of in the background right after the scan
    #[arg(long)]
    pub no_prefetch: bool,
}
