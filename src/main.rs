use clap::Parser;

use vidmeta::media::library::MediaLibrary;
use vidmeta::media::resource::MediaResource;
use vidmeta::{cli, config, media};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    let file_config = config::find_config_file(args.config.as_deref()).and_then(|path| {
        match config::load_config(&path) {
            Ok(cfg) => {
                tracing::debug!("Loaded config from {}", path.display());
                Some(cfg)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                None
            }
        }
    });

    let config = config::Config::resolve(file_config, &args);

    for path in &config.paths {
        if !path.is_dir() {
            eprintln!("error: not a directory: {}", path.display());
            std::process::exit(1);
        }
    }

    let ctx = match config.media_context() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!(
                "error: cannot use cache directory {}: {}",
                config.cache_dir.display(),
                e
            );
            std::process::exit(1);
        }
    };

    tracing::info!("Snapshot cache: {}", config.cache_dir.display());

    // Directory walking and stat calls block; keep them off the async workers.
    let paths = config.paths.clone();
    let library = match tokio::task::spawn_blocking(move || media::scanner::scan(&paths, &ctx)).await {
        Ok(library) => library,
        Err(e) => {
            eprintln!("error: scan task failed: {e}");
            std::process::exit(1);
        }
    };

    if library.is_empty() {
        eprintln!("error: no video files found in the provided paths -- exiting");
        std::process::exit(1);
    }

    if config.prefetch {
        prefetch(&library).await;
    }

    let printer = tokio::task::spawn_blocking(move || print_library(&library));
    if let Err(e) = printer.await {
        tracing::error!("Output task failed: {}", e);
    }
}

/// Extract every entry that was not restored from the cache, one blocking
/// task per entry.
async fn prefetch(library: &MediaLibrary) {
    let pending: Vec<_> = library
        .entries
        .iter()
        .filter(|e| !e.is_initialized())
        .map(|e| e.spawn_prefetch())
        .collect();
    let total = pending.len();

    let mut failed = 0usize;
    for handle in pending {
        match handle.await {
            Ok(true) => {}
            Ok(false) => failed += 1,
            Err(e) => {
                tracing::error!("Extraction task failed: {}", e);
                failed += 1;
            }
        }
    }
    tracing::info!("Read metadata for {} files ({} failed)", total - failed, failed);
}

fn print_library(library: &MediaLibrary) {
    for entry in &library.entries {
        println!("{}", entry.display_title());
        println!("  Path: {}", entry.identity().path.display());
        for (key, value) in entry.properties().iter() {
            println!("  {key}: {value}");
        }
        if let Some(bookmark) = entry.bookmark() {
            println!("  Bookmark: {bookmark}");
        }
        let subtitle = entry.subtitle();
        match subtitle.size() {
            Some(size) => println!("  Subtitle: {size} bytes"),
            None => println!("  Subtitle: none"),
        }
    }
}
