use std::path::PathBuf;
use vidmeta::cli::Args;
use vidmeta::config::{Config, FileConfig};

fn make_args(cache_dir: Option<PathBuf>, ffmpeg: Option<PathBuf>, paths: Vec<PathBuf>) -> Args {
    Args {
        paths,
        config: None,
        cache_dir,
        ffmpeg,
        no_subtitles: false,
        no_prefetch: false,
    }
}

#[test]
fn defaults_when_nothing_set() {
    let args = make_args(None, None, vec![PathBuf::from("/tmp")]);
    let config = Config::resolve(None, &args);
    assert_eq!(config.ffmpeg, PathBuf::from("ffmpeg"));
    assert!(config.subtitles);
    assert!(config.prefetch);
    assert!(
        config.cache_dir.ends_with("vidmeta") || config.cache_dir.ends_with(".vidmeta-cache"),
        "unexpected default cache dir: {}",
        config.cache_dir.display()
    );
}

#[test]
fn cli_flag_overrides_default() {
    let args = make_args(Some(PathBuf::from("/var/cache/vm")), None, vec![]);
    let config = Config::resolve(None, &args);
    assert_eq!(config.cache_dir, PathBuf::from("/var/cache/vm"));
}

#[test]
fn toml_overrides_default() {
    let file = FileConfig {
        ffmpeg: Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg")),
        subtitles: Some(false),
        ..Default::default()
    };
    let args = make_args(None, None, vec![PathBuf::from("/tmp")]);
    let config = Config::resolve(Some(file), &args);
    assert_eq!(config.ffmpeg, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
    assert!(!config.subtitles);
    assert!(config.prefetch);
}

#[test]
fn cli_overrides_toml() {
    let file = FileConfig {
        cache_dir: Some(PathBuf::from("/from/file")),
        ..Default::default()
    };
    let args = make_args(Some(PathBuf::from("/from/cli")), None, vec![]);
    let config = Config::resolve(Some(file), &args);
    assert_eq!(config.cache_dir, PathBuf::from("/from/cli")); // CLI wins
}

#[test]
fn cli_switch_disables_what_toml_enables() {
    let file = FileConfig {
        subtitles: Some(true),
        prefetch: Some(true),
        ..Default::default()
    };
    let mut args = make_args(None, None, vec![]);
    args.no_subtitles = true;
    args.no_prefetch = true;
    let config = Config::resolve(Some(file), &args);
    assert!(!config.subtitles);
    assert!(!config.prefetch);
}

#[test]
fn toml_parse() {
    let toml_str = "cache_dir = \"/srv/cache\"\nsubtitles = false\nprefetch = true\n";
    let parsed: FileConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(parsed.cache_dir, Some(PathBuf::from("/srv/cache")));
    assert_eq!(parsed.subtitles, Some(false));
    assert_eq!(parsed.prefetch, Some(true));
    assert_eq!(parsed.ffmpeg, None);
}

#[test]
fn toml_unknown_fields_ignored() {
    // Future keys must not break parsing
    let toml_str = "prefetch = false\nunknown_future_key = true\n";
    let parsed: Result<FileConfig, _> = toml::from_str(toml_str);
    assert!(parsed.is_ok());
}

#[test]
fn load_config_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vidmeta.toml");
    std::fs::write(&path, "prefetch = \"maybe\"\n").unwrap();
    assert!(vidmeta::config::load_config(&path).is_err());
}

#[test]
fn explicit_config_path_is_used() {
    let path = PathBuf::from("/nonexistent/custom.toml");
    assert_eq!(
        vidmeta::config::find_config_file(Some(path.as_path())),
        Some(path.clone())
    );
}
