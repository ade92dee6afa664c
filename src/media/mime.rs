use std::path::Path;

/// MIME type reported for every resolved subtitle. Converters normalize to SubRip.
pub const SUBTITLE_MIME: &str = "text/srt";

/// Media kind classification for discovered files.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Subtitle,
}

/// Classify a file path by its extension into a (MediaKind, MIME type) pair.
///
/// Returns `None` for anything that is neither a video container nor a text
/// subtitle. Extensions are matched case-insensitively here; the subtitle
/// sidecar search in [`crate::media::subtitle`] is case-sensitive instead.
pub fn classify(path: &Path) -> Option<(MediaKind, &'static str)> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();

    let result = match ext.as_str() {
        "mp4" | "m4v" => (MediaKind::Video, "video/mp4"),
        "mkv" => (MediaKind::Video, "video/x-matroska"),
        "avi" => (MediaKind::Video, "video/x-msvideo"),
        "mov" => (MediaKind::Video, "video/quicktime"),
        "ts" | "m2ts" | "mts" => (MediaKind::Video, "video/MP2T"),
        "mpg" | "mpeg" => (MediaKind::Video, "video/mpeg"),
        "wmv" => (MediaKind::Video, "video/x-ms-wmv"),
        "flv" => (MediaKind::Video, "video/x-flv"),
        "ogv" => (MediaKind::Video, "video/ogg"),
        "webm" => (MediaKind::Video, "video/webm"),
        "3gp" => (MediaKind::Video, "video/3gpp"),

        "srt" => (MediaKind::Subtitle, "text/srt"),
        "vtt" => (MediaKind::Subtitle, "text/vtt"),
        "ass" | "ssa" => (MediaKind::Subtitle, "text/x-ssa"),
        "sub" => (MediaKind::Subtitle, "text/x-microdvd"),

        _ => return None,
    };

    Some(result)
}

/// True for containers the mp4 crate can read headers from directly.
pub fn is_mp4(mime: &str) -> bool {
    matches!(mime, "video/mp4" | "video/quicktime" | "video/3gpp")
}
