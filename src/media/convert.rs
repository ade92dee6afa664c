use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::ConvertError;

/// Turns a subtitle candidate into SubRip text.
pub trait SubtitleConverter: Send + Sync {
    fn convert(&self, path: &Path) -> Result<String, ConvertError>;
}

/// Converts subtitles by running `ffmpeg` and capturing SubRip on stdout.
///
/// Works for sidecar files in any format ffmpeg reads and for the first
/// subtitle stream of a container.
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    binary: PathBuf,
}

impl FfmpegConverter {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegConverter {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl SubtitleConverter for FfmpegConverter {
    fn convert(&self, path: &Path) -> Result<String, ConvertError> {
        let output = Command::new(&self.binary)
            .args(["-nostdin", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(path)
            .args(["-map", "0:s:0", "-f", "srt", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ConvertError::NotSupported(format!(
                    "{} not found",
                    self.binary.display()
                )),
                _ => ConvertError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConvertError::Failed(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
