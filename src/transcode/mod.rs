//! Re-encoding into chat-compatible targets via a supervised ffmpeg run.
//!
//! Every fetched file passes through this stage regardless of its source
//! format: H.264/AAC MP4 for video, MP3 for audio. Uniform output keeps
//! playback working across clients and gives one place to enforce the
//! encode timeout.

pub mod audio;
pub mod video;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;

use crate::core::config::Config;
use crate::core::process::{run_with_timeout, stderr_excerpt, ProcessError, FFMPEG_TIMEOUT, PROBE_TIMEOUT};
use crate::core::validation::MIN_VALID_FILE_SIZE;
use crate::core::workspace::Workspace;
use crate::fetch::MediaType;

/// Transcode failure modes.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// ffmpeg exceeded the wall-clock ceiling and was killed
    #[error("ffmpeg timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Non-zero exit, or a zero exit without a usable output file
    #[error("ffmpeg failed: {detail}")]
    Failed { detail: String },
}

/// Encoding target for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetProfile {
    /// H.264/AAC MP4, `fast` preset, faststart
    Mp4Video,
    /// MP3 at a fixed 192 kbps
    Mp3Audio,
}

impl TargetProfile {
    pub fn for_media(media: MediaType) -> Self {
        match media {
            MediaType::Audio => TargetProfile::Mp3Audio,
            MediaType::Video => TargetProfile::Mp4Video,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TargetProfile::Mp4Video => "mp4",
            TargetProfile::Mp3Audio => "mp3",
        }
    }
}

/// One planned ffmpeg invocation with named fields.
#[derive(Debug, Clone)]
pub struct TranscodeSpec {
    /// Source file, as fetched
    pub input: PathBuf,
    /// Target file inside the request workspace
    pub output: PathBuf,
    /// Encoding target
    pub profile: TargetProfile,
}

impl TranscodeSpec {
    /// Plans the transcode for a fetched file, writing the output next to
    /// it in the same workspace.
    pub fn for_media(media: MediaType, input: &Path, workspace: &Workspace) -> Self {
        let profile = TargetProfile::for_media(media);
        TranscodeSpec {
            input: input.to_path_buf(),
            output: workspace.file(&format!("output.{}", profile.extension())),
            profile,
        }
    }

    /// Full ffmpeg argv for this spec.
    pub fn to_args(&self) -> Vec<OsString> {
        match self.profile {
            TargetProfile::Mp4Video => video::args(&self.input, &self.output),
            TargetProfile::Mp3Audio => audio::args(&self.input, &self.output),
        }
    }
}

/// Runs ffmpeg for a planned [`TranscodeSpec`] and hands back the output path.
///
/// A zero exit status is not trusted on its own: ffmpeg can exit cleanly
/// after writing nothing, so the output must exist and be non-trivially
/// sized before the stage counts as done.
pub async fn transcode(config: &Config, spec: &TranscodeSpec) -> Result<PathBuf, TranscodeError> {
    log::info!(
        "Transcoding {} -> {} ({:?})",
        spec.input.display(),
        spec.output.display(),
        spec.profile
    );

    let mut cmd = Command::new(&config.ffmpeg_bin);
    cmd.args(spec.to_args());

    let output = match run_with_timeout(&mut cmd, FFMPEG_TIMEOUT).await {
        Ok(output) => output,
        Err(ProcessError::Timeout { timeout }) => {
            return Err(TranscodeError::Timeout {
                secs: timeout.as_secs(),
            });
        }
        Err(ProcessError::Io(e)) => {
            return Err(TranscodeError::Failed {
                detail: format!("failed to run ffmpeg: {}", e),
            });
        }
    };

    if !output.status.success() {
        let excerpt = stderr_excerpt(&output.stderr, 500);
        log::error!("ffmpeg exited with {}: {}", output.status, excerpt);
        return Err(TranscodeError::Failed { detail: excerpt });
    }

    let size = std::fs::metadata(&spec.output).map(|m| m.len()).unwrap_or(0);
    if size < MIN_VALID_FILE_SIZE {
        return Err(TranscodeError::Failed {
            detail: format!("ffmpeg exited 0 but wrote {} bytes", size),
        });
    }

    log::info!("Transcoded {} ({} bytes)", spec.output.display(), size);
    Ok(spec.output.clone())
}

// ffprobe output, reduced to the fields the uploader cares about.

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Playback metadata attached to the outgoing file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaInfo {
    pub duration_secs: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Probes the transcoded artifact with ffprobe.
///
/// Best-effort: a failed probe only costs the attachment its duration and
/// dimension hints, so every failure path degrades to the default.
pub async fn probe_media(config: &Config, path: &Path) -> MediaInfo {
    let mut cmd = Command::new(&config.ffprobe_bin);
    cmd.args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path);

    let output = match run_with_timeout(&mut cmd, PROBE_TIMEOUT).await {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            log::warn!("ffprobe exited with {} for {}", output.status, path.display());
            return MediaInfo::default();
        }
        Err(e) => {
            log::warn!("ffprobe failed for {}: {}", path.display(), e);
            return MediaInfo::default();
        }
    };

    match serde_json::from_slice::<FfprobeOutput>(&output.stdout) {
        Ok(parsed) => media_info_from(parsed),
        Err(e) => {
            log::warn!("Unparseable ffprobe output for {}: {}", path.display(), e);
            MediaInfo::default()
        }
    }
}

fn media_info_from(parsed: FfprobeOutput) -> MediaInfo {
    // ffprobe prints duration as a decimal string inside "format"
    let duration_secs = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .map(|d| d.round() as u32);

    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    MediaInfo {
        duration_secs,
        width: video_stream.and_then(|s| s.width),
        height: video_stream.and_then(|s| s.height),
    }
}

/// First line of `ffmpeg -version`, for startup diagnostics and `check`.
pub async fn ffmpeg_version(bin: &str) -> Option<String> {
    let output = Command::new(bin).arg("-version").output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_profile_for_media() {
        assert_eq!(TargetProfile::for_media(MediaType::Audio), TargetProfile::Mp3Audio);
        assert_eq!(TargetProfile::for_media(MediaType::Video), TargetProfile::Mp4Video);
    }

    #[test]
    fn test_spec_places_output_in_workspace() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::create(root.path(), "t").unwrap();

        let spec = TranscodeSpec::for_media(MediaType::Audio, &ws.file("media.webm"), &ws);
        assert_eq!(spec.output, ws.file("output.mp3"));
        assert_eq!(spec.profile, TargetProfile::Mp3Audio);

        let spec = TranscodeSpec::for_media(MediaType::Video, &ws.file("media.webm"), &ws);
        assert_eq!(spec.output, ws.file("output.mp4"));
    }

    #[test]
    fn test_spec_args_route_by_profile() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::create(root.path(), "t").unwrap();

        let audio = TranscodeSpec::for_media(MediaType::Audio, &ws.file("in"), &ws);
        assert!(audio.to_args().contains(&std::ffi::OsString::from("libmp3lame")));

        let video = TranscodeSpec::for_media(MediaType::Video, &ws.file("in"), &ws);
        assert!(video.to_args().contains(&std::ffi::OsString::from("libx264")));
    }

    // ==================== ffprobe Parsing Tests ====================

    #[test]
    fn test_media_info_from_full_probe() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "width": 1280, "height": 720},
                {"codec_type": "audio"}
            ],
            "format": {"duration": "212.481000"}
        }"#;
        let parsed: FfprobeOutput = serde_json::from_str(json).unwrap();
        let info = media_info_from(parsed);

        assert_eq!(info.duration_secs, Some(212));
        assert_eq!(info.width, Some(1280));
        assert_eq!(info.height, Some(720));
    }

    #[test]
    fn test_media_info_audio_only() {
        let json = r#"{
            "streams": [{"codec_type": "audio"}],
            "format": {"duration": "95.7"}
        }"#;
        let parsed: FfprobeOutput = serde_json::from_str(json).unwrap();
        let info = media_info_from(parsed);

        assert_eq!(info.duration_secs, Some(96));
        assert_eq!(info.width, None);
        assert_eq!(info.height, None);
    }

    #[test]
    fn test_media_info_missing_fields_default() {
        let parsed: FfprobeOutput = serde_json::from_str("{}").unwrap();
        assert_eq!(media_info_from(parsed), MediaInfo::default());
    }

    #[test]
    fn test_media_info_garbage_duration_ignored() {
        let json = r#"{"streams": [], "format": {"duration": "N/A"}}"#;
        let parsed: FfprobeOutput = serde_json::from_str(json).unwrap();
        assert_eq!(media_info_from(parsed).duration_secs, None);
    }
}
