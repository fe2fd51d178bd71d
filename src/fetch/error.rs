//! Fetch error taxonomy and yt-dlp stderr classification.
//!
//! All knowledge about what yt-dlp prints on failure lives here. The rest
//! of the pipeline only ever sees the typed [`FetchError`] kinds.

use thiserror::Error;

/// Failure modes of the fetch stage.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source is DRM-protected; no tool will ever download it
    #[error("content is DRM protected")]
    DrmProtected,

    /// The URL points at an ongoing live stream
    #[error("live streams are not supported")]
    LiveStream,

    /// Private, removed, region-locked or otherwise gone
    #[error("content unavailable: {detail}")]
    ContentUnavailable { detail: String },

    /// Anything else: network trouble, extractor breakage, timeouts
    #[error("download failed: {detail}")]
    Failed { detail: String },
}

impl FetchError {
    /// Terminal errors describe the content itself, not the transfer; a
    /// retry cannot change them.
    pub fn is_terminal(&self) -> bool {
        match self {
            FetchError::DrmProtected => true,
            FetchError::LiveStream => true,
            FetchError::ContentUnavailable { .. } => true,
            FetchError::Failed { .. } => false,
        }
    }
}

/// Classifies yt-dlp stderr into a [`FetchError`].
///
/// Matching is lowercase substring search over the whole stderr, in
/// priority order: DRM first (its messages also mention availability),
/// then live streams, then the unavailable family. Anything unrecognized
/// is a retryable [`FetchError::Failed`].
pub fn classify_ytdlp_stderr(stderr: &str) -> FetchError {
    let stderr_lower = stderr.to_lowercase();

    if stderr_lower.contains("drm") {
        return FetchError::DrmProtected;
    }

    if stderr_lower.contains("live event")
        || stderr_lower.contains("is a livestream")
        || stderr_lower.contains("live stream")
        || stderr_lower.contains("premieres in")
    {
        return FetchError::LiveStream;
    }

    if stderr_lower.contains("private video")
        || stderr_lower.contains("video unavailable")
        || stderr_lower.contains("this video is not available")
        || stderr_lower.contains("video is private")
        || stderr_lower.contains("video has been removed")
        || stderr_lower.contains("this video does not exist")
        || stderr_lower.contains("video is not available")
        || stderr_lower.contains("account associated with this video has been terminated")
        || stderr_lower.contains("not available in your country")
        || stderr_lower.contains("geo restricted")
        || stderr_lower.contains("http error 404")
        || stderr_lower.contains("http error 410")
    {
        return FetchError::ContentUnavailable {
            detail: error_line(stderr),
        };
    }

    FetchError::Failed {
        detail: error_line(stderr),
    }
}

/// The most useful single line of a yt-dlp stderr dump: the last line
/// starting with "ERROR:", or failing that the last non-empty line.
fn error_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
        .unwrap_or_else(|| "no stderr output".to_string())
}
