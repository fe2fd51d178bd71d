//! Media fetching via a supervised yt-dlp subprocess.
//!
//! The flow is probe → download → resolve: a metadata probe first (live
//! streams and dead links are rejected before any transfer), then the full
//! download into the request workspace, then a directory scan to find the
//! file yt-dlp actually wrote, since the extension is the platform's choice.

pub mod error;
pub mod options;
pub mod probe;

pub use error::FetchError;
pub use options::{FetchOptions, MediaType, Platform};
pub use probe::ProbeInfo;

use std::path::PathBuf;

use tokio::process::Command;
use url::Url;

use crate::core::config::Config;
use crate::core::process::{run_with_timeout, stderr_excerpt, ProcessError, DOWNLOAD_TIMEOUT};
use crate::core::workspace::Workspace;
use error::classify_ytdlp_stderr;

/// A fetched media file plus the metadata the uploader wants.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Resolved path of the downloaded file inside the workspace
    pub path: PathBuf,
    /// Media title from the probe; may be empty
    pub title: String,
    /// Uploader/channel name from the probe; may be empty
    pub uploader: String,
}

/// Fetches the media behind `url` into the workspace.
///
/// Live streams and unresolvable content are rejected by the probe before
/// the download starts. The download itself runs under a wall-clock
/// ceiling; on failure the stderr is classified into a typed
/// [`FetchError`] and the raw excerpt goes to the log only.
pub async fn fetch(
    config: &Config,
    workspace: &Workspace,
    url: &Url,
    media: MediaType,
) -> Result<FetchResult, FetchError> {
    let info = probe::probe_url(config, url).await?;
    if info.is_live {
        log::warn!("🔴 Rejecting live stream: {}", url);
        return Err(FetchError::LiveStream);
    }

    let platform = Platform::from_url(url);
    let opts = FetchOptions::for_request(media, platform, workspace.path());
    log::info!(
        "Downloading {} from {} ({}, selector: {})",
        url,
        platform.display_name(),
        media.label(),
        opts.format
    );

    let mut cmd = Command::new(&config.ytdlp_bin);
    cmd.args(opts.to_args(url));

    let output = match run_with_timeout(&mut cmd, DOWNLOAD_TIMEOUT).await {
        Ok(output) => output,
        Err(ProcessError::Timeout { timeout }) => {
            return Err(FetchError::Failed {
                detail: format!("yt-dlp timed out after {}s", timeout.as_secs()),
            });
        }
        Err(ProcessError::Io(e)) => {
            return Err(FetchError::Failed {
                detail: format!("failed to run yt-dlp: {}", e),
            });
        }
    };

    if !output.status.success() {
        log::error!(
            "yt-dlp exited with {} for {}: {}",
            output.status,
            url,
            stderr_excerpt(&output.stderr, 500)
        );
        return Err(classify_ytdlp_stderr(&String::from_utf8_lossy(&output.stderr)));
    }

    let path = resolve_output(workspace)?;
    log::info!("Fetched {} -> {}", url, path.display());

    Ok(FetchResult {
        path,
        title: info.title,
        uploader: info.uploader,
    })
}

/// Finds the file yt-dlp actually wrote.
///
/// The template pins the stem to `media` but the extension is whatever the
/// platform served. In-progress artifacts (`.part`, `.ytdl`) are skipped;
/// if several candidates remain the largest one is the merged result.
fn resolve_output(workspace: &Workspace) -> Result<PathBuf, FetchError> {
    let entries = std::fs::read_dir(workspace.path()).map_err(|e| FetchError::Failed {
        detail: format!("cannot scan workspace: {}", e),
    })?;

    let mut best: Option<(u64, PathBuf)> = None;

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with("media.") || name.ends_with(".part") || name.ends_with(".ytdl") {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        let larger = match &best {
            Some((best_size, _)) => size > *best_size,
            None => true,
        };
        if larger {
            best = Some((size, path));
        }
    }

    best.map(|(_, path)| path).ok_or_else(|| FetchError::Failed {
        detail: "download finished without producing a file".to_string(),
    })
}

/// `yt-dlp --version`, for startup diagnostics and the `check` subcommand.
pub async fn ytdlp_version(bin: &str) -> Option<String> {
    let output = Command::new(bin).arg("--version").output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!version.is_empty()).then_some(version)
}
