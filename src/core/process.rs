//! Process execution utilities with timeout support
//!
//! Helpers for running external processes (ffmpeg, ffprobe, yt-dlp) with
//! enforced wall-clock timeouts so a hung subprocess cannot wedge a request.

use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Wall-clock ceiling for ffmpeg re-encodes (2 minutes)
pub const FFMPEG_TIMEOUT: Duration = Duration::from_secs(120);

/// Wall-clock ceiling for ffprobe / yt-dlp metadata queries (30 seconds)
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Wall-clock ceiling for full yt-dlp downloads (4 minutes, slow mirrors included)
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(240);

/// Failure modes of a supervised subprocess run.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The deadline elapsed; the child has been killed
    #[error("process timed out after {}s", timeout.as_secs())]
    Timeout { timeout: Duration },

    /// Spawning or collecting the process failed
    #[error("failed to run process: {0}")]
    Io(#[from] std::io::Error),
}

/// Run an async Command with a timeout.
///
/// The child is spawned with kill-on-drop, so when the deadline elapses the
/// process is reaped rather than left running detached.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, ProcessError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ProcessError::Io(e)),
        Err(_) => Err(ProcessError::Timeout { timeout }),
    }
}

/// Truncate subprocess stderr for the log. Keeps the tail, where ffmpeg and
/// yt-dlp put the actual error line.
pub fn stderr_excerpt(stderr: &[u8], max_len: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.len() <= max_len {
        return trimmed.to_string();
    }
    let tail_start = trimmed
        .char_indices()
        .rev()
        .take(max_len)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(0);
    format!("...{}", &trimmed[tail_start..])
}
