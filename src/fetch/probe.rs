//! Metadata-only pre-flight probe.
//!
//! One cheap yt-dlp call before the download commits: catches live streams
//! and dead links without paying for a full transfer, and supplies the
//! title and uploader that end up in the attachment caption.

use tokio::process::Command;
use url::Url;

use super::error::{classify_ytdlp_stderr, FetchError};
use crate::core::config::Config;
use crate::core::process::{run_with_timeout, stderr_excerpt, PROBE_TIMEOUT};

/// What the probe learned before any download happened.
#[derive(Debug, Clone)]
pub struct ProbeInfo {
    /// Media title; empty when the extractor has none
    pub title: String,
    /// Channel/account name; empty when the extractor has none
    pub uploader: String,
    /// Ongoing live broadcast
    pub is_live: bool,
}

/// One `--print` template per line of output, parsed back in this order.
const PROBE_FIELDS: [&str; 4] = ["%(title)s", "%(uploader)s", "%(is_live)s", "%(url)s"];

/// Probes the URL without downloading.
///
/// `%(url)s` resolves to the direct media URL of the selected format; when
/// yt-dlp cannot resolve one, nothing is downloadable and the probe
/// short-circuits with [`FetchError::ContentUnavailable`].
pub async fn probe_url(config: &Config, url: &Url) -> Result<ProbeInfo, FetchError> {
    log::debug!("Probing {}", url);

    let mut cmd = Command::new(&config.ytdlp_bin);
    cmd.arg("--skip-download").arg("--no-playlist").arg("--no-warnings");
    for field in PROBE_FIELDS {
        cmd.arg("--print").arg(field);
    }
    cmd.arg(url.as_str());

    let output = run_with_timeout(&mut cmd, PROBE_TIMEOUT).await.map_err(|e| FetchError::Failed {
        detail: format!("probe: {}", e),
    })?;

    if !output.status.success() {
        log::error!("yt-dlp probe failed for {}: {}", url, stderr_excerpt(&output.stderr, 500));
        return Err(classify_ytdlp_stderr(&String::from_utf8_lossy(&output.stderr)));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// yt-dlp prints "NA" for fields it cannot resolve.
fn field_or_empty(line: Option<&str>) -> String {
    match line.map(str::trim) {
        None | Some("") | Some("NA") => String::new(),
        Some(value) => value.to_string(),
    }
}

fn parse_probe_output(stdout: &str) -> Result<ProbeInfo, FetchError> {
    let mut lines = stdout.lines();

    let title = field_or_empty(lines.next());
    let uploader = field_or_empty(lines.next());
    let is_live_raw = lines.next().map(|l| l.trim().to_lowercase()).unwrap_or_default();
    let media_url = field_or_empty(lines.next());

    if media_url.is_empty() {
        return Err(FetchError::ContentUnavailable {
            detail: "probe resolved no media stream".to_string(),
        });
    }

    Ok(ProbeInfo {
        title,
        uploader,
        is_live: is_live_raw == "true" || is_live_raw == "1",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_output() {
        let stdout = "Sample Track\nArtist X\nFalse\nhttps://cdn.example.com/stream.m3u8\n";
        let info = parse_probe_output(stdout).unwrap();
        assert_eq!(info.title, "Sample Track");
        assert_eq!(info.uploader, "Artist X");
        assert!(!info.is_live);
    }

    #[test]
    fn test_parse_na_fields_become_empty() {
        let stdout = "NA\nNA\nNA\nhttps://cdn.example.com/file.mp4\n";
        let info = parse_probe_output(stdout).unwrap();
        assert_eq!(info.title, "");
        assert_eq!(info.uploader, "");
        assert!(!info.is_live);
    }

    #[test]
    fn test_parse_live_flag_variants() {
        let live = parse_probe_output("T\nU\nTrue\nhttps://e.com/s\n").unwrap();
        assert!(live.is_live);

        let live_numeric = parse_probe_output("T\nU\n1\nhttps://e.com/s\n").unwrap();
        assert!(live_numeric.is_live);

        let vod = parse_probe_output("T\nU\nNA\nhttps://e.com/s\n").unwrap();
        assert!(!vod.is_live);
    }

    #[test]
    fn test_parse_missing_media_url_is_unavailable() {
        let err = parse_probe_output("Title\nUploader\nFalse\nNA\n").unwrap_err();
        assert!(matches!(err, FetchError::ContentUnavailable { .. }));
        assert!(err.is_terminal());
    }

    #[test]
    fn test_parse_truncated_output_is_unavailable() {
        let err = parse_probe_output("Title only\n").unwrap_err();
        assert!(matches!(err, FetchError::ContentUnavailable { .. }));
    }

    #[test]
    fn test_parse_handles_crlf() {
        let info = parse_probe_output("Title\r\nUploader\r\nFalse\r\nhttps://e.com/s\r\n").unwrap();
        assert_eq!(info.title, "Title");
        assert_eq!(info.uploader, "Uploader");
    }
}
