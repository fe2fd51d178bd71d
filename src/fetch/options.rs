//! Typed yt-dlp invocation options.
//!
//! One [`FetchOptions`] value describes one download run with named fields;
//! the argv is assembled in a single place instead of being merged together
//! from loose string lists at the call sites.

use std::path::Path;

use url::Url;

/// Videos are capped at 720p; taller sources get the best stream under the
/// cap. Keeps downloads and re-encodes bounded.
pub const MAX_VIDEO_HEIGHT: u32 = 720;

/// yt-dlp-internal retry count for flaky fragments and HTTP errors.
const YTDLP_RETRIES: u32 = 10;

/// Parallel fragment downloads for segmented streams.
const CONCURRENT_FRAGMENTS: u32 = 4;

/// Mobile Safari; TikTok serves watermark-free streams to phone clients.
const TIKTOK_USER_AGENT: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

/// The Instagram app identification; the web UA gets login walls.
const INSTAGRAM_USER_AGENT: &str =
    "Instagram 273.0.0.16.70 (iPad13,8; iOS 16_3; en_US; en-US; scale=2.00; 2048x2732; 452417278) AppleWebKit/420+";

/// Desktop Chrome for Twitter/X media endpoints.
const TWITTER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// What the user asked for: `/mp3` or `/mp4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Audio,
    Video,
}

impl MediaType {
    /// Short tag used in status texts and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Audio => "mp3",
            MediaType::Video => "mp4",
        }
    }
}

/// Source platforms that need special handling.
///
/// Detection is by URL host. Everything unrecognized goes through the
/// default yt-dlp path, which handles hundreds of sites on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    TikTok,
    Instagram,
    Twitter,
    Other,
}

impl Platform {
    pub fn from_url(url: &Url) -> Self {
        let Some(host) = url.host_str().map(str::to_lowercase) else {
            return Platform::Other;
        };

        if host.contains("youtube.com") || host.contains("youtu.be") {
            Platform::YouTube
        } else if host.contains("tiktok.com") {
            Platform::TikTok
        } else if host.contains("instagram.com") {
            Platform::Instagram
        } else if host.contains("twitter.com") || host == "x.com" || host.ends_with(".x.com") {
            Platform::Twitter
        } else {
            Platform::Other
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::TikTok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Twitter => "Twitter/X",
            Platform::Other => "unknown source",
        }
    }

    /// Format selector override, where the default one breaks.
    ///
    /// TikTok and Instagram serve single muxed files and have no separate
    /// audio-only streams; Twitter's HLS manifests confuse the default
    /// selector, so it is pinned to progressive MP4.
    fn format_override(&self, media: MediaType) -> Option<String> {
        match (self, media) {
            (Platform::TikTok | Platform::Instagram, _) => Some("best".to_string()),
            (Platform::Twitter, MediaType::Video) => Some("best[ext=mp4]/best".to_string()),
            (Platform::Twitter, MediaType::Audio) => Some("best".to_string()),
            _ => None,
        }
    }

    /// Spoofed client identification for hosts that reject yt-dlp's default.
    fn user_agent(&self) -> Option<&'static str> {
        match self {
            Platform::TikTok => Some(TIKTOK_USER_AGENT),
            Platform::Instagram => Some(INSTAGRAM_USER_AGENT),
            Platform::Twitter => Some(TWITTER_USER_AGENT),
            Platform::YouTube | Platform::Other => None,
        }
    }
}

/// Default selector for platforms without an override.
fn default_format(media: MediaType) -> String {
    match media {
        // Audio-only stream where one exists; the MP3 encode strips video
        // from muxed fallbacks anyway.
        MediaType::Audio => "bestaudio/best".to_string(),
        MediaType::Video => format!(
            "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
            h = MAX_VIDEO_HEIGHT
        ),
    }
}

/// Options for one yt-dlp download run.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// `-f` format selector
    pub format: String,
    /// `-o` output template, pointing into the request workspace
    pub output_template: String,
    /// Never expand playlists; one URL, one file
    pub no_playlist: bool,
    /// ASCII-safe output names
    pub restrict_filenames: bool,
    /// Container for merging separate video+audio streams
    pub merge_container: Option<&'static str>,
    /// Spoofed client identification, where the platform needs one
    pub user_agent: Option<&'static str>,
    /// yt-dlp-internal retry count
    pub retries: u32,
    /// Parallel fragment downloads
    pub concurrent_fragments: u32,
}

impl FetchOptions {
    /// Builds the options for a request: platform override first, default
    /// selector otherwise. The output template fixes the file stem to
    /// `media` inside the workspace; yt-dlp picks the extension.
    pub fn for_request(media: MediaType, platform: Platform, workspace_dir: &Path) -> Self {
        let format = platform.format_override(media).unwrap_or_else(|| default_format(media));

        FetchOptions {
            format,
            output_template: workspace_dir.join("media.%(ext)s").display().to_string(),
            no_playlist: true,
            restrict_filenames: true,
            merge_container: match media {
                MediaType::Video => Some("mp4"),
                MediaType::Audio => None,
            },
            user_agent: platform.user_agent(),
            retries: YTDLP_RETRIES,
            concurrent_fragments: CONCURRENT_FRAGMENTS,
        }
    }

    /// Assembles the full argv for the download run. The URL goes last.
    pub fn to_args(&self, url: &Url) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-o".to_string(),
            self.output_template.clone(),
            "--format".to_string(),
            self.format.clone(),
            "--no-warnings".to_string(),
        ];

        if self.no_playlist {
            args.push("--no-playlist".to_string());
        }
        if self.restrict_filenames {
            args.push("--restrict-filenames".to_string());
        }
        if let Some(container) = self.merge_container {
            args.push("--merge-output-format".to_string());
            args.push(container.to_string());
        }
        if let Some(ua) = self.user_agent {
            args.push("--user-agent".to_string());
            args.push(ua.to_string());
        }

        args.push("--retries".to_string());
        args.push(self.retries.to_string());
        args.push("--concurrent-fragments".to_string());
        args.push(self.concurrent_fragments.to_string());

        args.push(url.as_str().to_string());
        args
    }
}
