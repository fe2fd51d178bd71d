//! Process-wide configuration.
//!
//! Everything is read from the environment exactly once at startup into an
//! immutable [`Config`] that gets passed into the dispatcher's dependency
//! map. No global statics: components receive the config explicitly.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::core::retry::RetryConfig;

/// Startup configuration errors. All of these are fatal: the process should
/// log and exit rather than limp along without a credential.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither BOT_TOKEN nor TELOXIDE_TOKEN is set
    #[error("bot token is not set (BOT_TOKEN or TELOXIDE_TOKEN)")]
    MissingBotToken,

    /// BOT_API_URL is set but not a valid URL
    #[error("invalid BOT_API_URL: {0}")]
    InvalidBotApiUrl(url::ParseError),
}

/// Immutable process configuration, constructed once in `main`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token (BOT_TOKEN, falling back to TELOXIDE_TOKEN)
    pub bot_token: String,
    /// Optional local Bot API server URL (BOT_API_URL)
    pub bot_api_url: Option<Url>,
    /// yt-dlp binary (YTDL_BIN, default "yt-dlp")
    pub ytdlp_bin: String,
    /// ffmpeg binary (FFMPEG_BIN, default "ffmpeg")
    pub ffmpeg_bin: String,
    /// ffprobe binary (FFPROBE_BIN, default "ffprobe")
    pub ffprobe_bin: String,
    /// Root for per-request workspaces (TEMP_FILES_DIR, default system temp)
    pub temp_dir: PathBuf,
    /// Log file path (LOG_FILE_PATH, default "app.log")
    pub log_file: String,
    /// HTTP client timeout for Telegram calls (REQUEST_TIMEOUT_SECS).
    /// Default 900s: media uploads are large relative to chat messages.
    pub http_timeout: Duration,
    /// Cap on simultaneous ffmpeg processes (MAX_CONCURRENT_TRANSCODES, default 2)
    pub max_concurrent_transcodes: usize,
    /// Retry policy for the whole per-request pipeline
    /// (RETRY_MAX_ATTEMPTS, RETRY_DELAY_SECS, RETRY_DELAY_STEP_SECS)
    pub retry: RetryConfig,
}

impl Config {
    /// Read the configuration from the environment.
    ///
    /// A missing bot token is a startup error; every other setting has a
    /// documented default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = env::var("BOT_TOKEN")
            .or_else(|_| env::var("TELOXIDE_TOKEN"))
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingBotToken)?;

        let bot_api_url = match env::var("BOT_API_URL") {
            Ok(raw) if !raw.trim().is_empty() => Some(Url::parse(raw.trim()).map_err(ConfigError::InvalidBotApiUrl)?),
            _ => None,
        };

        let retry = RetryConfig::default()
            .max_attempts(env_parse("RETRY_MAX_ATTEMPTS", 3))
            .initial_delay(Duration::from_secs(env_parse("RETRY_DELAY_SECS", 2)))
            .delay_step(Duration::from_secs(env_parse("RETRY_DELAY_STEP_SECS", 2)));

        Ok(Self {
            bot_token,
            bot_api_url,
            ytdlp_bin: env_or("YTDL_BIN", "yt-dlp"),
            ffmpeg_bin: env_or("FFMPEG_BIN", "ffmpeg"),
            ffprobe_bin: env_or("FFPROBE_BIN", "ffprobe"),
            temp_dir: env::var("TEMP_FILES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
            log_file: env_or("LOG_FILE_PATH", "app.log"),
            http_timeout: Duration::from_secs(env_parse("REQUEST_TIMEOUT_SECS", 900)),
            max_concurrent_transcodes: env_parse("MAX_CONCURRENT_TRANSCODES", 2),
            retry,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // set_var/remove_var are unsafe in edition 2024; tests run serially so
    // no other thread observes the mutation mid-flight.
    fn set(key: &str, value: &str) {
        unsafe { env::set_var(key, value) }
    }

    fn unset(key: &str) {
        unsafe { env::remove_var(key) }
    }

    fn clear_all() {
        for key in [
            "BOT_TOKEN",
            "TELOXIDE_TOKEN",
            "BOT_API_URL",
            "YTDL_BIN",
            "FFMPEG_BIN",
            "FFPROBE_BIN",
            "TEMP_FILES_DIR",
            "LOG_FILE_PATH",
            "REQUEST_TIMEOUT_SECS",
            "MAX_CONCURRENT_TRANSCODES",
            "RETRY_MAX_ATTEMPTS",
            "RETRY_DELAY_SECS",
            "RETRY_DELAY_STEP_SECS",
        ] {
            unset(key);
        }
    }

    #[test]
    #[serial]
    fn test_missing_token_is_fatal() {
        clear_all();
        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::MissingBotToken)));
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_all();
        set("BOT_TOKEN", "123:abc");

        let config = Config::from_env().unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.ytdlp_bin, "yt-dlp");
        assert_eq!(config.ffmpeg_bin, "ffmpeg");
        assert_eq!(config.http_timeout, Duration::from_secs(900));
        assert_eq!(config.max_concurrent_transcodes, 2);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.bot_api_url.is_none());
    }

    #[test]
    #[serial]
    fn test_teloxide_token_fallback() {
        clear_all();
        set("TELOXIDE_TOKEN", "456:def");

        let config = Config::from_env().unwrap();
        assert_eq!(config.bot_token, "456:def");
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_all();
        set("BOT_TOKEN", "123:abc");
        set("YTDL_BIN", "/opt/yt-dlp");
        set("BOT_API_URL", "http://localhost:8081");
        set("RETRY_MAX_ATTEMPTS", "5");
        set("MAX_CONCURRENT_TRANSCODES", "4");

        let config = Config::from_env().unwrap();
        assert_eq!(config.ytdlp_bin, "/opt/yt-dlp");
        assert_eq!(config.bot_api_url.as_ref().map(|u| u.as_str()), Some("http://localhost:8081/"));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.max_concurrent_transcodes, 4);
    }

    #[test]
    #[serial]
    fn test_invalid_bot_api_url_rejected() {
        clear_all();
        set("BOT_TOKEN", "123:abc");
        set("BOT_API_URL", "not a url");

        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidBotApiUrl(_))));
        unset("BOT_API_URL");
    }
}
