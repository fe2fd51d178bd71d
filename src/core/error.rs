use thiserror::Error;

use crate::core::validation::ValidationError;
use crate::fetch::FetchError;
use crate::transcode::TranscodeError;

/// Centralized error type for the request pipeline.
///
/// Every stage reports failure by converting into this enum; the retry
/// layer is the only place that decides what happens next, based on
/// [`AppError::is_terminal`]. Callers never inspect message strings.
#[derive(Error, Debug)]
pub enum AppError {
    /// The command was issued without a URL argument
    #[error("missing URL argument")]
    MissingArgument,

    /// yt-dlp probe or download failure
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Downloaded artifact failed the integrity check
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// ffmpeg re-encode failure
    #[error("transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    /// Telegram API failure while sending the attachment
    #[error("upload error: {0}")]
    Upload(#[from] teloxide::RequestError),

    /// Filesystem errors (workspace creation, file moves)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// True for error classes that no amount of retrying will fix.
    ///
    /// Everything else (network hiccups, hung ffmpeg, flaky upstream) is
    /// worth another attempt.
    pub fn is_terminal(&self) -> bool {
        match self {
            AppError::MissingArgument => true,
            AppError::Fetch(e) => e.is_terminal(),
            AppError::Validation(_) => false,
            AppError::Transcode(_) => false,
            AppError::Upload(_) => false,
            AppError::Io(_) => false,
        }
    }

    /// Short human-readable cause for the chat reply.
    ///
    /// Deliberately generic: subprocess stderr and library internals go to
    /// the log, never to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::MissingArgument => "Send the command with a link, e.g. /mp3 <url>",
            AppError::Fetch(FetchError::DrmProtected) => "This content is DRM-protected and can't be downloaded",
            AppError::Fetch(FetchError::LiveStream) => "Live streams are not supported",
            AppError::Fetch(FetchError::ContentUnavailable { .. }) => {
                "This content is unavailable (private, removed or region-locked)"
            }
            AppError::Fetch(FetchError::Failed { .. }) => "Downloading from this link failed",
            AppError::Validation(_) => "The download came back empty or corrupted",
            AppError::Transcode(TranscodeError::Timeout { .. }) => "Converting the file took too long",
            AppError::Transcode(_) => "Converting the file failed",
            AppError::Upload(_) => "Sending the file to Telegram failed",
            AppError::Io(_) => "A server-side file error occurred",
        }
    }
}
