//! Attachment uploads.
//!
//! Last stage of the pipeline: pushes the transcoded file into the chat
//! with the playback metadata Telegram wants, truncating text fields to
//! the platform limits so an absurd source title can never fail a request
//! that already did all the work.

use std::path::Path;

use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile};

use super::Bot;
use crate::core::utils::{escape_filename, format_media_caption, truncate_chars};
use crate::fetch::MediaType;
use crate::transcode::MediaInfo;

/// Telegram's caption ceiling for media messages.
pub const CAPTION_LIMIT: usize = 1024;

/// Telegram's limit for the audio title and performer fields.
pub const AUDIO_FIELD_LIMIT: usize = 64;

const UNKNOWN_TITLE: &str = "Unknown title";
const UNKNOWN_ARTIST: &str = "Unknown artist";

/// Everything the upload needs besides the file itself.
#[derive(Debug, Clone, Default)]
pub struct UploadMetadata {
    /// Title from the probe; may be empty
    pub title: String,
    /// Uploader/channel from the probe; may be empty
    pub uploader: String,
    /// Playback info probed from the transcoded artifact
    pub info: MediaInfo,
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { fallback } else { trimmed }
}

/// Caption for a video attachment, capped at [`CAPTION_LIMIT`].
fn video_caption(meta: &UploadMetadata) -> String {
    let title = non_empty_or(&meta.title, UNKNOWN_TITLE);
    truncate_chars(&format_media_caption(title, &meta.uploader), CAPTION_LIMIT)
}

/// Title and performer for an audio attachment, each capped at
/// [`AUDIO_FIELD_LIMIT`].
fn audio_fields(meta: &UploadMetadata) -> (String, String) {
    let title = truncate_chars(non_empty_or(&meta.title, UNKNOWN_TITLE), AUDIO_FIELD_LIMIT);
    let performer = truncate_chars(non_empty_or(&meta.uploader, UNKNOWN_ARTIST), AUDIO_FIELD_LIMIT);
    (title, performer)
}

/// File name the chat client saves the attachment under. Workspace
/// artifacts are named mechanically ("output.mp4"), so derive a name from
/// the title instead.
fn attachment_name(meta: &UploadMetadata, extension: &str) -> String {
    let title = truncate_chars(non_empty_or(&meta.title, UNKNOWN_TITLE), AUDIO_FIELD_LIMIT);
    format!("{}.{}", escape_filename(&title), extension)
}

/// Sends the transcoded file into the chat as the right attachment kind.
pub async fn send_media(
    bot: &Bot,
    chat_id: ChatId,
    media: MediaType,
    path: &Path,
    meta: &UploadMetadata,
) -> Result<(), RequestError> {
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    log::info!(
        "Uploading {} ({:.2} MB) to chat {}",
        path.display(),
        size as f64 / (1024.0 * 1024.0),
        chat_id
    );

    match media {
        MediaType::Video => send_video(bot, chat_id, path, meta).await,
        MediaType::Audio => send_audio(bot, chat_id, path, meta).await,
    }
}

async fn send_video(bot: &Bot, chat_id: ChatId, path: &Path, meta: &UploadMetadata) -> Result<(), RequestError> {
    // The chat action keeps an upload indicator visible while the transfer runs
    let _ = bot.send_chat_action(chat_id, ChatAction::UploadVideo).await;

    let input = InputFile::file(path.to_path_buf()).file_name(attachment_name(meta, "mp4"));
    let mut request = bot
        .send_video(chat_id, input)
        .caption(video_caption(meta))
        .supports_streaming(true);

    if let Some(duration) = meta.info.duration_secs {
        request = request.duration(duration);
    }
    if let Some(width) = meta.info.width {
        request = request.width(width);
    }
    if let Some(height) = meta.info.height {
        request = request.height(height);
    }

    request.await?;
    Ok(())
}

async fn send_audio(bot: &Bot, chat_id: ChatId, path: &Path, meta: &UploadMetadata) -> Result<(), RequestError> {
    let _ = bot.send_chat_action(chat_id, ChatAction::UploadDocument).await;

    let (title, performer) = audio_fields(meta);
    let input = InputFile::file(path.to_path_buf()).file_name(attachment_name(meta, "mp3"));
    let mut request = bot
        .send_audio(chat_id, input)
        .title(title)
        .performer(performer);

    if let Some(duration) = meta.info.duration_secs {
        request = request.duration(duration);
    }

    request.await?;
    Ok(())
}
