//! In-place status messages for long-running requests.
//!
//! One message per request: sent on the first update, edited for every
//! following one, deleted (or turned into the failure text) at the end.
//! Keeps the chat to a single line of progress instead of a scrollback of
//! stage announcements.

use teloxide::prelude::*;
use teloxide::types::MessageId;
use teloxide::{ApiError, RequestError};

use super::Bot;
use crate::fetch::MediaType;

/// Pipeline stage being reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Downloading,
    Converting,
    Uploading,
}

impl Stage {
    /// Status line for the stage.
    pub fn text(&self, media: MediaType) -> String {
        match self {
            Stage::Downloading => format!("⬇️ Downloading {}...", media.label()),
            Stage::Converting => format!("⚙️ Converting to {}...", media.label()),
            Stage::Uploading => "📤 Uploading...".to_string(),
        }
    }
}

/// The per-request status message.
#[derive(Debug)]
pub struct StatusMessage {
    chat_id: ChatId,
    message_id: Option<MessageId>,
}

impl StatusMessage {
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            message_id: None,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Shows a pipeline stage.
    pub async fn set_stage(&mut self, bot: &Bot, stage: Stage, media: MediaType) -> Result<(), RequestError> {
        self.set_text(bot, &stage.text(media)).await
    }

    /// Shows arbitrary status text.
    ///
    /// Edits the existing message where one exists; "message is not
    /// modified" counts as success (retries re-enter stages with the same
    /// text). Any other edit failure falls back to sending a new message.
    pub async fn set_text(&mut self, bot: &Bot, text: &str) -> Result<(), RequestError> {
        if let Some(message_id) = self.message_id {
            match bot.edit_message_text(self.chat_id, message_id, text).await {
                Ok(_) => return Ok(()),
                Err(RequestError::Api(ApiError::MessageNotModified)) => return Ok(()),
                Err(e) => {
                    log::warn!("Failed to edit status message: {}. Sending a new one.", e);
                }
            }
        }

        let msg = bot.send_message(self.chat_id, text).await?;
        self.message_id = Some(msg.id);
        Ok(())
    }

    /// Deletes the status message; on success the attachment replaces it.
    /// Best-effort: a failed delete only leaves a stale line in the chat.
    pub async fn delete(&mut self, bot: &Bot) {
        if let Some(message_id) = self.message_id.take() {
            if let Err(e) = bot.delete_message(self.chat_id, message_id).await {
                log::warn!("Failed to delete status message in chat {}: {}", self.chat_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stage_texts_mention_the_target() {
        assert_eq!(Stage::Downloading.text(MediaType::Audio), "⬇️ Downloading mp3...");
        assert_eq!(Stage::Downloading.text(MediaType::Video), "⬇️ Downloading mp4...");
        assert_eq!(Stage::Converting.text(MediaType::Audio), "⚙️ Converting to mp3...");
        assert_eq!(Stage::Uploading.text(MediaType::Video), "📤 Uploading...");
    }

    #[test]
    fn test_new_status_message_has_no_message_yet() {
        let status = StatusMessage::new(ChatId(42));
        assert_eq!(status.chat_id(), ChatId(42));
        assert!(status.message_id.is_none());
    }
}
