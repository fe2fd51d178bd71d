//! The request pipeline: fetch → validate → transcode → upload.
//!
//! One call to [`process_request`] owns a user request end to end. Each
//! retry attempt runs the full stage sequence in a fresh temporary
//! workspace, and the workspace is removed on every exit path of the
//! attempt; a retry never sees a previous attempt's files.

use std::sync::Arc;

use teloxide::prelude::*;
use tokio::sync::{Mutex, Semaphore};
use url::Url;

use crate::core::config::Config;
use crate::core::retry::retry_with_notification;
use crate::core::validation;
use crate::core::workspace::Workspace;
use crate::core::AppResult;
use crate::fetch::{self, MediaType};
use crate::telegram::upload::{self, UploadMetadata};
use crate::telegram::{Bot, Stage, StatusMessage};
use crate::transcode::{self, TranscodeSpec};

/// Shared dependencies, injected through the dispatcher's dependency map.
///
/// Everything here is immutable or internally synchronized; requests never
/// share mutable state with each other.
#[derive(Clone)]
pub struct RequestDeps {
    pub config: Arc<Config>,
    /// Bounds concurrent ffmpeg processes across all requests
    pub transcode_pool: Arc<Semaphore>,
}

impl RequestDeps {
    pub fn new(config: Arc<Config>) -> Self {
        let transcode_pool = Arc::new(Semaphore::new(config.max_concurrent_transcodes));
        RequestDeps {
            config,
            transcode_pool,
        }
    }
}

/// Runs one user request to completion, retries included.
///
/// Terminal errors stop after the first attempt; everything else is
/// retried under the configured policy. Whatever the outcome, the user
/// gets exactly one final signal: the attachment on success, or a single
/// generic failure text on the status message.
pub async fn process_request(bot: Bot, chat_id: ChatId, deps: RequestDeps, url: Url, media: MediaType) {
    let status = Arc::new(Mutex::new(StatusMessage::new(chat_id)));

    let outcome = retry_with_notification(&bot, chat_id, &deps.config.retry, "Download", || {
        let bot = bot.clone();
        let deps = deps.clone();
        let url = url.clone();
        let status = Arc::clone(&status);
        async move { run_attempt(&bot, chat_id, &deps, &url, media, &status).await }
    })
    .await;

    match outcome.result {
        Ok(()) => {
            log::info!(
                "✅ {} request for chat {} done in {:.1}s ({} attempt(s))",
                media.label(),
                chat_id,
                outcome.total_duration.as_secs_f64(),
                outcome.attempts
            );
            status.lock().await.delete(&bot).await;
        }
        Err(retry_err) => {
            let err = retry_err.last_error();
            log::error!(
                "❌ {} request for chat {} failed after {} attempt(s): {}",
                media.label(),
                chat_id,
                outcome.attempts,
                err
            );

            let text = format!("❌ {}", err.user_message());
            if let Err(e) = status.lock().await.set_text(&bot, &text).await {
                log::error!("Failed to report failure to chat {}: {}", chat_id, e);
            }
        }
    }
}

/// One full attempt in its own workspace. The workspace dies with the
/// attempt, success or failure; the `Drop` impl backstops panics.
async fn run_attempt(
    bot: &Bot,
    chat_id: ChatId,
    deps: &RequestDeps,
    url: &Url,
    media: MediaType,
    status: &Mutex<StatusMessage>,
) -> AppResult<()> {
    let workspace = Workspace::create(&deps.config.temp_dir, media.label())?;
    let result = run_stages(bot, chat_id, deps, url, media, status, &workspace).await;
    workspace.remove().await;
    result
}

async fn run_stages(
    bot: &Bot,
    chat_id: ChatId,
    deps: &RequestDeps,
    url: &Url,
    media: MediaType,
    status: &Mutex<StatusMessage>,
    workspace: &Workspace,
) -> AppResult<()> {
    status.lock().await.set_stage(bot, Stage::Downloading, media).await?;
    let fetched = fetch::fetch(&deps.config, workspace, url, media).await?;

    let size = validation::validate_media_file(&fetched.path)?;
    log::debug!("Validated download: {} bytes", size);

    status.lock().await.set_stage(bot, Stage::Converting, media).await?;
    let transcoded = {
        let _permit = deps
            .transcode_pool
            .acquire()
            .await
            .map_err(std::io::Error::other)?;
        let spec = TranscodeSpec::for_media(media, &fetched.path, workspace);
        transcode::transcode(&deps.config, &spec).await?
    };

    status.lock().await.set_stage(bot, Stage::Uploading, media).await?;
    let info = transcode::probe_media(&deps.config, &transcoded).await;
    let meta = UploadMetadata {
        title: fetched.title,
        uploader: fetched.uploader,
        info,
    };
    upload::send_media(bot, chat_id, media, &transcoded, &meta).await?;

    Ok(())
}
