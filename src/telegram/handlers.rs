//! Command routing: the dispatcher schema and the endpoint behind it.
//!
//! The schema is a plain function so integration tests can drive the same
//! handler tree as production. Dependencies come in through the dispatcher's
//! dependency map, never through globals.

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;
use url::Url;

use crate::core::AppError;
use crate::fetch::MediaType;
use crate::pipeline::{self, RequestDeps};
use crate::telegram::bot::Command;
use crate::telegram::Bot;

/// Error type for handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Builds the dispatcher handler tree.
///
/// Expects a [`RequestDeps`] in the dependency map.
pub fn schema() -> UpdateHandler<HandlerError> {
    dptree::entry().branch(
        Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(handle_command)),
    )
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command, deps: RequestDeps) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    log::info!("🎯 {:?} from chat {}", cmd, chat_id);

    match cmd {
        Command::Start => {
            bot.send_message(chat_id, help_text()).await?;
        }
        Command::Mp3(args) => start_request(bot, chat_id, deps, MediaType::Audio, &args).await?,
        Command::Mp4(args) => start_request(bot, chat_id, deps, MediaType::Video, &args).await?,
    }

    Ok(())
}

/// Validates the URL argument, then hands the request to the pipeline as a
/// detached task so the dispatcher can keep serving other updates (and
/// other requests from the same chat).
async fn start_request(
    bot: Bot,
    chat_id: ChatId,
    deps: RequestDeps,
    media: MediaType,
    args: &str,
) -> Result<(), HandlerError> {
    let url = match parse_url_arg(args) {
        Ok(url) => url,
        Err(e) => {
            // Bad argument: answer immediately, no pipeline work starts
            bot.send_message(chat_id, e.user_message()).await?;
            return Ok(());
        }
    };

    tokio::spawn(pipeline::process_request(bot, chat_id, deps, url, media));
    Ok(())
}

/// Router-level argument check: an empty or unparseable argument is
/// [`AppError::MissingArgument`], reported with a usage hint.
fn parse_url_arg(args: &str) -> Result<Url, AppError> {
    let trimmed = args.trim();
    if trimmed.is_empty() {
        return Err(AppError::MissingArgument);
    }
    Url::parse(trimmed).map_err(|_| AppError::MissingArgument)
}

fn help_text() -> String {
    format!(
        "Send me a link and I'll bring back the media:\n\n{}\n\nExample: /mp3 https://youtu.be/dQw4w9WgXcQ",
        Command::descriptions()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_url_arg_accepts_http_urls() {
        let url = parse_url_arg("https://youtu.be/abc").unwrap();
        assert_eq!(url.as_str(), "https://youtu.be/abc");

        // Whitespace from command splitting is tolerated
        assert!(parse_url_arg("  https://example.com/v/1  ").is_ok());
    }

    #[test]
    fn test_parse_url_arg_rejects_empty() {
        assert!(matches!(parse_url_arg(""), Err(AppError::MissingArgument)));
        assert!(matches!(parse_url_arg("   "), Err(AppError::MissingArgument)));
    }

    #[test]
    fn test_parse_url_arg_rejects_non_urls() {
        assert!(matches!(parse_url_arg("not a url"), Err(AppError::MissingArgument)));
        assert!(matches!(parse_url_arg("youtube.com/watch?v=x"), Err(AppError::MissingArgument)));
    }

    #[test]
    fn test_help_text_lists_both_download_commands() {
        let help = help_text();
        assert!(help.contains("/mp3"));
        assert!(help.contains("/mp4"));
    }
}
