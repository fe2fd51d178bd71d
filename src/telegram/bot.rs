//! Bot construction and the command definitions.

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use super::Bot;
use crate::core::config::Config;

/// Bot commands, with the descriptions shown in the client command menu.
///
/// The argument-carrying variants capture the whole rest of the message
/// text, so a bare `/mp3` parses to an empty argument and the router can
/// answer with a usage hint instead of a parse error.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "show help")]
    Start,
    #[command(description = "download audio from a link: /mp3 <url>")]
    Mp3(String),
    #[command(description = "download video from a link: /mp4 <url>")]
    Mp4(String),
}

/// Creates the bot with a custom HTTP client.
///
/// Media uploads are large relative to normal API traffic, so the client
/// gets a much longer timeout than reqwest's default. A configured
/// `BOT_API_URL` points the bot at a local Bot API server.
pub fn create_bot(config: &Config) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config.http_timeout).build()?;
    let bot = Bot::with_client(config.bot_token.clone(), client);

    let bot = match &config.bot_api_url {
        Some(url) => {
            log::info!("Using custom Bot API URL: {}", url);
            bot.set_api_url(url.clone())
        }
        None => bot,
    };

    Ok(bot)
}

/// Registers the command list so clients offer completion hints.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_commands_parse() {
        let cmd = Command::parse("/start", "zagruzka_bot").unwrap();
        assert_eq!(cmd, Command::Start);

        let cmd = Command::parse("/mp3 https://youtu.be/abc", "zagruzka_bot").unwrap();
        assert_eq!(cmd, Command::Mp3("https://youtu.be/abc".to_string()));

        let cmd = Command::parse("/mp4 https://youtu.be/abc", "zagruzka_bot").unwrap();
        assert_eq!(cmd, Command::Mp4("https://youtu.be/abc".to_string()));
    }

    #[test]
    fn test_bare_command_parses_with_empty_argument() {
        // The router, not the parser, reports the missing URL
        let cmd = Command::parse("/mp3", "zagruzka_bot").unwrap();
        assert_eq!(cmd, Command::Mp3(String::new()));
    }

    #[test]
    fn test_mention_addressing() {
        let cmd = Command::parse("/mp3@zagruzka_bot https://youtu.be/abc", "zagruzka_bot").unwrap();
        assert_eq!(cmd, Command::Mp3("https://youtu.be/abc".to_string()));
    }

    #[test]
    fn test_wrong_mention_is_rejected() {
        assert!(Command::parse("/mp3@other_bot https://youtu.be/abc", "zagruzka_bot").is_err());
    }

    #[test]
    fn test_command_list_is_registered_from_the_enum() {
        let commands = Command::bot_commands();
        let names: Vec<&str> = commands.iter().map(|c| c.command.trim_start_matches('/')).collect();
        assert_eq!(names, vec!["start", "mp3", "mp4"]);
    }
}
