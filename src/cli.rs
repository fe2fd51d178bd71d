use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "zagruzka")]
#[command(author, version, about = "Telegram bot that turns links into MP3/MP4 files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (default when no subcommand is given)
    Run,

    /// Check the external tools (yt-dlp, ffmpeg, ffprobe) and exit
    Check,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_run() {
        let cli = Cli::try_parse_from(["zagruzka"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_check_subcommand_parses() {
        let cli = Cli::try_parse_from(["zagruzka", "check"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));
    }

    #[test]
    fn test_run_subcommand_parses() {
        let cli = Cli::try_parse_from(["zagruzka", "run"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Run)));
    }
}
