use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;

use zagruzka::cli::{Cli, Commands};
use zagruzka::core::{init_logger, Config};
use zagruzka::fetch::ytdlp_version;
use zagruzka::pipeline::RequestDeps;
use zagruzka::telegram::{create_bot, schema, setup_bot_commands};
use zagruzka::transcode::ffmpeg_version;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // .env first: everything after this reads the environment
    let _ = dotenv();

    match cli.command {
        Some(Commands::Check) => run_check().await,
        Some(Commands::Run) | None => run_bot().await,
    }
}

async fn run_bot() -> Result<()> {
    let config = Arc::new(Config::from_env()?);
    init_logger(&config.log_file)?;

    log::info!("Starting zagruzka v{}", env!("CARGO_PKG_VERSION"));

    // Every request transcodes, so a missing ffmpeg means a bot that can
    // only fail; refuse to start instead.
    match ffmpeg_version(&config.ffmpeg_bin).await {
        Some(version) => log::info!("Found {}", version),
        None => anyhow::bail!(
            "ffmpeg not found at '{}'; it is required for transcoding",
            config.ffmpeg_bin
        ),
    }

    match ytdlp_version(&config.ytdlp_bin).await {
        Some(version) => log::info!("Found yt-dlp {}", version),
        None => log::warn!(
            "yt-dlp not found at '{}'; downloads will fail until it is installed",
            config.ytdlp_bin
        ),
    }

    let bot = create_bot(&config)?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let deps = RequestDeps::new(Arc::clone(&config));

    log::info!("📡 Ready to receive updates!");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shut down");
    Ok(())
}

/// `check` needs no bot token: it only resolves the external binaries,
/// reading the same environment overrides the bot would.
async fn run_check() -> Result<()> {
    let ytdlp_bin = std::env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string());
    let ffmpeg_bin = std::env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string());
    let ffprobe_bin = std::env::var("FFPROBE_BIN").unwrap_or_else(|_| "ffprobe".to_string());

    let mut all_good = true;

    match ytdlp_version(&ytdlp_bin).await {
        Some(version) => println!("yt-dlp {:>12} ({})", version, ytdlp_bin),
        None => {
            println!("yt-dlp       MISSING ({})", ytdlp_bin);
            all_good = false;
        }
    }

    match ffmpeg_version(&ffmpeg_bin).await {
        Some(version) => println!("{}", version),
        None => {
            println!("ffmpeg       MISSING ({})", ffmpeg_bin);
            all_good = false;
        }
    }

    // ffprobe ships with ffmpeg but binary paths are configured separately
    match ffmpeg_version(&ffprobe_bin).await {
        Some(version) => println!("{}", version),
        None => {
            println!("ffprobe      MISSING ({})", ffprobe_bin);
            all_good = false;
        }
    }

    if all_good {
        println!("All external tools found.");
        Ok(())
    } else {
        anyhow::bail!("some external tools are missing")
    }
}
