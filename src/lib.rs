//! Zagruzka: a Telegram bot that turns links into MP3/MP4 files.
//!
//! `/mp3 <url>` and `/mp4 <url>` run the same pipeline: fetch the media
//! with yt-dlp, validate the download, re-encode it with ffmpeg into a
//! chat-compatible target, and upload the result back into the chat. Every
//! request works in its own temporary workspace and is retried as a whole
//! on transient failures.
//!
//! # Module structure
//!
//! - `core`: configuration, errors, retry policy, subprocess supervision,
//!   temporary workspaces, logging
//! - `fetch`: yt-dlp probing and downloading
//! - `transcode`: ffmpeg re-encoding and ffprobe metadata
//! - `telegram`: bot construction, command routing, status messages and
//!   uploads
//! - `pipeline`: the per-request orchestration tying the stages together

pub mod cli;
pub mod core;
pub mod fetch;
pub mod pipeline;
pub mod telegram;
pub mod transcode;

// Re-export the types nearly every consumer needs
pub use crate::core::{AppError, AppResult, Config};
