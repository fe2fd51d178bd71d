//! Telegram-compatible MP4 encode arguments.

use std::ffi::OsString;
use std::path::Path;

/// Audio bitrate inside the MP4 target.
pub const VIDEO_AUDIO_BITRATE: &str = "128k";

/// ffmpeg argv: H.264 + AAC in MP4.
///
/// `-fflags +genpts` runs as an input option because several platforms
/// serve streams with broken timestamps. `+faststart` moves the moov atom
/// up front so clients can start playback mid-transfer, and `yuv420p`
/// keeps 10-bit sources playable on mobile clients.
pub fn args(input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        OsString::from("-hide_banner"),
        OsString::from("-loglevel"),
        OsString::from("error"),
        OsString::from("-y"),
        OsString::from("-fflags"),
        OsString::from("+genpts"),
        OsString::from("-i"),
        input.into(),
        OsString::from("-c:v"),
        OsString::from("libx264"),
        OsString::from("-preset"),
        OsString::from("fast"),
        OsString::from("-crf"),
        OsString::from("23"),
        OsString::from("-pix_fmt"),
        OsString::from("yuv420p"),
        OsString::from("-c:a"),
        OsString::from("aac"),
        OsString::from("-b:a"),
        OsString::from(VIDEO_AUDIO_BITRATE),
        OsString::from("-movflags"),
        OsString::from("+faststart"),
        output.into(),
    ]
}
