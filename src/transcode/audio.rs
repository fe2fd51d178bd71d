//! MP3 encode arguments.

use std::ffi::OsString;
use std::path::Path;

/// Fixed bitrate for delivered audio.
pub const AUDIO_BITRATE: &str = "192k";

/// ffmpeg argv: drop any video track, encode audio as MP3.
pub fn args(input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        OsString::from("-hide_banner"),
        OsString::from("-loglevel"),
        OsString::from("error"),
        OsString::from("-y"),
        OsString::from("-i"),
        input.into(),
        OsString::from("-vn"),
        OsString::from("-acodec"),
        OsString::from("libmp3lame"),
        OsString::from("-b:a"),
        OsString::from(AUDIO_BITRATE),
        output.into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_audio_args() {
        let input = PathBuf::from("/ws/media.webm");
        let output = PathBuf::from("/ws/output.mp3");
        let args = args(&input, &output);

        assert!(args.contains(&OsString::from("-vn")));
        assert!(args.contains(&OsString::from("libmp3lame")));
        assert!(args.contains(&OsString::from("192k")));
        assert!(args.contains(&OsString::from("-y")));
        assert_eq!(args.last().unwrap(), &OsString::from("/ws/output.mp3"));

        // Input must follow -i
        let i_flag = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[i_flag + 1], OsString::from("/ws/media.webm"));
    }
}
