//! Small string helpers shared by the pipeline stages.

/// Escape characters that are unsafe in filenames.
///
/// Replacements:
/// - `/`, `\` -> `_` (path separators)
/// - `:`, `*`, `?`, `<`, `>`, `|` -> `_` (reserved on Windows)
/// - `"` -> `'`
/// - control characters (0x00-0x1F) -> `_`
///
/// Leading/trailing whitespace and dots are stripped; an empty result
/// becomes `"unnamed"`.
///
/// # Example
///
/// ```
/// use zagruzka::core::utils::escape_filename;
///
/// assert_eq!(escape_filename("song/name*.mp3"), "song_name_.mp3");
/// ```
pub fn escape_filename(filename: &str) -> String {
    let mut result = String::with_capacity(filename.len());

    for c in filename.chars() {
        match c {
            '/' | '\\' => result.push('_'),
            ':' | '*' | '?' | '<' | '>' | '|' => result.push('_'),
            '"' => result.push('\''),
            c if c.is_control() => result.push('_'),
            _ => result.push(c),
        }
    }

    let result = result.trim_matches(|c: char| c.is_whitespace() || c == '.');

    if result.is_empty() {
        "unnamed".to_string()
    } else {
        result.to_string()
    }
}

/// Truncate to at most `limit` characters, appending `…` when cut.
///
/// The result, ellipsis included, never exceeds `limit` characters. Operates
/// on char boundaries so multi-byte titles stay valid UTF-8.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Caption for an attachment: "Title — Artist", or just the title when the
/// uploader is unknown.
pub fn format_media_caption(title: &str, uploader: &str) -> String {
    if uploader.trim().is_empty() {
        title.to_string()
    } else {
        format!("{} — {}", title, uploader.trim())
    }
}
