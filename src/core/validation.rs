//! Integrity checks on fetched artifacts.
//!
//! Flaky upstream platforms produce partial or zero-byte downloads that
//! would otherwise surface much later as a failed or corrupted upload. The
//! check runs between fetch and transcode, on the resolved on-disk path.

use std::path::Path;
use thiserror::Error;

/// Any file below this size cannot plausibly be real media.
pub const MIN_VALID_FILE_SIZE: u64 = 1024; // 1 KiB

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The artifact is absent or implausibly small
    #[error("file '{path}' is missing or too small ({size} bytes)")]
    EmptyOrMissingFile { path: String, size: u64 },
}

/// Confirm the fetched artifact exists and is plausibly non-empty.
///
/// Returns the file size on success.
pub fn validate_media_file(path: &Path) -> Result<u64, ValidationError> {
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    if size < MIN_VALID_FILE_SIZE {
        return Err(ValidationError::EmptyOrMissingFile {
            path: path.display().to_string(),
            size,
        });
    }

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    // ==================== Media File Validation Tests ====================

    #[test]
    fn test_missing_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("does_not_exist.mp4");

        let err = validate_media_file(&path).unwrap_err();
        match err {
            ValidationError::EmptyOrMissingFile { size, .. } => assert_eq!(size, 0),
        }
    }

    #[test]
    fn test_empty_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.mp3");
        std::fs::File::create(&path).unwrap();

        assert!(validate_media_file(&path).is_err());
    }

    #[test]
    fn test_tiny_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.mp4");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0u8; 512]).unwrap();

        let err = validate_media_file(&path).unwrap_err();
        match err {
            ValidationError::EmptyOrMissingFile { size, .. } => assert_eq!(size, 512),
        }
    }

    #[test]
    fn test_plausible_file_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("track.mp3");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0u8; 4096]).unwrap();

        assert_eq!(validate_media_file(&path).unwrap(), 4096);
    }

    #[test]
    fn test_boundary_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edge.mp3");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&vec![0u8; MIN_VALID_FILE_SIZE as usize]).unwrap();

        // Exactly at the threshold passes; one byte under fails.
        assert!(validate_media_file(&path).is_ok());

        let path_under = dir.path().join("under.mp3");
        let mut f = std::fs::File::create(&path_under).unwrap();
        f.write_all(&vec![0u8; MIN_VALID_FILE_SIZE as usize - 1]).unwrap();
        assert!(validate_media_file(&path_under).is_err());
    }
}
