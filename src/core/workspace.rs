//! Per-request temporary workspace.
//!
//! Every inbound command gets its own scoped directory under the configured
//! temp root; all fetch and transcode artifacts for that request live
//! inside it. The directory is removed recursively on every exit path,
//! since under sustained load a single leaked workspace per failed request
//! would eventually fill the disk.

use std::path::{Path, PathBuf};

/// A scoped temporary directory owned by one request.
///
/// Call [`Workspace::remove`] when the request concludes. `Drop` performs a
/// best-effort blocking removal as a backstop for early-return paths, so a
/// workspace can never outlive its request even when cleanup is skipped.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    removed: bool,
}

impl Workspace {
    /// Create a fresh workspace directory under `temp_root`.
    ///
    /// The name combines a caller tag (e.g. the chat id), the current
    /// timestamp and a random suffix, so concurrent requests never collide.
    pub fn create(temp_root: &Path, tag: &str) -> std::io::Result<Self> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let rand: u32 = rand::random();
        let path = temp_root.join(format!("zagruzka_{}_{}_{:x}", tag, timestamp, rand));
        std::fs::create_dir_all(&path)?;
        Ok(Self { path, removed: false })
    }

    /// The workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A path for a file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Recursively remove the workspace. Idempotent: removing an
    /// already-removed workspace is a no-op.
    pub async fn remove(mut self) {
        self.removed = true;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => log::debug!("Removed workspace {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove workspace {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove workspace {} on drop: {}", self.path.display(), e);
            }
        }
    }
}
