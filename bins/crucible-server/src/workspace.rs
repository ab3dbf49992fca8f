//! Per-request working directory.
//!
//! Every request owns exactly one directory under the configured temp
//! root, named by a fresh UUID, and the directory never outlives the
//! request. Teardown failures are logged and swallowed; they must not
//! change the result.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct Workspace {
    root: PathBuf,
    destroyed: bool,
}

impl Workspace {
    /// Create a fresh directory under `temp_root`.
    pub async fn create(temp_root: &Path) -> std::io::Result<Self> {
        let root = temp_root.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&root).await?;
        debug!(path = %root.display(), "workspace created");
        Ok(Self {
            root,
            destroyed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Write a file at a workspace-relative path, creating parents.
    pub async fn write_file(&self, relative: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, contents).await?;
        Ok(path)
    }

    /// Remove the directory and everything in it.
    ///
    /// "Not found" is ignored; any other error is logged and swallowed.
    pub async fn destroy(mut self) {
        self.destroyed = true;
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => debug!(path = %self.root.display(), "workspace removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.root.display(), error = %e, "failed to remove workspace"),
        }
    }
}

// Last-resort cleanup for exit paths that never reached destroy(). The
// blocking removal is acceptable here: workspaces are small and this only
// fires on abnormal unwinding.
impl Drop for Workspace {
    fn drop(&mut self) {
        if self.destroyed {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.root.display(), error = %e, "failed to remove workspace on drop");
            }
        }
    }
}
