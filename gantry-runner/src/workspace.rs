//! Per-run build workspace
//!
//! Every run gets a fresh directory under the workspace root. It is removed
//! when the [`BuildWorkspace`] is dropped, so nothing from one run can leak
//! into the next.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ToolError;

pub struct BuildWorkspace {
    root: PathBuf,
}

impl BuildWorkspace {
    /// Creates `<base>/<run_id>/` and its tools directory
    pub fn create(base: &Path, run_id: Uuid) -> Result<Self, ToolError> {
        let root = base.join(run_id.to_string());

        if root.exists() {
            std::fs::remove_dir_all(&root)
                .map_err(|e| ToolError::io("failed to clear", &root, e))?;
        }

        let workspace = Self { root };
        std::fs::create_dir_all(workspace.tools_dir())
            .map_err(|e| ToolError::io("failed to create", workspace.tools_dir(), e))?;

        debug!("Created workspace {}", workspace.root.display());
        Ok(workspace)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Where the source is materialized (not created up front)
    pub fn source_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn tools_dir(&self) -> PathBuf {
        self.root.join("tools")
    }
}

impl Drop for BuildWorkspace {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => debug!("Discarded workspace {}", self.root.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to discard workspace {}: {}", self.root.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_lifecycle() {
        let base = tempfile::tempdir().unwrap();
        let run_id = Uuid::new_v4();

        let workspace = BuildWorkspace::create(base.path(), run_id).unwrap();
        let root = workspace.path().to_path_buf();
        assert_eq!(root, base.path().join(run_id.to_string()));
        assert!(workspace.tools_dir().is_dir());
        assert!(!workspace.source_dir().exists());

        std::fs::write(root.join("abc123.txt"), "report").unwrap();
        drop(workspace);
        assert!(!root.exists());
    }

    #[test]
    fn test_stale_directory_is_replaced() {
        let base = tempfile::tempdir().unwrap();
        let run_id = Uuid::new_v4();
        let stale = base.path().join(run_id.to_string());
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::write(stale.join("old.txt"), "stale").unwrap();

        let workspace = BuildWorkspace::create(base.path(), run_id).unwrap();
        assert!(!workspace.path().join("old.txt").exists());
    }
}
