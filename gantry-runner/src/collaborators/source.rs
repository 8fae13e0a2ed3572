//! Source materialization
//!
//! Produces the source tree of one revision on disk.

use async_trait::async_trait;
use gantry_core::domain::revision::Revision;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::error::ToolError;
use crate::process::{CommandSpec, ProcessRunner};

/// Source repository collaborator
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Materializes `revision` and returns the source root
    ///
    /// `dest` is an empty directory owned by the run; implementations may
    /// ignore it when the source already lives elsewhere.
    async fn materialize(&self, revision: &Revision, dest: &Path) -> Result<PathBuf, ToolError>;
}

/// Clones a git repository and checks out the revision
pub struct GitSource {
    process: Arc<dyn ProcessRunner>,
    url: String,
}

impl GitSource {
    pub fn new(process: Arc<dyn ProcessRunner>, url: impl Into<String>) -> Self {
        Self {
            process,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SourceFetcher for GitSource {
    async fn materialize(&self, revision: &Revision, dest: &Path) -> Result<PathBuf, ToolError> {
        if self.url.is_empty() {
            return Err(ToolError::Missing(
                "no source repository url configured".to_string(),
            ));
        }

        info!("Cloning {} at {}", self.url, revision.short());

        let dest_str = dest.to_string_lossy().to_string();
        let clone = CommandSpec::new("git")
            .args(["clone", "--quiet", self.url.as_str(), dest_str.as_str()]);
        self.process.run(&clone).await?.check("git clone")?;

        let checkout = CommandSpec::new("git")
            .args(["-C", dest_str.as_str(), "checkout", "--quiet", "--detach"])
            .arg(revision.as_str());
        self.process.run(&checkout).await?.check("git checkout")?;

        Ok(dest.to_path_buf())
    }
}

/// Uses a directory that already contains the source
///
/// Meant for local runs; the directory is never modified or removed.
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl SourceFetcher for LocalSource {
    async fn materialize(&self, _revision: &Revision, _dest: &Path) -> Result<PathBuf, ToolError> {
        if !self.root.is_dir() {
            return Err(ToolError::Missing(format!(
                "source directory {} does not exist",
                self.root.display()
            )));
        }
        Ok(self.root.clone())
    }
}
