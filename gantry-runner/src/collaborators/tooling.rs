//! Auxiliary tooling installation

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ToolError;

/// File name the scanner is installed under
pub const SCANNER_FILE_NAME: &str = "inline_scan.sh";

/// Makes the scanning utility available for a run
#[async_trait]
pub trait ToolInstaller: Send + Sync {
    /// Installs the scanner into `tools_dir` and returns its path
    async fn install(&self, tools_dir: &Path) -> Result<PathBuf, ToolError>;
}

/// Downloads the scanner script over HTTP and marks it executable
pub struct HttpToolInstaller {
    client: reqwest::Client,
    url: String,
}

impl HttpToolInstaller {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn download(&self) -> Result<Vec<u8>, ToolError> {
        let download_error = |message: String| ToolError::Download {
            url: self.url.clone(),
            message,
        };

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        if bytes.is_empty() {
            return Err(download_error("empty response body".to_string()));
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ToolInstaller for HttpToolInstaller {
    async fn install(&self, tools_dir: &Path) -> Result<PathBuf, ToolError> {
        info!("Downloading scanner from {}", self.url);

        let script = self.download().await?;

        tokio::fs::create_dir_all(tools_dir)
            .await
            .map_err(|e| ToolError::io("failed to create", tools_dir, e))?;

        let path = tools_dir.join(SCANNER_FILE_NAME);
        tokio::fs::write(&path, &script)
            .await
            .map_err(|e| ToolError::io("failed to write", &path, e))?;
        make_executable(&path).await?;

        debug!("Scanner installed at {} ({} bytes)", path.display(), script.len());
        Ok(path)
    }
}

/// Uses a scanner that is already installed on the host
pub struct LocalToolInstaller {
    path: PathBuf,
}

impl LocalToolInstaller {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ToolInstaller for LocalToolInstaller {
    async fn install(&self, _tools_dir: &Path) -> Result<PathBuf, ToolError> {
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|_| {
            ToolError::Missing(format!("scanner not found at {}", self.path.display()))
        })?;

        if !metadata.is_file() {
            return Err(ToolError::Missing(format!(
                "scanner path {} is not a file",
                self.path.display()
            )));
        }

        Ok(self.path.clone())
    }
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<(), ToolError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| ToolError::io("failed to chmod", path, e))
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<(), ToolError> {
    Ok(())
}
