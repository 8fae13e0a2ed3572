//! External collaborators
//!
//! A run drives five external systems: the tool download, the image
//! builder, the registry, the scanner and the cluster. Each is a trait so
//! the stages can be exercised without any of them; the default
//! implementations shell out through a [`ProcessRunner`].

mod cluster;
mod container;
mod scanner;
mod source;
mod tooling;

pub use cluster::{Cluster, Kubectl};
pub use container::{ContainerCli, ImageBuilder, Registry};
pub use scanner::{InlineScanner, Scanner};
pub use source::{GitSource, LocalSource, SourceFetcher};
pub use tooling::{HttpToolInstaller, LocalToolInstaller, SCANNER_FILE_NAME, ToolInstaller};

use std::sync::Arc;

use crate::config::{PipelineConfig, ScannerSource};
use crate::process::{ProcessRunner, SystemProcessRunner};

/// Every collaborator a run needs
#[derive(Clone)]
pub struct Collaborators {
    pub tools: Arc<dyn ToolInstaller>,
    pub builder: Arc<dyn ImageBuilder>,
    pub registry: Arc<dyn Registry>,
    pub scanner: Arc<dyn Scanner>,
    pub cluster: Arc<dyn Cluster>,
    pub source: Arc<dyn SourceFetcher>,
    /// Runs the bootstrap hook
    pub process: Arc<dyn ProcessRunner>,
}

impl Collaborators {
    /// Wires the process-backed implementations from configuration
    ///
    /// The source is fetched with git from `config.source_url`; callers that
    /// build from a local directory replace `source` with a [`LocalSource`].
    pub fn system(config: &PipelineConfig) -> Self {
        let process: Arc<dyn ProcessRunner> = Arc::new(SystemProcessRunner);

        let tools: Arc<dyn ToolInstaller> = match &config.scanner {
            ScannerSource::Download(url) => Arc::new(HttpToolInstaller::new(url.clone())),
            ScannerSource::Local(path) => Arc::new(LocalToolInstaller::new(path.clone())),
        };

        let container = Arc::new(ContainerCli::new(
            process.clone(),
            config.container_bin.clone(),
            config.registry_login_command.clone(),
        ));

        let scanner = Arc::new(InlineScanner::new(
            process.clone(),
            config.scan_endpoint.clone(),
            config.scan_key.clone(),
        ));

        let cluster = Arc::new(Kubectl::new(
            process.clone(),
            config.kubectl_bin.clone(),
            config.kube_context.clone(),
        ));

        let source = Arc::new(GitSource::new(
            process.clone(),
            config.source_url.clone().unwrap_or_default(),
        ));

        Self {
            tools,
            builder: container.clone(),
            registry: container,
            scanner,
            cluster,
            source,
            process,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn SourceFetcher>) -> Self {
        self.source = source;
        self
    }
}
