//! Runner configuration
//!
//! Defines every configurable parameter of a pipeline run (registry,
//! cluster, scanner, hooks) and of the polling trigger.

use gantry_core::domain::deployment::DeploymentTarget;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default download location of the inline scanning script
pub const DEFAULT_SCANNER_URL: &str = "https://download.sysdig.com/stable/inline_scan.sh";

/// Default scan service endpoint
pub const DEFAULT_SCAN_ENDPOINT: &str = "https://secure.sysdig.com";

/// Phrase whose presence in the scan report means the image passed
pub const DEFAULT_PASS_PHRASE: &str = "status is pass";

/// Where the scanner comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerSource {
    /// Downloaded fresh into the run's tools directory
    Download(String),
    /// Already installed at this path
    Local(PathBuf),
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Registry repository URI images are pushed to
    pub registry_uri: String,

    /// Cluster identifier, exported to every stage as CLUSTER_NAME
    pub cluster_name: String,

    /// Workload updated on success
    pub target: DeploymentTarget,

    /// kubectl context to use; `None` uses the current context
    pub kube_context: Option<String>,

    /// Directory inside the source checkout that holds the image recipe
    pub build_context: PathBuf,

    /// Base directory for per-run workspaces
    pub workspace_root: PathBuf,

    /// Git URL of the source repository
    pub source_url: Option<String>,

    pub scanner: ScannerSource,

    /// Scan service endpoint passed to the scanner
    pub scan_endpoint: String,

    /// Scan service key passed to the scanner
    pub scan_key: String,

    /// Case-insensitive phrase the scan report must contain
    pub pass_phrase: String,

    /// Shell command run during pre-build (e.g. cluster credential setup)
    pub bootstrap_command: Option<String>,

    /// Shell command that refreshes registry credentials, run once per build
    pub registry_login_command: Option<String>,

    /// Container engine binary (docker, podman)
    pub container_bin: String,

    pub kubectl_bin: String,

    /// Extra variables exported to every stage
    pub extra_env: BTreeMap<String, String>,
}

impl PipelineConfig {
    /// Creates a configuration with defaults for everything but the
    /// registry, cluster and scan key
    pub fn new(
        registry_uri: impl Into<String>,
        cluster_name: impl Into<String>,
        scan_key: impl Into<String>,
    ) -> Self {
        Self {
            registry_uri: registry_uri.into(),
            cluster_name: cluster_name.into(),
            target: DeploymentTarget::default(),
            kube_context: None,
            build_context: PathBuf::from("flask-docker-app"),
            workspace_root: PathBuf::from("/tmp/gantry"),
            source_url: None,
            scanner: ScannerSource::Download(DEFAULT_SCANNER_URL.to_string()),
            scan_endpoint: DEFAULT_SCAN_ENDPOINT.to_string(),
            scan_key: scan_key.into(),
            pass_phrase: DEFAULT_PASS_PHRASE.to_string(),
            bootstrap_command: None,
            registry_login_command: None,
            container_bin: "docker".to_string(),
            kubectl_bin: "kubectl".to_string(),
            extra_env: BTreeMap::new(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Required:
    /// - GANTRY_REGISTRY_URI
    /// - GANTRY_CLUSTER_NAME
    /// - GANTRY_SCAN_KEY
    ///
    /// Optional: GANTRY_DEPLOYMENT, GANTRY_CONTAINER, GANTRY_NAMESPACE,
    /// GANTRY_KUBE_CONTEXT, GANTRY_BUILD_CONTEXT, GANTRY_WORKSPACE_ROOT,
    /// GANTRY_SOURCE_URL, GANTRY_SCANNER_URL, GANTRY_SCANNER_PATH,
    /// GANTRY_SCAN_ENDPOINT, GANTRY_PASS_PHRASE, GANTRY_BOOTSTRAP_COMMAND,
    /// GANTRY_REGISTRY_LOGIN_COMMAND, GANTRY_CONTAINER_BIN, GANTRY_KUBECTL_BIN
    ///
    /// GANTRY_PASS_ENV is a comma-separated list of variable names whose
    /// values are exported to every stage.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| anyhow::anyhow!("{} environment variable not set", name))
        };

        let mut config = Self::new(
            required("GANTRY_REGISTRY_URI")?,
            required("GANTRY_CLUSTER_NAME")?,
            required("GANTRY_SCAN_KEY")?,
        );

        if let Some(deployment) = var("GANTRY_DEPLOYMENT") {
            config.target.deployment = deployment;
        }
        if let Some(container) = var("GANTRY_CONTAINER") {
            config.target.container = container;
        }
        config.target.namespace = var("GANTRY_NAMESPACE");
        config.kube_context = var("GANTRY_KUBE_CONTEXT");

        if let Some(dir) = var("GANTRY_BUILD_CONTEXT") {
            config.build_context = PathBuf::from(dir);
        }
        if let Some(root) = var("GANTRY_WORKSPACE_ROOT") {
            config.workspace_root = PathBuf::from(root);
        }
        config.source_url = var("GANTRY_SOURCE_URL");

        // A preinstalled scanner wins over downloading one
        if let Some(path) = var("GANTRY_SCANNER_PATH") {
            config.scanner = ScannerSource::Local(PathBuf::from(path));
        } else if let Some(url) = var("GANTRY_SCANNER_URL") {
            config.scanner = ScannerSource::Download(url);
        }
        if let Some(endpoint) = var("GANTRY_SCAN_ENDPOINT") {
            config.scan_endpoint = endpoint;
        }
        if let Some(phrase) = lookup("GANTRY_PASS_PHRASE") {
            config.pass_phrase = phrase;
        }

        config.bootstrap_command = var("GANTRY_BOOTSTRAP_COMMAND");
        config.registry_login_command = var("GANTRY_REGISTRY_LOGIN_COMMAND");

        if let Some(bin) = var("GANTRY_CONTAINER_BIN") {
            config.container_bin = bin;
        }
        if let Some(bin) = var("GANTRY_KUBECTL_BIN") {
            config.kubectl_bin = bin;
        }

        if let Some(names) = var("GANTRY_PASS_ENV") {
            for name in names.split(',').map(str::trim).filter(|name| !name.is_empty()) {
                let value = lookup(name).ok_or_else(|| {
                    anyhow::anyhow!("{} is listed in GANTRY_PASS_ENV but not set", name)
                })?;
                config.extra_env.insert(name.to_string(), value);
            }
        }

        Ok(config)
    }

    /// Adds a variable exported to every stage
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env.insert(key.into(), value.into());
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.registry_uri.is_empty() {
            anyhow::bail!("registry_uri cannot be empty");
        }

        if self.registry_uri.contains(char::is_whitespace) {
            anyhow::bail!("registry_uri cannot contain whitespace");
        }

        if self.cluster_name.is_empty() {
            anyhow::bail!("cluster_name cannot be empty");
        }

        if self.target.deployment.is_empty() || self.target.container.is_empty() {
            anyhow::bail!("deployment and container names cannot be empty");
        }

        // An empty phrase is contained in every report and would pass everything
        if self.pass_phrase.trim().is_empty() {
            anyhow::bail!("pass_phrase cannot be empty");
        }

        if self.scan_key.is_empty() {
            anyhow::bail!("scan_key cannot be empty");
        }

        if let ScannerSource::Download(url) = &self.scanner {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("scanner url must start with http:// or https://");
            }
        }

        if self.build_context.is_absolute() {
            anyhow::bail!("build_context must be relative to the source root");
        }

        Ok(())
    }
}

/// Polling trigger configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Git URL whose branch head is watched
    pub source_url: String,

    /// Branch to watch
    pub branch: String,

    /// How often to check the branch head
    pub poll_interval: Duration,
}

impl PollerConfig {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            branch: "main".to_string(),
            poll_interval: Duration::from_secs(30),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// - GANTRY_SOURCE_URL (required)
    /// - GANTRY_SOURCE_BRANCH (optional, default: main)
    /// - GANTRY_POLL_INTERVAL (optional, seconds, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source_url = lookup("GANTRY_SOURCE_URL")
            .ok_or_else(|| anyhow::anyhow!("GANTRY_SOURCE_URL environment variable not set"))?;

        let mut config = Self::new(source_url);

        if let Some(branch) = lookup("GANTRY_SOURCE_BRANCH") {
            config.branch = branch;
        }

        if let Some(value) = lookup("GANTRY_POLL_INTERVAL") {
            let secs = value.trim().parse::<u64>().map_err(|_| {
                anyhow::anyhow!("GANTRY_POLL_INTERVAL must be a number of seconds")
            })?;
            config.poll_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.source_url.is_empty() {
            anyhow::bail!("source_url cannot be empty");
        }

        if self.branch.is_empty() {
            anyhow::bail!("branch cannot be empty");
        }

        if self.poll_interval.as_secs() == 0 {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        Ok(())
    }
}
