//! Deployment target domain type

use serde::{Deserialize, Serialize};

/// A running workload whose image field is updated after a successful run
///
/// The target must already exist in the cluster. Runs only ever change its
/// container image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    /// Deployment object name
    pub deployment: String,
    /// Container name inside the deployment's pod template
    pub container: String,
    /// Namespace; `None` uses the cluster context default
    pub namespace: Option<String>,
}

impl DeploymentTarget {
    pub fn new(deployment: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            deployment: deployment.into(),
            container: container.into(),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl Default for DeploymentTarget {
    fn default() -> Self {
        Self::new("flask", "flask")
    }
}

impl std::fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/deployment/{}[{}]", ns, self.deployment, self.container),
            None => write!(f, "deployment/{}[{}]", self.deployment, self.container),
        }
    }
}
