//! Source repository metadata

use serde::{Deserialize, Serialize};

/// Descriptive metadata about the source repository that triggers runs
///
/// Purely informational; nothing in a run depends on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub repository_name: Option<String>,
    pub repository_id: Option<String>,
    pub clone_url_http: Option<String>,
    pub clone_url_ssh: Option<String>,
}
