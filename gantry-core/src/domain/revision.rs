//! Revision domain type

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest identifier accepted as a revision (the image tag length limit)
pub const MAX_REVISION_LEN: usize = 128;

/// Identifier of one source snapshot, usually a commit hash
///
/// A revision is used verbatim as the image tag, so it must already be a
/// legal tag: `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision(String);

/// Reasons a string is rejected as a revision
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevisionError {
    #[error("revision is empty")]
    Empty,

    #[error("revision is {0} characters long (max {MAX_REVISION_LEN})")]
    TooLong(usize),

    #[error("revision must start with a letter, digit or '_', found {0:?}")]
    InvalidStart(char),

    #[error("revision contains invalid character {0:?}")]
    InvalidChar(char),
}

impl Revision {
    /// Parses and validates a revision identifier
    pub fn parse(input: impl Into<String>) -> Result<Self, RevisionError> {
        let input = input.into();
        let len = input.chars().count();

        let first = input.chars().next().ok_or(RevisionError::Empty)?;
        if len > MAX_REVISION_LEN {
            return Err(RevisionError::TooLong(len));
        }
        if !(first.is_ascii_alphanumeric() || first == '_') {
            return Err(RevisionError::InvalidStart(first));
        }
        if let Some(bad) = input
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
        {
            return Err(RevisionError::InvalidChar(bad));
        }

        Ok(Self(input))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form used in log lines (first 12 characters)
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map(|(idx, _)| idx)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Revision {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Revision {
    type Error = RevisionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Revision> for String {
    fn from(revision: Revision) -> Self {
        revision.0
    }
}
