//! Image reference domain type

use serde::{Deserialize, Serialize};

use crate::domain::revision::Revision;

/// A (repository, tag) pair naming one built container image
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference {
    /// Registry repository URI (e.g. "123456789.dkr.ecr.us-west-2.amazonaws.com/app")
    pub repository: String,
    /// Image tag, always the revision identifier verbatim
    pub tag: String,
}

impl ImageReference {
    /// Derives the image reference for a revision
    ///
    /// The tag is the revision itself, so distinct revisions always map to
    /// distinct references and re-running a revision reuses its tag.
    pub fn for_revision(repository: impl Into<String>, revision: &Revision) -> Self {
        Self {
            repository: repository.into(),
            tag: revision.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_is_revision() {
        let rev = Revision::parse("abc123").unwrap();
        let image = ImageReference::for_revision("repo", &rev);
        assert_eq!(image.to_string(), "repo:abc123");
    }

    #[test]
    fn test_distinct_revisions_distinct_images() {
        let revisions = ["abc123", "abc1234", "ABC123", "abc.123", "abc-123", "abc_123"];
        let images: std::collections::HashSet<String> = revisions
            .iter()
            .map(|r| ImageReference::for_revision("repo", &Revision::parse(*r).unwrap()).to_string())
            .collect();
        assert_eq!(images.len(), revisions.len());
    }

    #[test]
    fn test_same_revision_same_image() {
        let first = ImageReference::for_revision("repo", &Revision::parse("def456").unwrap());
        let second = ImageReference::for_revision("repo", &Revision::parse("def456").unwrap());
        assert_eq!(first, second);
    }
}
