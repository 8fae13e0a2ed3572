//! Scan gate
//!
//! Decides from the free-text scan report whether an image may be pushed.
//! The gate fails closed: only a report that contains the pass phrase
//! (case-insensitively) passes. Scanner errors, empty output and garbled
//! output all fail.

use gantry_core::domain::scan::ScanVerdict;
use std::path::Path;
use tracing::debug;

use crate::config::DEFAULT_PASS_PHRASE;

/// Pass-marker gate over scan reports
#[derive(Debug, Clone)]
pub struct ScanGate {
    pass_phrase: String,
}

impl ScanGate {
    pub fn new(pass_phrase: impl Into<String>) -> Self {
        Self {
            pass_phrase: pass_phrase.into(),
        }
    }

    pub fn pass_phrase(&self) -> &str {
        &self.pass_phrase
    }

    /// Evaluates report text
    pub fn evaluate(&self, report: &str) -> ScanVerdict {
        let phrase = self.pass_phrase.to_lowercase();
        let passed = !phrase.trim().is_empty() && report.to_lowercase().contains(&phrase);

        if passed {
            ScanVerdict::pass(report)
        } else {
            ScanVerdict::fail(report)
        }
    }

    /// Evaluates the report artifact at `path`
    ///
    /// A missing or unreadable artifact is a failed verdict. Invalid UTF-8 is
    /// decoded lossily before matching.
    pub fn evaluate_artifact(&self, path: &Path) -> ScanVerdict {
        match std::fs::read(path) {
            Ok(bytes) => self.evaluate(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                debug!("No readable scan report at {}: {}", path.display(), e);
                ScanVerdict::fail("")
            }
        }
    }
}

impl Default for ScanGate {
    fn default() -> Self {
        Self::new(DEFAULT_PASS_PHRASE)
    }
}
