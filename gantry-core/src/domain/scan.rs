//! Scan verdict domain type

use serde::{Deserialize, Serialize};

/// Outcome of scanning one built image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanVerdict {
    pub passed: bool,
    /// Free-text report as produced by the scanner (possibly empty)
    pub report: String,
}

impl ScanVerdict {
    pub fn pass(report: impl Into<String>) -> Self {
        Self {
            passed: true,
            report: report.into(),
        }
    }

    pub fn fail(report: impl Into<String>) -> Self {
        Self {
            passed: false,
            report: report.into(),
        }
    }
}
