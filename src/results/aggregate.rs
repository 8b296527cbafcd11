use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pipeline::error::ReportError;
use crate::results::test_node::{TestNode, TestStatus};

// ============================================================================
// Summary counts
// ============================================================================

/// Per-status counts over the Case nodes of one tree.
///
/// `total` is the number of cases and always equals the sum of the
/// per-status fields (including `unknown`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCounts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub expected_failure: usize,
    #[serde(default)]
    pub unknown: usize,
    pub total: usize,

    /// `passed / total`, 0 when there are no cases
    pub pass_rate: f64,

    /// Sum of known case durations in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl SummaryCounts {
    /// Build counts from raw tallies, deriving `total` and `pass_rate`.
    pub fn from_counts(
        passed: usize,
        failed: usize,
        skipped: usize,
        expected_failure: usize,
        unknown: usize,
    ) -> Self {
        let total = passed + failed + skipped + expected_failure + unknown;
        let pass_rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64
        };
        Self {
            passed,
            failed,
            skipped,
            expected_failure,
            unknown,
            total,
            pass_rate,
            duration: None,
        }
    }

    pub fn count_for(&self, status: TestStatus) -> usize {
        match status {
            TestStatus::Passed => self.passed,
            TestStatus::Failed => self.failed,
            TestStatus::Skipped => self.skipped,
            TestStatus::ExpectedFailure => self.expected_failure,
            TestStatus::Unknown => self.unknown,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

// ============================================================================
// Detail records
// ============================================================================

/// One failed or skipped case, flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRecord {
    /// Ancestor names, root first, excluding the case itself
    pub path: Vec<String>,
    pub name: String,
    /// Used to match exported attachments; not part of the snapshot
    #[serde(skip)]
    pub identifier: String,
    pub status: TestStatus,
    pub message: Option<String>,
    #[serde(default)]
    pub screenshot_refs: Vec<String>,
}

impl DetailRecord {
    fn from_case(node: &TestNode, path: &[String]) -> Self {
        let message = match node.status {
            TestStatus::Failed if !node.failure_messages.is_empty() => {
                Some(node.failure_messages.join("\n"))
            }
            TestStatus::Skipped => node.skip_reason.clone(),
            _ => None,
        };

        Self {
            path: path.to_vec(),
            name: node.name.clone(),
            identifier: node.identifier.clone(),
            status: node.status,
            message,
            screenshot_refs: node.attachments.clone(),
        }
    }

    /// Breadcrumb for display, e.g. `Plan › Suite`.
    pub fn breadcrumb(&self) -> String {
        self.path.join(" \u{203a} ")
    }
}

// ============================================================================
// Aggregation
// ============================================================================

#[derive(Default)]
struct Tally {
    passed: usize,
    failed: usize,
    skipped: usize,
    expected_failure: usize,
    unknown: usize,
    duration: Option<f64>,
}

/// Count cases and flatten failed/skipped cases, in one pre-order pass.
///
/// Only Case nodes are counted. Details keep document order.
/// Fails with `EmptyTree` when there are no cases at all.
pub fn aggregate(
    root: &TestNode,
    source_path: &Path,
) -> Result<(SummaryCounts, Vec<DetailRecord>), ReportError> {
    let mut tally = Tally::default();
    let mut details = Vec::new();
    let mut path = Vec::new();

    walk(root, &mut path, &mut tally, &mut details);

    let mut summary = SummaryCounts::from_counts(
        tally.passed,
        tally.failed,
        tally.skipped,
        tally.expected_failure,
        tally.unknown,
    );

    if summary.total == 0 {
        return Err(ReportError::EmptyTree {
            source_path: source_path.to_path_buf(),
        });
    }

    summary.duration = tally.duration;
    Ok((summary, details))
}

fn walk(node: &TestNode, path: &mut Vec<String>, tally: &mut Tally, details: &mut Vec<DetailRecord>) {
    if node.is_case() {
        match node.status {
            TestStatus::Passed => tally.passed += 1,
            TestStatus::Failed => tally.failed += 1,
            TestStatus::Skipped => tally.skipped += 1,
            TestStatus::ExpectedFailure => tally.expected_failure += 1,
            TestStatus::Unknown => tally.unknown += 1,
        }

        if let Some(d) = node.duration {
            tally.duration = Some(tally.duration.unwrap_or(0.0) + d);
        }

        if matches!(node.status, TestStatus::Failed | TestStatus::Skipped) {
            details.push(DetailRecord::from_case(node, path));
        }
        return;
    }

    path.push(node.name.clone());
    for child in &node.children {
        walk(child, path, tally, details);
    }
    path.pop();
}
