use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::results::aggregate::{DetailRecord, SummaryCounts};
use crate::results::test_node::TestStatus;

pub const DEFAULT_TITLE: &str = "XCTest Summary";

// ============================================================================
// Report model: the one thing every renderer consumes
// ============================================================================

/// Normalized result of one pipeline run.
///
/// Built once, written as a JSON snapshot next to the HTML report and handed
/// to a single renderer. `details` is empty when detail inclusion was not
/// requested; `chart_series` always lists Passed, Failed, Skipped,
/// ExpectedFailure in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportModel {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub source_path: String,
    pub summary: SummaryCounts,
    #[serde(default)]
    pub details: Vec<DetailRecord>,
    pub chart_series: Vec<ChartPoint>,
    /// Directory of exported screenshot files, relative to the HTML report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub status: TestStatus,
    pub count: usize,
}

impl ReportModel {
    /// Whether the run had no failed cases.
    pub fn all_passed(&self) -> bool {
        self.summary.all_passed()
    }

    /// File name of the source bundle, for footers.
    pub fn source_name(&self) -> &str {
        self.source_path
            .trim_end_matches(['/', '\\'])
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.source_path)
    }

    pub fn has_screenshots(&self) -> bool {
        self.details.iter().any(|d| !d.screenshot_refs.is_empty())
    }

    /// Whether `reference` names an exported file under [`Self::screenshot_dir`].
    ///
    /// Refs copied from the result JSON (attachment names, payload ids) are
    /// not files next to the report and resolve to `false`.
    pub fn resolves_screenshot(&self, reference: &str) -> bool {
        self.screenshot_dir
            .as_deref()
            .filter(|dir| !dir.is_empty())
            .and_then(|dir| reference.strip_prefix(dir))
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|file| !file.is_empty() && !file.contains(".."))
    }
}

/// Chart series in the fixed status order used for coloring.
pub fn chart_series(summary: &SummaryCounts) -> Vec<ChartPoint> {
    TestStatus::CHARTED
        .iter()
        .map(|&status| ChartPoint {
            status,
            count: summary.count_for(status),
        })
        .collect()
}
