use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::pipeline::error::ReportError;
use crate::report::report_model::{ReportModel, chart_series, DEFAULT_TITLE};
use crate::results::aggregate::{DetailRecord, SummaryCounts};
use crate::tool::attachments::AttachmentIndex;

/// Run metadata that does not come from the result tree.
#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub title: String,
    pub source_path: PathBuf,
    pub generated_at: DateTime<Utc>,
}

impl RunMetadata {
    pub fn new(title: Option<&str>, source_path: &Path) -> Self {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);
        Self {
            title: title.to_string(),
            source_path: source_path.to_path_buf(),
            generated_at: Utc::now(),
        }
    }

    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }
}

/// Assembles a [`ReportModel`] and applies the consumer flags.
///
/// Detail and screenshot inclusion are decided here and nowhere earlier:
/// without `details(..)` the model carries no detail records, and screenshot
/// refs survive only when screenshots are requested as well.
pub struct ReportModelBuilder {
    summary: SummaryCounts,
    metadata: RunMetadata,
    details: Option<Vec<DetailRecord>>,
    include_screenshots: bool,
    attachments: Option<AttachmentIndex>,
}

impl ReportModelBuilder {
    pub fn new(summary: SummaryCounts, metadata: RunMetadata) -> Self {
        Self {
            summary,
            metadata,
            details: None,
            include_screenshots: false,
            attachments: None,
        }
    }

    pub fn details(mut self, details: Vec<DetailRecord>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn screenshots(mut self, include: bool) -> Self {
        self.include_screenshots = include;
        self
    }

    /// Exported attachment files; these replace the refs found in the result JSON.
    pub fn attachments(mut self, index: Option<AttachmentIndex>) -> Self {
        self.attachments = index;
        self
    }

    pub fn build(self) -> ReportModel {
        let include_screenshots = self.include_screenshots;
        let attachments = self.attachments;
        let screenshot_dir = attachments
            .as_ref()
            .filter(|_| include_screenshots)
            .map(|idx| idx.dir_name.clone());

        let details = self
            .details
            .unwrap_or_default()
            .into_iter()
            .map(|mut record| {
                if !include_screenshots {
                    record.screenshot_refs.clear();
                } else if let Some(refs) =
                    attachments.as_ref().and_then(|idx| idx.refs_for(&record.identifier))
                {
                    record.screenshot_refs = refs;
                }
                record
            })
            .collect();

        ReportModel {
            title: self.metadata.title,
            generated_at: self.metadata.generated_at,
            source_path: self.metadata.source_path.display().to_string(),
            chart_series: chart_series(&self.summary),
            summary: self.summary,
            details,
            screenshot_dir,
        }
    }
}

// ============================================================================
// JSON snapshot
// ============================================================================

/// `out/report.html` -> `out/report.json`; `out/report.json` -> `out/report.snapshot.json`.
pub fn snapshot_path_for(html_path: &Path) -> PathBuf {
    let is_json = html_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        html_path.with_extension("snapshot.json")
    } else {
        html_path.with_extension("json")
    }
}

/// Write the model as pretty JSON next to the HTML report. Returns the snapshot path.
pub fn write_snapshot(model: &ReportModel, html_path: &Path) -> Result<PathBuf, ReportError> {
    let path = snapshot_path_for(html_path);

    let json = serde_json::to_string_pretty(model)
        .map_err(|e| ReportError::write_failed(&path, std::io::Error::other(e)))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::write_failed(&path, e))?;
    }

    std::fs::write(&path, json).map_err(|e| ReportError::write_failed(&path, e))?;
    Ok(path)
}

/// Load a snapshot written by [`write_snapshot`].
pub fn read_snapshot(path: &Path) -> Result<ReportModel, ReportError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ReportError::InvalidInput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|source| ReportError::MalformedJson { source })
}
