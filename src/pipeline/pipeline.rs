use std::path::PathBuf;

use crate::pipeline::error::ReportError;
use crate::report::builder::{ReportModelBuilder, RunMetadata, write_snapshot};
use crate::report::report_model::ReportModel;
use crate::results::aggregate::aggregate;
use crate::results::parser::parse_result_tree;
use crate::tool::attachments::export_attachments;
use crate::tool::invoker::{ToolInvoker, extract};
use crate::trace::logger::{LogSink, log_event};
use crate::trace::trace::PipelineEvent;

/// Everything one report run needs. GUI, CLI and server callers all build one of these.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub bundle: PathBuf,
    /// Primary HTML output; the snapshot and screenshot folder are derived from it
    pub html_output: PathBuf,
    pub title: Option<String>,
    pub include_details: bool,
    pub include_screenshots: bool,
}

impl ReportRequest {
    pub fn new(bundle: impl Into<PathBuf>, html_output: impl Into<PathBuf>) -> Self {
        Self {
            bundle: bundle.into(),
            html_output: html_output.into(),
            title: None,
            include_details: false,
            include_screenshots: false,
        }
    }

    pub fn with_title(mut self, title: impl ToString) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_details(mut self, include: bool) -> Self {
        self.include_details = include;
        self
    }

    pub fn with_screenshots(mut self, include: bool) -> Self {
        self.include_screenshots = include;
        self
    }

    /// Screenshots only make sense inside the detail list.
    pub fn wants_screenshots(&self) -> bool {
        self.include_details && self.include_screenshots
    }
}

/// A built model plus the outcome of writing its JSON snapshot.
///
/// A snapshot failure does not invalidate the model.
#[derive(Debug)]
pub struct ReportOutcome {
    pub model: ReportModel,
    pub snapshot: Result<PathBuf, ReportError>,
}

/// bundle -> extraction tool -> tree -> counts/details -> report model (+ snapshot).
///
/// Either a complete model comes back or the whole run fails; nothing is retried.
pub fn generate_report(
    invoker: &dyn ToolInvoker,
    log: &dyn LogSink,
    request: &ReportRequest,
) -> Result<ReportOutcome, ReportError> {
    let raw = extract(invoker, log, &request.bundle, request.include_details)?;

    let tree = parse_result_tree(&raw.stdout).inspect_err(|e| {
        log_event(log, &PipelineEvent::failed("parse", e));
    })?;
    log_event(
        log,
        &PipelineEvent::ok("parse").with_message(format!(
            "root '{}' ({} cases)",
            tree.name,
            tree.case_count()
        )),
    );

    let (summary, details) = aggregate(&tree, &request.bundle).inspect_err(|e| {
        log_event(log, &PipelineEvent::failed("aggregate", e));
    })?;
    log_event(
        log,
        &PipelineEvent::ok("aggregate").with_message(format!(
            "passed={} failed={} skipped={} expected_failure={} unknown={} total={}",
            summary.passed,
            summary.failed,
            summary.skipped,
            summary.expected_failure,
            summary.unknown,
            summary.total
        )),
    );

    let metadata = RunMetadata::new(request.title.as_deref(), &request.bundle);
    let mut builder = ReportModelBuilder::new(summary, metadata);

    if request.include_details {
        let has_details = !details.is_empty();
        builder = builder.details(details);

        if request.wants_screenshots() {
            let index = if has_details {
                export_attachments(invoker, log, &request.bundle, &request.html_output)
            } else {
                None
            };
            builder = builder.screenshots(true).attachments(index);
        }
    }

    let model = builder.build();

    let snapshot = write_snapshot(&model, &request.html_output);
    match &snapshot {
        Ok(path) => log_event(
            log,
            &PipelineEvent::ok("snapshot").with_message(path.display()),
        ),
        Err(e) => log_event(log, &PipelineEvent::failed("snapshot", e)),
    }

    Ok(ReportOutcome { model, snapshot })
}
