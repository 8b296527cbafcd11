use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::pipeline::error::ReportError;
use crate::tool::invoker::ToolInvoker;
use crate::trace::logger::{LogSink, log_event};
use crate::trace::trace::PipelineEvent;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Exported attachment files keyed by test identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentIndex {
    /// Directory the files live in, relative to the HTML report
    pub dir_name: String,
    pub by_test: BTreeMap<String, Vec<String>>,
}

impl AttachmentIndex {
    /// Refs for a test, as `<dir>/<file>`. Falls back to matching the last `/` component.
    pub fn refs_for(&self, identifier: &str) -> Option<Vec<String>> {
        let files = self.by_test.get(identifier).or_else(|| {
            let tail = last_component(identifier);
            self.by_test
                .iter()
                .find(|(key, _)| !tail.is_empty() && last_component(key) == tail)
                .map(|(_, files)| files)
        })?;

        Some(
            files
                .iter()
                .map(|f| format!("{}/{}", self.dir_name, f))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.by_test.is_empty()
    }
}

fn last_component(identifier: &str) -> &str {
    identifier
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(identifier)
}

/// `report.html` -> `report_screenshots`, next to the report.
pub fn screenshot_dir_for(html_path: &Path) -> PathBuf {
    let stem = html_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".into());
    html_path.with_file_name(format!("{}_screenshots", stem))
}

/// Parse an attachment export manifest.
///
/// Accepts a top-level array of entries, or an object holding them under
/// `testAttachmentDetails`, `testAttachmentDetailsList` or `attachments`.
pub fn parse_manifest(raw: &str) -> Result<BTreeMap<String, Vec<String>>, ReportError> {
    let manifest: Value =
        serde_json::from_str(raw).map_err(|source| ReportError::MalformedJson { source })?;

    let entries: &[Value] = match &manifest {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => ["testAttachmentDetails", "testAttachmentDetailsList", "attachments"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    };

    let mut by_test: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            continue;
        };

        let id = obj.get("testIdentifier").and_then(Value::as_str);
        let url = obj.get("testIdentifierURL").and_then(Value::as_str);
        let Some(key) = id.or(url).filter(|k| !k.is_empty()) else {
            continue;
        };

        let files: Vec<String> = obj
            .get("attachments")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|a| a.get("exportedFileName").and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        if files.is_empty() {
            continue;
        }

        if let Some(url) = url.filter(|u| *u != key) {
            by_test.entry(url.to_string()).or_default().extend(files.iter().cloned());
        }
        by_test.entry(key.to_string()).or_default().extend(files);
    }

    Ok(by_test)
}

/// Export attachments next to `html_path` and index them.
///
/// Best effort: any failure is logged and yields `None`.
pub fn export_attachments(
    invoker: &dyn ToolInvoker,
    log: &dyn LogSink,
    bundle: &Path,
    html_path: &Path,
) -> Option<AttachmentIndex> {
    let dir = screenshot_dir_for(html_path);
    let dir_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if let Err(e) = std::fs::create_dir_all(&dir) {
        log_event(log, &PipelineEvent::failed("attachments", format!("{}: {}", dir.display(), e)));
        return None;
    }

    match invoker.export_attachments(bundle, &dir) {
        Ok(raw) if raw.success() => {}
        Ok(raw) => {
            log_event(
                log,
                &PipelineEvent::failed(
                    "attachments",
                    format!("`{}` exited with {:?}: {}", raw.command, raw.exit_code, raw.stderr.trim()),
                ),
            );
            return None;
        }
        Err(e) => {
            log_event(log, &PipelineEvent::failed("attachments", e));
            return None;
        }
    }

    let manifest_path = dir.join(MANIFEST_FILE);
    let raw = match std::fs::read_to_string(&manifest_path) {
        Ok(raw) => raw,
        Err(e) => {
            log_event(
                log,
                &PipelineEvent::failed("attachments", format!("no manifest at {}: {}", manifest_path.display(), e)),
            );
            return None;
        }
    };

    match parse_manifest(&raw) {
        Ok(by_test) => {
            log_event(
                log,
                &PipelineEvent::ok("attachments")
                    .with_message(format!("{} test(s) with attachments", by_test.len())),
            );
            Some(AttachmentIndex { dir_name, by_test })
        }
        Err(e) => {
            log_event(log, &PipelineEvent::failed("attachments", e));
            None
        }
    }
}
