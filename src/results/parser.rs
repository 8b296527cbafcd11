use serde_json::{Map, Value};
use sha1::{Digest, Sha1};

use crate::pipeline::error::ReportError;
use crate::results::test_node::{NodeKind, TestNode, TestStatus, derive_group_status};

// ============================================================================
// Field spellings accepted across xcresulttool schema versions
// ============================================================================

const KIND_KEYS: &[&str] = &["kind", "nodeType"];
const NAME_KEYS: &[&str] = &["name"];
const STATUS_KEYS: &[&str] = &["status", "result"];
const IDENTIFIER_KEYS: &[&str] = &[
    "identifier",
    "nodeIdentifier",
    "testIdentifier",
    "testIdentifierURL",
];
const DURATION_KEYS: &[&str] = &["durationInSeconds", "duration"];
const CHILDREN_KEYS: &[&str] = &["children", "subtests"];
const SKIP_REASON_KEYS: &[&str] = &["skipReason", "skipMessage"];
const ATTACHMENT_REF_KEYS: &[&str] = &["exportedFileName", "payloadId", "uuid", "name"];

const ENVELOPE_NODES_KEY: &str = "testNodes";
const ENVELOPE_TITLE_KEYS: &[&str] = &["title", "name"];
const DEFAULT_ROOT_NAME: &str = "Test Results";

/// What a source `kind` string denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Node(NodeKind),
    FailureMessage,
    Attachment,
    /// Configurations, devices, repetitions, arguments: their children belong to the enclosing group
    Wrapper,
    /// Source references, warnings, expressions, ...
    OtherMetadata,
    Unrecognized,
}

fn classify_kind(raw: &str) -> SourceKind {
    match raw.trim().to_lowercase().as_str() {
        "plan" | "test plan" => SourceKind::Node(NodeKind::Plan),
        "suite" | "test suite" | "unit test bundle" | "ui test bundle" | "test bundle"
        | "bundle" | "target" => SourceKind::Node(NodeKind::Suite),
        "case" | "test case" | "test" => SourceKind::Node(NodeKind::Case),
        "failure message" => SourceKind::FailureMessage,
        "attachment" => SourceKind::Attachment,
        "test plan configuration" | "configuration" | "device" | "repetition"
        | "test case run" | "arguments" => SourceKind::Wrapper,
        "source code reference" | "runtime warning" | "expression" | "test value" => {
            SourceKind::OtherMetadata
        }
        _ => SourceKind::Unrecognized,
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Parse extraction-tool JSON into a normalized test tree.
///
/// Unknown fields are ignored and optional fields fall back to defaults
/// (status `Unknown`, no duration, no messages). Missing `kind`/`name` on any
/// structural node, or an unrecognized kind where a Plan/Suite/Case is
/// expected, is `MalformedResult`. Plan/Suite statuses are always recomputed
/// from their children, never taken from the source.
pub fn parse_result_tree(raw: &str) -> Result<TestNode, ReportError> {
    let document: Value =
        serde_json::from_str(raw).map_err(|source| ReportError::MalformedJson { source })?;

    let top = document
        .as_object()
        .ok_or_else(|| ReportError::MalformedResult("top-level value is not an object".into()))?;

    if text_field(top, KIND_KEYS).is_some() {
        return parse_node(&document, &[]);
    }

    match top.get(ENVELOPE_NODES_KEY) {
        Some(Value::Array(nodes)) => parse_envelope(top, nodes),
        Some(_) => Err(ReportError::MalformedResult(format!(
            "'{}' is not an array",
            ENVELOPE_NODES_KEY
        ))),
        None => Err(ReportError::MalformedResult(
            "top-level object has neither a node kind nor a test node list".into(),
        )),
    }
}

/// `{"testNodes": [...]}` wrapper: one node becomes the root, several share a synthetic plan.
fn parse_envelope(top: &Map<String, Value>, nodes: &[Value]) -> Result<TestNode, ReportError> {
    if let [single] = nodes {
        return parse_node(single, &[]);
    }

    let root_name = text_field(top, ENVELOPE_TITLE_KEYS).unwrap_or_else(|| DEFAULT_ROOT_NAME.into());
    let ancestors = vec![root_name.clone()];

    let mut children = Vec::with_capacity(nodes.len());
    parse_children(nodes, &ancestors, &mut children)?;

    Ok(TestNode::group(
        NodeKind::Plan,
        &fingerprint(&ancestors),
        &root_name,
        children,
    ))
}

// ============================================================================
// Recursive descent
// ============================================================================

/// Parse a node that must be structural (Plan/Suite/Case).
fn parse_node(value: &Value, ancestors: &[String]) -> Result<TestNode, ReportError> {
    let obj = as_node_object(value, ancestors)?;
    let name = required_name(obj, ancestors)?;

    match classify_kind(&required_kind(obj, &name, ancestors)?) {
        SourceKind::Node(kind) => Ok(build_node(obj, kind, name, ancestors)?),
        _ => Err(unrecognized_kind(obj, &name, ancestors)),
    }
}

/// Parse the children of a Plan/Suite into `out`.
///
/// Wrapper kinds are transparent: their children are parsed into the same
/// group. Leaf metadata is dropped.
fn parse_children(
    values: &[Value],
    ancestors: &[String],
    out: &mut Vec<TestNode>,
) -> Result<(), ReportError> {
    for value in values {
        let obj = as_node_object(value, ancestors)?;

        // Metadata may come without a name; check the kind first.
        let kind_raw = match text_field(obj, KIND_KEYS) {
            Some(kind) => kind,
            None => {
                let name = required_name(obj, ancestors)?;
                return Err(missing_field("kind", &name, ancestors));
            }
        };

        match classify_kind(&kind_raw) {
            SourceKind::Node(kind) => {
                let name = required_name(obj, ancestors)?;
                out.push(build_node(obj, kind, name, ancestors)?);
            }
            SourceKind::Wrapper => parse_children(children_of(obj), ancestors, out)?,
            SourceKind::FailureMessage | SourceKind::Attachment | SourceKind::OtherMetadata => {}
            SourceKind::Unrecognized => {
                let name = text_field(obj, NAME_KEYS).unwrap_or_default();
                return Err(unrecognized_kind(obj, &name, ancestors));
            }
        }
    }

    Ok(())
}

fn build_node(
    obj: &Map<String, Value>,
    kind: NodeKind,
    name: String,
    ancestors: &[String],
) -> Result<TestNode, ReportError> {
    let mut path = ancestors.to_vec();
    path.push(name.clone());

    let identifier = text_field(obj, IDENTIFIER_KEYS).unwrap_or_else(|| fingerprint(&path));
    let duration = duration_field(obj);

    if kind == NodeKind::Case {
        let mut node = build_case(obj, &identifier, &name);
        node.duration = duration;
        return Ok(node);
    }

    let mut children = Vec::new();
    parse_children(children_of(obj), &path, &mut children)?;

    let status = derive_group_status(&children);
    Ok(TestNode {
        identifier,
        name,
        kind,
        status,
        duration,
        failure_messages: Vec::new(),
        skip_reason: None,
        attachments: Vec::new(),
        children,
    })
}

fn build_case(obj: &Map<String, Value>, identifier: &str, name: &str) -> TestNode {
    let status = text_field(obj, STATUS_KEYS)
        .map(|s| TestStatus::from_source(&s))
        .unwrap_or(TestStatus::Unknown);

    let mut messages = string_array(obj.get("failureMessages"));
    let mut attachments = attachment_refs(obj.get("attachments"));
    collect_case_metadata(children_of(obj), &mut messages, &mut attachments);

    let mut node = TestNode::case(identifier, name, status);
    node.attachments = attachments;

    match status {
        TestStatus::Failed => node.failure_messages = messages,
        TestStatus::Skipped => {
            node.skip_reason = text_field(obj, SKIP_REASON_KEYS).or_else(|| messages.into_iter().next());
        }
        _ => {}
    }

    node
}

/// Fold the metadata below a case (messages, attachments, repetitions) into flat lists.
fn collect_case_metadata(
    children: &[Value],
    messages: &mut Vec<String>,
    attachments: &mut Vec<String>,
) {
    for child in children {
        let Some(obj) = child.as_object() else {
            continue;
        };

        let kind = text_field(obj, KIND_KEYS)
            .map(|k| classify_kind(&k))
            .unwrap_or(SourceKind::OtherMetadata);

        match kind {
            SourceKind::FailureMessage => {
                if let Some(text) = text_field(obj, NAME_KEYS).filter(|t| !t.trim().is_empty()) {
                    messages.push(text);
                }
            }
            SourceKind::Attachment => {
                if let Some(reference) = text_field(obj, ATTACHMENT_REF_KEYS) {
                    attachments.push(reference);
                }
            }
            _ => {}
        }

        collect_case_metadata(children_of(obj), messages, attachments);
    }
}

// ============================================================================
// Field helpers
// ============================================================================

fn children_of(obj: &Map<String, Value>) -> &[Value] {
    CHILDREN_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Legacy output wraps scalars as `{"_type": ..., "_value": ...}`.
fn unwrap_value(value: &Value) -> &Value {
    match value {
        Value::Object(obj) => obj.get("_value").map(unwrap_value).unwrap_or(value),
        other => other,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match unwrap_value(value) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First key whose value is a usable scalar.
fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| obj.get(*key).and_then(scalar_text))
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    match value.map(unwrap_value) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn attachment_refs(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value.map(unwrap_value) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match unwrap_value(item) {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => text_field(obj, ATTACHMENT_REF_KEYS),
            _ => None,
        })
        .collect()
}

fn duration_field(obj: &Map<String, Value>) -> Option<f64> {
    DURATION_KEYS.iter().find_map(|key| {
        match obj.get(*key).map(unwrap_value)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_duration_text(s),
            _ => None,
        }
    })
}

/// Parse tool-formatted durations: `"0.52s"`, `"2m 3s"`, `"450ms"`, `"1h 2m"`, `"1,5s"`, `"3.2"`.
pub fn parse_duration_text(text: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut seen = false;

    for token in text.split_whitespace() {
        let token = token.replace(',', ".");
        let (number, scale) = if let Some(n) = token.strip_suffix("ms") {
            (n, 0.001)
        } else if let Some(n) = token.strip_suffix('s') {
            (n, 1.0)
        } else if let Some(n) = token.strip_suffix('m') {
            (n, 60.0)
        } else if let Some(n) = token.strip_suffix('h') {
            (n, 3600.0)
        } else {
            (token.as_str(), 1.0)
        };

        let value: f64 = number.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        total += value * scale;
        seen = true;
    }

    seen.then_some(total)
}

/// Stable identifier for nodes the tool did not identify: sha1 of the name path.
pub fn fingerprint(path: &[String]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(path.join("/").as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Errors
// ============================================================================

fn as_node_object<'a>(
    value: &'a Value,
    ancestors: &[String],
) -> Result<&'a Map<String, Value>, ReportError> {
    value.as_object().ok_or_else(|| {
        ReportError::MalformedResult(format!(
            "expected a test node object under '{}'",
            display_path(ancestors)
        ))
    })
}

fn required_name(obj: &Map<String, Value>, ancestors: &[String]) -> Result<String, ReportError> {
    text_field(obj, NAME_KEYS).ok_or_else(|| {
        ReportError::MalformedResult(format!(
            "test node under '{}' has no name",
            display_path(ancestors)
        ))
    })
}

fn required_kind(
    obj: &Map<String, Value>,
    name: &str,
    ancestors: &[String],
) -> Result<String, ReportError> {
    text_field(obj, KIND_KEYS).ok_or_else(|| missing_field("kind", name, ancestors))
}

fn missing_field(field: &str, name: &str, ancestors: &[String]) -> ReportError {
    ReportError::MalformedResult(format!(
        "test node '{}' under '{}' has no {}",
        name,
        display_path(ancestors),
        field
    ))
}

fn unrecognized_kind(obj: &Map<String, Value>, name: &str, ancestors: &[String]) -> ReportError {
    let kind = text_field(obj, KIND_KEYS).unwrap_or_default();
    ReportError::MalformedResult(format!(
        "test node '{}' under '{}' has unrecognized kind '{}'",
        name,
        display_path(ancestors),
        kind
    ))
}

fn display_path(ancestors: &[String]) -> String {
    if ancestors.is_empty() {
        "<root>".to_string()
    } else {
        ancestors.join(" > ")
    }
}
