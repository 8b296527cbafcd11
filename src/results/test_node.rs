use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Plan,
    Suite,
    Case,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    ExpectedFailure,
    Unknown,
}

impl TestStatus {
    /// Fixed chart ordering. `Unknown` is never charted.
    pub const CHARTED: [TestStatus; 4] = [
        TestStatus::Passed,
        TestStatus::Failed,
        TestStatus::Skipped,
        TestStatus::ExpectedFailure,
    ];

    /// Map a status string from the extraction tool. Unrecognized values are `Unknown`.
    pub fn from_source(raw: &str) -> Self {
        let folded: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match folded.as_str() {
            "passed" | "success" | "succeeded" => TestStatus::Passed,
            "failed" | "failure" => TestStatus::Failed,
            "skipped" => TestStatus::Skipped,
            "expectedfailure" => TestStatus::ExpectedFailure,
            _ => TestStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::Passed => "Passed",
            TestStatus::Failed => "Failed",
            TestStatus::Skipped => "Skipped",
            TestStatus::ExpectedFailure => "Expected Failure",
            TestStatus::Unknown => "Unknown",
        }
    }
}

/// Normalized node of a test-result tree.
///
/// Only `Case` nodes carry failure messages, skip reasons and attachments;
/// `Plan`/`Suite` statuses are derived from their children.
#[derive(Debug, Clone, PartialEq)]
pub struct TestNode {
    pub identifier: String,
    pub name: String,
    pub kind: NodeKind,
    pub status: TestStatus,

    /// Seconds, when the tool reported one
    pub duration: Option<f64>,

    /// Empty unless `status == Failed`
    pub failure_messages: Vec<String>,

    /// Only set on skipped cases
    pub skip_reason: Option<String>,

    /// Opaque attachment references, in source order
    pub attachments: Vec<String>,

    /// Empty for `Case` nodes
    pub children: Vec<TestNode>,
}

impl TestNode {
    pub fn case(identifier: &str, name: &str, status: TestStatus) -> Self {
        Self {
            identifier: identifier.to_string(),
            name: name.to_string(),
            kind: NodeKind::Case,
            status,
            duration: None,
            failure_messages: Vec::new(),
            skip_reason: None,
            attachments: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Build a structural node; its status is derived from `children` immediately.
    pub fn group(kind: NodeKind, identifier: &str, name: &str, children: Vec<TestNode>) -> Self {
        let mut node = Self {
            identifier: identifier.to_string(),
            name: name.to_string(),
            kind,
            status: TestStatus::Unknown,
            duration: None,
            failure_messages: Vec::new(),
            skip_reason: None,
            attachments: Vec::new(),
            children,
        };
        node.status = derive_group_status(&node.children);
        node
    }

    pub fn is_case(&self) -> bool {
        self.kind == NodeKind::Case
    }

    /// Number of `Case` nodes in this subtree (self included).
    pub fn case_count(&self) -> usize {
        if self.is_case() {
            1
        } else {
            self.children.iter().map(TestNode::case_count).sum()
        }
    }

    /// Recompute every Plan/Suite status bottom-up. Idempotent.
    pub fn recompute_status(&mut self) -> TestStatus {
        if !self.is_case() {
            for child in &mut self.children {
                child.recompute_status();
            }
            self.status = derive_group_status(&self.children);
        }
        self.status
    }
}

/// Status of a Plan/Suite given its already-derived children.
///
/// Priority: any Failed => Failed; any Skipped with no Passed/Failed => Skipped;
/// otherwise Passed. A group without children is Skipped.
pub fn derive_group_status(children: &[TestNode]) -> TestStatus {
    if children.is_empty() {
        return TestStatus::Skipped;
    }

    let has = |status: TestStatus| children.iter().any(|c| c.status == status);

    if has(TestStatus::Failed) {
        TestStatus::Failed
    } else if has(TestStatus::Skipped) && !has(TestStatus::Passed) {
        TestStatus::Skipped
    } else {
        TestStatus::Passed
    }
}
