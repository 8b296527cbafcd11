use std::path::Path;

use xcresult_report::pipeline::error::{ErrorKind, ReportError};
use xcresult_report::results::aggregate::{SummaryCounts, aggregate};
use xcresult_report::results::parser::parse_result_tree;
use xcresult_report::results::test_node::{NodeKind, TestNode, TestStatus};

use crate::common::fixtures::{NO_CASES, SIMPLE_PLAN, XCRESULT_TESTS};

mod common;

fn bundle() -> &'static Path {
    Path::new("/tmp/Tests.xcresult")
}

fn failed_case(name: &str, message: &str) -> TestNode {
    let mut node = TestNode::case(name, name, TestStatus::Failed);
    node.failure_messages.push(message.to_string());
    node
}

// ============================================================================
// 1. Counts
// ============================================================================

#[test]
fn simple_plan_counts() {
    let root = parse_result_tree(SIMPLE_PLAN).unwrap();
    let (summary, details) = aggregate(&root, bundle()).unwrap();

    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.expected_failure, 0);
    assert_eq!(summary.total, 2);
    assert!((summary.pass_rate - 0.5).abs() < 1e-9);

    assert_eq!(details.len(), 1);
    assert_eq!(details[0].name, "t2");
    assert_eq!(details[0].path, vec!["Tests".to_string()]);
    assert_eq!(details[0].message.as_deref(), Some("assertion X"));
}

#[test]
fn xcresult_counts_every_status_once() {
    let root = parse_result_tree(XCRESULT_TESTS).unwrap();
    let (summary, _) = aggregate(&root, bundle()).unwrap();

    assert_eq!(summary, {
        let mut expected = SummaryCounts::from_counts(1, 1, 1, 1, 0);
        expected.duration = summary.duration;
        expected
    });
    assert_eq!(summary.total, root.case_count());
    assert!((summary.duration.unwrap() - 1.75).abs() < 1e-9);
}

#[test]
fn total_includes_unknown_cases() {
    let root = TestNode::group(
        NodeKind::Plan,
        "p",
        "P",
        vec![
            TestNode::case("a", "a", TestStatus::Passed),
            TestNode::case("b", "b", TestStatus::Unknown),
            TestNode::case("c", "c", TestStatus::Unknown),
        ],
    );
    let (summary, details) = aggregate(&root, bundle()).unwrap();

    assert_eq!(summary.unknown, 2);
    assert_eq!(summary.total, 3);
    assert_eq!(
        summary.passed + summary.failed + summary.skipped + summary.expected_failure + summary.unknown,
        summary.total
    );
    assert!(details.is_empty());
}

#[test]
fn groups_are_never_counted() {
    let suite = TestNode::group(
        NodeKind::Suite,
        "s",
        "S",
        vec![TestNode::case("a", "a", TestStatus::Passed)],
    );
    let root = TestNode::group(NodeKind::Plan, "p", "P", vec![suite]);
    let (summary, _) = aggregate(&root, bundle()).unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(summary.passed, 1);
}

#[test]
fn lone_case_root_is_counted() {
    let root = TestNode::case("only", "only", TestStatus::Skipped);
    let (summary, details) = aggregate(&root, bundle()).unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(details.len(), 1);
    assert!(details[0].path.is_empty());
}

#[test]
fn duration_absent_when_no_case_reports_one() {
    let root = parse_result_tree(SIMPLE_PLAN).unwrap();
    let (summary, _) = aggregate(&root, bundle()).unwrap();
    assert_eq!(summary.duration, None);
}

#[test]
fn pass_rate_is_zero_without_cases() {
    let summary = SummaryCounts::from_counts(0, 0, 0, 0, 0);
    assert_eq!(summary.total, 0);
    assert_eq!(summary.pass_rate, 0.0);
}

#[test]
fn count_for_matches_fields() {
    let summary = SummaryCounts::from_counts(4, 3, 2, 1, 5);
    assert_eq!(summary.count_for(TestStatus::Passed), 4);
    assert_eq!(summary.count_for(TestStatus::Failed), 3);
    assert_eq!(summary.count_for(TestStatus::Skipped), 2);
    assert_eq!(summary.count_for(TestStatus::ExpectedFailure), 1);
    assert_eq!(summary.count_for(TestStatus::Unknown), 5);
    assert_eq!(summary.total, 15);
    assert!(!summary.all_passed());
}

// ============================================================================
// 2. Detail records
// ============================================================================

#[test]
fn details_keep_pre_order() {
    let inner = TestNode::group(
        NodeKind::Suite,
        "inner",
        "Inner",
        vec![failed_case("b", "second")],
    );
    let root = TestNode::group(
        NodeKind::Plan,
        "p",
        "P",
        vec![
            failed_case("a", "first"),
            inner,
            TestNode::case("c", "c", TestStatus::Skipped),
            failed_case("d", "fourth"),
        ],
    );
    let (_, details) = aggregate(&root, bundle()).unwrap();

    let names: Vec<&str> = details.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
    assert_eq!(details[1].path, vec!["P".to_string(), "Inner".to_string()]);
    assert_eq!(details[1].breadcrumb(), "P \u{203a} Inner");
}

#[test]
fn details_only_hold_failed_and_skipped() {
    let root = parse_result_tree(XCRESULT_TESTS).unwrap();
    let (_, details) = aggregate(&root, bundle()).unwrap();

    assert_eq!(details.len(), 2);
    assert_eq!(details[0].name, "testBadPassword()");
    assert_eq!(details[0].status, TestStatus::Failed);
    assert_eq!(details[0].identifier, "LoginTests/testBadPassword()");
    assert_eq!(details[0].screenshot_refs, vec!["Screenshot_1.png".to_string()]);
    assert_eq!(
        details[0].path,
        vec!["AppTests".to_string(), "AppTests".to_string(), "LoginTests".to_string()]
    );

    assert_eq!(details[1].name, "testBiometric()");
    assert_eq!(details[1].status, TestStatus::Skipped);
    assert_eq!(
        details[1].message.as_deref(),
        Some("Test skipped - Face ID unavailable")
    );
}

#[test]
fn multiple_failure_messages_are_joined() {
    let mut case = failed_case("a", "first");
    case.failure_messages.push("second".into());
    let root = TestNode::group(NodeKind::Plan, "p", "P", vec![case]);
    let (_, details) = aggregate(&root, bundle()).unwrap();

    assert_eq!(details[0].message.as_deref(), Some("first\nsecond"));
}

#[test]
fn failed_case_without_message_has_none() {
    let root = TestNode::group(
        NodeKind::Plan,
        "p",
        "P",
        vec![TestNode::case("a", "a", TestStatus::Failed)],
    );
    let (_, details) = aggregate(&root, bundle()).unwrap();
    assert_eq!(details[0].message, None);
}

// ============================================================================
// 3. Empty trees
// ============================================================================

#[test]
fn tree_without_cases_is_empty_tree() {
    let root = parse_result_tree(NO_CASES).unwrap();
    let err = aggregate(&root, bundle()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyTree);
    match err {
        ReportError::EmptyTree { source_path } => assert_eq!(source_path, bundle()),
        other => panic!("unexpected error: {:?}", other),
    }
}
