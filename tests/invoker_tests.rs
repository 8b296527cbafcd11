use std::path::Path;
use std::time::{Duration, Instant};

use xcresult_report::pipeline::error::{ErrorKind, ReportError};
use xcresult_report::tool::invoker::{
    RawInvocationResult, ToolInvoker, ToolSettings, XcresultTool, extract, format_command, run_with_timeout,
};
use xcresult_report::trace::logger::MemoryLogSink;

use crate::common::fake_invoker::{FakeInvoker, fake_bundle};

mod common;

fn sh(script: &str, timeout: Duration) -> XcresultTool {
    XcresultTool::new(ToolSettings {
        program: "/bin/sh".into(),
        args: vec!["-c".into(), script.into(), "sh".into(), "{bundle}".into()],
        detail_args: vec!["--detail".into()],
        attachment_args: Vec::new(),
        timeout,
    })
}

fn parse_line(line: &str) -> serde_json::Value {
    serde_json::from_str(line).unwrap()
}

// ============================================================================
// 1. Settings and command lines
// ============================================================================

#[test]
fn default_settings_call_xcresulttool() {
    let settings = ToolSettings::default();
    assert_eq!(settings.program, "xcrun");
    assert_eq!(&settings.args[..4], &["xcresulttool", "get", "test-results", "tests"]);
    assert!(settings.args.contains(&"{bundle}".to_string()));
    assert!(settings.attachment_args.contains(&"{output}".to_string()));
    assert_eq!(settings.timeout, Duration::from_secs(300));
}

#[test]
fn command_line_substitutes_bundle() {
    let tool = XcresultTool::new(ToolSettings::default());
    let line = tool.command_line(Path::new("/tmp/Run.xcresult"), false);
    assert_eq!(
        line,
        "xcrun xcresulttool get test-results tests --path /tmp/Run.xcresult --compact"
    );
}

#[test]
fn detail_args_only_when_requested() {
    let tool = sh("true", Duration::from_secs(5));
    assert!(!tool.command_line(Path::new("/b"), false).contains("--detail"));
    assert!(tool.command_line(Path::new("/b"), true).ends_with("--detail"));
}

#[test]
fn default_detail_levels_share_the_tree_command() {
    let tool = XcresultTool::new(ToolSettings::default());
    let bundle = Path::new("/tmp/Run.xcresult");

    assert!(tool.settings().detail_args.is_empty());
    assert_eq!(tool.command_line(bundle, true), tool.command_line(bundle, false));
    assert!(tool.command_line(bundle, false).contains("test-results tests"));
}

#[test]
fn format_command_joins_with_spaces() {
    assert_eq!(
        format_command("xcrun", &["a".to_string(), "b c".to_string()]),
        "xcrun a b c"
    );
}

struct ExtractOnly;

impl ToolInvoker for ExtractOnly {
    fn command_line(&self, bundle: &Path, _want_detail: bool) -> String {
        format!("extract-only {}", bundle.display())
    }

    fn invoke(&self, _bundle: &Path, _want_detail: bool) -> Result<RawInvocationResult, ReportError> {
        unreachable!("not called")
    }
}

#[test]
fn invoker_without_export_support_fails_export() {
    let err = ExtractOnly
        .export_attachments(Path::new("/b"), Path::new("/o"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
    assert!(err.to_string().contains("not supported"));
}

// ============================================================================
// 2. Child process handling
// ============================================================================

#[cfg(unix)]
#[test]
fn captures_stdout_and_stderr() {
    let raw = run_with_timeout(
        "/bin/sh",
        &["-c".into(), "echo out; echo err >&2; exit 3".into()],
        Duration::from_secs(10),
    )
    .unwrap();

    assert_eq!(raw.exit_code, Some(3));
    assert_eq!(raw.stdout.trim(), "out");
    assert_eq!(raw.stderr.trim(), "err");
    assert!(!raw.success());
}

#[cfg(unix)]
#[test]
fn slow_tool_is_killed_at_timeout() {
    let started = Instant::now();
    let err = run_with_timeout(
        "/bin/sh",
        &["-c".into(), "sleep 5".into()],
        Duration::from_millis(200),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[test]
fn missing_program_is_spawn_failure() {
    let err = run_with_timeout("/no/such/xcrun", &[], Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, ReportError::SpawnFailed { .. }));
    assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
}

// ============================================================================
// 3. Classified extraction
// ============================================================================

#[test]
fn missing_bundle_never_spawns() {
    let invoker = FakeInvoker::returning("{}");
    let log = MemoryLogSink::new();

    let err = extract(&invoker, &log, Path::new("/no/such/Tests.xcresult"), false).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(invoker.calls.get(), 0);
    let lines = log.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(parse_line(&lines[0])["outcome"], "invalid_input");
}

#[test]
fn non_zero_exit_is_extraction_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let bundle = fake_bundle(tmp.path());
    let invoker = FakeInvoker::failing(1, "xcresulttool: bundle not found");
    let log = MemoryLogSink::new();

    let err = extract(&invoker, &log, &bundle, false).unwrap_err();

    match err {
        ReportError::ExtractionFailed { exit_code, ref stderr, .. } => {
            assert_eq!(exit_code, Some(1));
            assert!(stderr.contains("bundle not found"));
        }
        ref other => panic!("unexpected error: {:?}", other),
    }

    let event = parse_line(&log.lines()[0]);
    assert_eq!(event["event"], "invocation");
    assert_eq!(event["outcome"], "extraction_failed");
    assert_eq!(event["exit_code"], 1);
    assert_eq!(event["stderr"], "xcresulttool: bundle not found");
}

#[test]
fn blank_stdout_is_empty_result() {
    let tmp = tempfile::tempdir().unwrap();
    let bundle = fake_bundle(tmp.path());
    let invoker = FakeInvoker::returning("  \n");
    let log = MemoryLogSink::new();

    let err = extract(&invoker, &log, &bundle, true).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyResult);
    let event = parse_line(&log.lines()[0]);
    assert_eq!(event["outcome"], "empty_result");
    assert_eq!(event["detail"], true);
}

#[test]
fn successful_extraction_logs_one_line() {
    let tmp = tempfile::tempdir().unwrap();
    let bundle = fake_bundle(tmp.path());
    let invoker = FakeInvoker::returning(r#"{"kind":"Case","name":"c"}"#);
    let log = MemoryLogSink::new();

    let raw = extract(&invoker, &log, &bundle, false).unwrap();

    assert!(raw.stdout.contains("Case"));
    assert_eq!(invoker.calls.get(), 1);
    let lines = log.lines();
    assert_eq!(lines.len(), 1);
    let event = parse_line(&lines[0]);
    assert_eq!(event["outcome"], "ok");
    assert_eq!(event["stdout_len"], raw.stdout.len());
    assert!(event["command"].as_str().unwrap().starts_with("fake-xcresulttool"));
}

#[cfg(unix)]
#[test]
fn real_process_reads_bundle_contents() {
    let tmp = tempfile::tempdir().unwrap();
    let bundle = fake_bundle(tmp.path());
    std::fs::write(bundle.join("result.json"), r#"{"kind":"Case","name":"c"}"#).unwrap();
    let tool = sh("cat \"$1/result.json\"", Duration::from_secs(10));
    let log = MemoryLogSink::new();

    let raw = extract(&tool, &log, &bundle, false).unwrap();
    assert_eq!(raw.stdout, r#"{"kind":"Case","name":"c"}"#);
}

#[cfg(unix)]
#[test]
fn real_process_failure_keeps_stderr() {
    let tmp = tempfile::tempdir().unwrap();
    let bundle = fake_bundle(tmp.path());
    let tool = sh(
        "echo 'xcresulttool: bundle not found' >&2; exit 1",
        Duration::from_secs(10),
    );
    let log = MemoryLogSink::new();

    let err = extract(&tool, &log, &bundle, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
    assert!(err.to_string().contains("xcresulttool: bundle not found"));
}

#[cfg(unix)]
#[test]
fn real_process_timeout_is_logged() {
    let tmp = tempfile::tempdir().unwrap();
    let bundle = fake_bundle(tmp.path());
    let tool = sh("sleep 5", Duration::from_millis(200));
    let log = MemoryLogSink::new();

    let err = extract(&tool, &log, &bundle, false).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    let lines = log.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(parse_line(&lines[0])["outcome"], "timeout");
}
