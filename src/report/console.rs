use crate::report::report_model::ReportModel;
use crate::results::test_node::TestStatus;

// ============================================================================
// Console reporter: the summary block printed after a run
// ============================================================================

/// Format a report model for terminal output.
///
/// Produces output like:
/// ```text
/// XCTest summary for Tests.xcresult:
///   Passed           : 12
///   Failed           : 1
///   Skipped          : 2
///   Expected failures: 0
///   Total            : 15 (80.0% passed)
///
/// ✗ FAIL  LoginTests › testBadPassword
///     XCTAssertEqual failed: ("401") is not equal to ("200")
/// ```
pub fn format_console_report(model: &ReportModel) -> String {
    let summary = &model.summary;
    let mut out = String::new();

    out.push_str(&format!("XCTest summary for {}:\n", model.source_path));
    out.push_str(&format!("  Passed           : {}\n", summary.passed));
    out.push_str(&format!("  Failed           : {}\n", summary.failed));
    out.push_str(&format!("  Skipped          : {}\n", summary.skipped));
    out.push_str(&format!("  Expected failures: {}\n", summary.expected_failure));
    if summary.unknown > 0 {
        out.push_str(&format!("  Unknown          : {}\n", summary.unknown));
    }
    out.push_str(&format!(
        "  Total            : {} ({:.1}% passed)",
        summary.total,
        summary.pass_rate * 100.0
    ));
    if let Some(secs) = summary.duration {
        out.push_str(&format!(" in {:.1}s", secs));
    }
    out.push('\n');

    if !model.details.is_empty() {
        out.push('\n');
    }

    for record in &model.details {
        let marker = if record.status == TestStatus::Failed {
            "\u{2717} FAIL"
        } else {
            "\u{2298} SKIP"
        };

        let crumb = record.breadcrumb();
        if crumb.is_empty() {
            out.push_str(&format!("{}  {}\n", marker, record.name));
        } else {
            out.push_str(&format!("{}  {} \u{203a} {}\n", marker, crumb, record.name));
        }

        if let Some(ref message) = record.message {
            for line in message.lines() {
                out.push_str(&format!("    {}\n", line));
            }
        }
    }

    out
}
