use crate::report::report_model::ReportModel;
use crate::results::test_node::TestStatus;

/// Thumbnails shown per test before collapsing into "+N more".
const MAX_SCREENSHOTS_PER_TEST: usize = 10;

// ============================================================================
// HTML reporter: single-file report with a Chart.js pie
// ============================================================================

/// Generate a self-contained HTML report.
///
/// Features:
/// - KPI grid (total, passed, failed, skipped, expected failures) and pass rate
/// - Pie chart fed from the model's chart series (Chart.js from a CDN)
/// - Optional details table with breadcrumb, status and message
/// - Screenshot thumbnails for exported files; other refs are listed as text
/// - Print stylesheet so browsers can save it as PDF
pub fn generate_html_report(model: &ReportModel) -> String {
    let summary = &model.summary;

    let duration_text = summary
        .duration
        .map(|secs| format!(" in {:.1}s", secs))
        .unwrap_or_default();

    let chart_labels = model
        .chart_series
        .iter()
        .map(|p| format!("'{}'", p.status.label()))
        .collect::<Vec<_>>()
        .join(", ");
    let chart_data = model
        .chart_series
        .iter()
        .map(|p| p.count.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let chart_colors = model
        .chart_series
        .iter()
        .map(|p| format!("'{}'", status_color(p.status)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<meta name="color-scheme" content="dark">
<title>{title}</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Arial, sans-serif; margin: 32px; background: #1a1a1a; color: #e0e0e0; }}
.card {{ border: 1px solid #3a3a3a; border-radius: 12px; padding: 20px; max-width: 860px; box-shadow: 0 4px 12px rgba(0,0,0,0.3); background: #2b2b2b; margin-bottom: 24px; }}
h1, h2 {{ margin: 0 0 8px 0; font-size: 22px; color: #fff; }}
h2 {{ font-size: 18px; margin-top: 4px; }}
.meta {{ color: #9ca3af; margin-bottom: 16px; font-size: 14px; }}
.grid {{ display: grid; grid-template-columns: repeat(5, 1fr); gap: 10px; margin: 16px 0 12px; }}
.kpi {{ border: 1px solid #3a3a3a; border-radius: 10px; padding: 12px; text-align: center; background: #1f1f1f; }}
.kpi .label {{ color: #9ca3af; font-size: 12px; }}
.kpi .value {{ font-size: 20px; margin-top: 6px; color: #fff; }}
.small {{ color: #9ca3af; font-size: 12px; margin-top: 10px; }}
canvas {{ max-width: 520px; margin: auto; }}
table {{ width: 100%; border-collapse: collapse; font-size: 13px; color: #e0e0e0; }}
th {{ text-align: left; border-bottom: 1px solid #404040; padding: 6px; color: #d1d5db; }}
td {{ border-bottom: 1px solid #404040; padding: 4px 6px; vertical-align: top; }}
td.status {{ font-weight: bold; }}
td.message {{ font-size: 12px; color: #9ca3af; white-space: pre-wrap; }}
.crumb {{ color: #9ca3af; font-size: 11px; }}
.shots {{ display: flex; flex-wrap: wrap; gap: 8px; }}
.shots img {{ max-width: 280px; max-height: 200px; border: 1px solid #404040; border-radius: 4px; }}
@media print {{
  body {{ background: #fff !important; color: #111 !important; -webkit-print-color-adjust: exact; print-color-adjust: exact; }}
  .card {{ background: #fff !important; border-color: #333 !important; box-shadow: none !important; }}
  .card * {{ color: #111 !important; }}
  .kpi {{ background: #f5f5f5 !important; border-color: #ccc !important; }}
}}
</style>
</head>
<body>
<div class="card">
<h1>{title}</h1>
<div class="meta">{status_text}: {passed} passed, {failed} failed, {skipped} skipped ({total} total){duration}. Pass rate {pass_rate:.1}%.</div>
<div class="grid">
<div class="kpi"><div class="label">Total</div><div class="value">{total}</div></div>
<div class="kpi"><div class="label">Passed</div><div class="value">{passed}</div></div>
<div class="kpi"><div class="label">Failed</div><div class="value">{failed}</div></div>
<div class="kpi"><div class="label">Skipped</div><div class="value">{skipped}</div></div>
<div class="kpi"><div class="label">Expected failures</div><div class="value">{expected_failure}</div></div>
</div>
<canvas id="pie" width="520" height="320"></canvas>
<div class="small">Source: {source} &middot; Generated {generated_at}</div>
</div>
{details}
<script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
<script>
Chart.defaults.color = '#d1d5db';
Chart.defaults.borderColor = '#404040';
new Chart(document.getElementById('pie'), {{
  type: 'pie',
  data: {{
    labels: [{chart_labels}],
    datasets: [{{ data: [{chart_data}], backgroundColor: [{chart_colors}], borderColor: '#2b2b2b', borderWidth: 2 }}]
  }},
  options: {{ responsive: true, plugins: {{ legend: {{ position: 'bottom' }}, title: {{ display: false }} }} }}
}});
</script>
</body>
</html>"##,
        title = escape_html(&model.title),
        status_text = if model.all_passed() {
            "ALL TESTS PASSED"
        } else {
            "SOME TESTS FAILED"
        },
        passed = summary.passed,
        failed = summary.failed,
        skipped = summary.skipped,
        expected_failure = summary.expected_failure,
        total = summary.total,
        duration = duration_text,
        pass_rate = summary.pass_rate * 100.0,
        source = escape_html(model.source_name()),
        generated_at = model.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        details = details_section(model),
        chart_labels = chart_labels,
        chart_data = chart_data,
        chart_colors = chart_colors,
    )
}

/// Empty string when the model has no detail records.
fn details_section(model: &ReportModel) -> String {
    if model.details.is_empty() {
        return String::new();
    }

    let has_messages = model.details.iter().any(|d| d.message.is_some());
    let columns = if has_messages { 3 } else { 2 };
    let note = if model.has_screenshots() {
        "Failed and skipped tests. Screenshots included below when available."
    } else {
        "Failed and skipped tests."
    };

    let mut rows = String::new();
    for record in &model.details {
        rows.push_str(&format!(
            "<tr>\n<td>{name}<div class=\"crumb\">{crumb}</div></td>\n<td class=\"status\" style=\"color:{color}\">{status}</td>\n",
            name = escape_html(&record.name),
            crumb = escape_html(&record.breadcrumb()),
            color = status_color(record.status),
            status = record.status.label(),
        ));
        if has_messages {
            rows.push_str(&format!(
                "<td class=\"message\">{}</td>\n",
                escape_html(record.message.as_deref().unwrap_or(""))
            ));
        }
        rows.push_str("</tr>\n");

        if record.screenshot_refs.is_empty() {
            continue;
        }

        rows.push_str(&format!(
            "<tr><td colspan=\"{}\"><div class=\"crumb\">Screenshots</div><div class=\"shots\">",
            columns
        ));
        for reference in record.screenshot_refs.iter().take(MAX_SCREENSHOTS_PER_TEST) {
            let escaped = escape_html(reference);
            if model.resolves_screenshot(reference) {
                rows.push_str(&format!("<img src=\"{0}\" alt=\"{0}\">", escaped));
            } else {
                // Not exported; show the attachment name instead of a broken image.
                rows.push_str(&format!("<code class=\"crumb\">{}</code>", escaped));
            }
        }
        if record.screenshot_refs.len() > MAX_SCREENSHOTS_PER_TEST {
            rows.push_str(&format!(
                "<span class=\"crumb\">+{} more</span>",
                record.screenshot_refs.len() - MAX_SCREENSHOTS_PER_TEST
            ));
        }
        rows.push_str("</div></td></tr>\n");
    }

    format!(
        "<div class=\"card\">\n<h2>Test details</h2>\n<p class=\"meta\">{note}</p>\n<table>\n<thead><tr><th>Test</th><th>Status</th>{message_header}</tr></thead>\n<tbody>\n{rows}</tbody>\n</table>\n</div>",
        note = note,
        message_header = if has_messages { "<th>Message</th>" } else { "" },
        rows = rows,
    )
}

fn status_color(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Passed => "#22c55e",
        TestStatus::Failed => "#ef4444",
        TestStatus::Skipped => "#f59e0b",
        TestStatus::ExpectedFailure => "#a855f7",
        TestStatus::Unknown => "#9ca3af",
    }
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
