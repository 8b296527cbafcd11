use std::path::{Path, PathBuf};

use crate::cli::config::{AppConfig, DEFAULT_OUTPUT, build_pdf_settings, build_tool_settings};
use crate::pipeline::error::ReportError;
use crate::pipeline::pipeline::{ReportRequest, generate_report};
use crate::report::builder::read_snapshot;
use crate::report::console::format_console_report;
use crate::report::html::generate_html_report;
use crate::report::pdf::{PdfOutcome, export_pdf};
use crate::report::report_model::ReportModel;
use crate::tool::invoker::XcresultTool;
use crate::trace::logger::{LogSink, log_event};
use crate::trace::trace::PipelineEvent;

/// Resolved `generate` arguments.
#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    pub bundle: String,
    pub output: Option<String>,
    pub pdf: Option<String>,
    pub title: Option<String>,
    pub details: bool,
    pub screenshots: bool,
    pub timeout: Option<u64>,
    pub no_overwrite: bool,
}

// ============================================================================
// generate subcommand
// ============================================================================

/// Run the whole pipeline and write the HTML (and optional PDF) report.
///
/// Returns the HTML path. Succeeds only when the model was built and the
/// HTML written.
pub fn cmd_generate(
    args: &GenerateArgs,
    config: &AppConfig,
    log: &dyn LogSink,
    verbose: u8,
) -> Result<PathBuf, ReportError> {
    let requested = args
        .output
        .as_deref()
        .or(config.report.output.as_deref())
        .unwrap_or(DEFAULT_OUTPUT);
    let html_path = if args.no_overwrite {
        next_available_path(Path::new(requested))
    } else {
        PathBuf::from(requested)
    };

    let request = ReportRequest {
        bundle: PathBuf::from(&args.bundle),
        html_output: html_path.clone(),
        title: args.title.clone().or_else(|| config.report.title.clone()),
        include_details: args.details || config.report.include_details,
        include_screenshots: args.screenshots || config.report.include_screenshots,
    };

    if verbose > 0 {
        eprintln!("Extracting results from {}...", args.bundle);
    }
    if request.include_screenshots && !request.include_details {
        eprintln!("Warning: screenshots are only included together with --details");
    }

    let invoker = XcresultTool::new(build_tool_settings(&config.tool, args.timeout));
    let outcome = generate_report(&invoker, log, &request)?;

    match outcome.snapshot {
        Ok(ref path) if verbose > 0 => eprintln!("  Wrote snapshot: {}", path.display()),
        Ok(_) => {}
        Err(ref e) => eprintln!("Warning: {}", e),
    }

    write_html(&outcome.model, &html_path, log)?;

    print!("{}", format_console_report(&outcome.model));
    println!("HTML report written to: {}", html_path.display());

    if let Some(ref pdf) = args.pdf {
        write_pdf(config, &html_path, Path::new(pdf), log)?;
    }

    Ok(html_path)
}

// ============================================================================
// render subcommand
// ============================================================================

/// Render HTML (and optional PDF) from an existing JSON snapshot.
pub fn cmd_render(
    snapshot: &str,
    output: Option<&str>,
    pdf: Option<&str>,
    config: &AppConfig,
    log: &dyn LogSink,
) -> Result<PathBuf, ReportError> {
    let snapshot_path = Path::new(snapshot);
    let model = read_snapshot(snapshot_path)?;

    let html_path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| snapshot_path.with_extension("html"));

    write_html(&model, &html_path, log)?;
    println!("HTML report written to: {}", html_path.display());

    if let Some(pdf) = pdf {
        write_pdf(config, &html_path, Path::new(pdf), log)?;
    }

    Ok(html_path)
}

// ============================================================================
// Helpers
// ============================================================================

fn write_html(model: &ReportModel, html_path: &Path, log: &dyn LogSink) -> Result<(), ReportError> {
    let html = generate_html_report(model);

    if let Some(parent) = html_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::write_failed(html_path, e))?;
    }

    match std::fs::write(html_path, &html) {
        Ok(()) => {
            log_event(
                log,
                &PipelineEvent::ok("html")
                    .with_message(format!("{} ({} bytes)", html_path.display(), html.len())),
            );
            Ok(())
        }
        Err(e) => {
            let err = ReportError::write_failed(html_path, e);
            log_event(log, &PipelineEvent::failed("html", &err));
            Err(err)
        }
    }
}

/// A missing converter is a warning; a converter that fails is an error.
fn write_pdf(
    config: &AppConfig,
    html_path: &Path,
    pdf_path: &Path,
    log: &dyn LogSink,
) -> Result<(), ReportError> {
    let settings = build_pdf_settings(&config.pdf);

    match export_pdf(&settings, html_path, pdf_path) {
        Ok(PdfOutcome::Written { bytes }) => {
            log_event(
                log,
                &PipelineEvent::ok("pdf").with_message(format!("{} ({} bytes)", pdf_path.display(), bytes)),
            );
            println!("PDF report written to: {}", pdf_path.display());
            Ok(())
        }
        Ok(PdfOutcome::ConverterUnavailable(reason)) => {
            log_event(log, &PipelineEvent::failed("pdf", &reason));
            eprintln!(
                "Warning: PDF converter unavailable ({}); skipping PDF generation.",
                reason
            );
            Ok(())
        }
        Err(e) => {
            log_event(log, &PipelineEvent::failed("pdf", &e));
            Err(e)
        }
    }
}

/// `report.html` if free, else the first free `report_1.html`, `report_2.html`, ...
pub fn next_available_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".into());
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "html".into());

    (1..)
        .map(|n| path.with_file_name(format!("{}_{}.{}", stem, n, extension)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Default log file name for a run started now.
pub fn default_log_path() -> PathBuf {
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    PathBuf::from(format!("xcresult_report_{}.log", ts))
}
