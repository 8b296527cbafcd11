use std::path::Path;
use std::time::Duration;

use crate::pipeline::error::ReportError;
use crate::tool::invoker::run_with_timeout;

pub const HTML_PLACEHOLDER: &str = "{html}";
pub const PDF_PLACEHOLDER: &str = "{pdf}";

/// External HTML-to-PDF converter. Chart.js does not run in most converters,
/// so the pie chart is missing from the PDF; the numbers are not.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfSettings {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            command: "wkhtmltopdf".into(),
            args: vec![
                "--quiet".into(),
                HTML_PLACEHOLDER.into(),
                PDF_PLACEHOLDER.into(),
            ],
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PdfOutcome {
    Written { bytes: u64 },
    /// Converter is not installed; the HTML report stands on its own
    ConverterUnavailable(String),
}

/// Convert an already-written HTML report into a PDF.
pub fn export_pdf(
    settings: &PdfSettings,
    html_path: &Path,
    pdf_path: &Path,
) -> Result<PdfOutcome, ReportError> {
    let html = html_path.to_string_lossy();
    let pdf = pdf_path.to_string_lossy();
    let args: Vec<String> = settings
        .args
        .iter()
        .map(|a| a.replace(HTML_PLACEHOLDER, &html).replace(PDF_PLACEHOLDER, &pdf))
        .collect();

    let raw = match run_with_timeout(&settings.command, &args, settings.timeout) {
        Ok(raw) => raw,
        Err(ReportError::SpawnFailed { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            return Ok(PdfOutcome::ConverterUnavailable(format!(
                "'{}' not found",
                settings.command
            )));
        }
        Err(e) => return Err(ReportError::write_failed(pdf_path, std::io::Error::other(e.to_string()))),
    };

    if !raw.success() {
        return Err(ReportError::write_failed(
            pdf_path,
            std::io::Error::other(format!(
                "`{}` exited with {:?}: {}",
                raw.command,
                raw.exit_code,
                raw.stderr.trim()
            )),
        ));
    }

    let bytes = std::fs::metadata(pdf_path)
        .map_err(|e| ReportError::write_failed(pdf_path, e))?
        .len();

    if bytes == 0 {
        return Err(ReportError::write_failed(
            pdf_path,
            std::io::Error::other("converter produced an empty file"),
        ));
    }

    Ok(PdfOutcome::Written { bytes })
}
