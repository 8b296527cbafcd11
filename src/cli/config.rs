use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::report::pdf::PdfSettings;
use crate::tool::invoker::ToolSettings;

pub const DEFAULT_CONFIG_FILE: &str = "xcresult-report.yaml";
pub const DEFAULT_OUTPUT: &str = "report.html";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "xcresult-report",
    version,
    about = "Turn Xcode .xcresult bundles into HTML (and PDF) test reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Append run history to this file (default: xcresult_report_<timestamp>.log)
    #[arg(long, global = true)]
    pub log: Option<String>,

    /// Path to config file (default: xcresult-report.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract results from a bundle and write an HTML report
    Generate {
        /// Path to the .xcresult bundle
        bundle: String,

        /// HTML output path (default: report.html)
        #[arg(short, long)]
        output: Option<String>,

        /// Also convert the HTML report to PDF at this path
        #[arg(long)]
        pdf: Option<String>,

        /// Report title (default: "XCTest Summary")
        #[arg(long)]
        title: Option<String>,

        /// Include the list of failed and skipped tests
        #[arg(long)]
        details: bool,

        /// Include screenshots in the details list (requires --details)
        #[arg(long)]
        screenshots: bool,

        /// Seconds to wait for xcresulttool before giving up
        #[arg(long)]
        timeout: Option<u64>,

        /// Write report_1.html, report_2.html, ... instead of overwriting
        #[arg(long)]
        no_overwrite: bool,
    },

    /// Re-render an HTML report from a JSON snapshot
    Render {
        /// Snapshot written by a previous `generate`
        #[arg(long)]
        snapshot: String,

        /// HTML output path (default: snapshot path with .html)
        #[arg(short, long)]
        output: Option<String>,

        /// Also convert the HTML report to PDF at this path
        #[arg(long)]
        pdf: Option<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `xcresult-report.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tool: ToolConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub pdf: PdfConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_program")]
    pub program: String,

    /// Extraction arguments; `{bundle}` is replaced by the bundle path
    pub args: Option<Vec<String>>,

    /// Extra arguments when the detail list is requested
    #[serde(default)]
    pub detail_args: Vec<String>,

    /// Attachment export arguments; `{bundle}` and `{output}` are substituted
    pub attachment_args: Option<Vec<String>>,

    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: None,
            detail_args: Vec::new(),
            attachment_args: None,
            timeout_secs: default_tool_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    pub title: Option<String>,
    pub output: Option<String>,

    #[serde(default)]
    pub include_details: bool,

    #[serde(default)]
    pub include_screenshots: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    #[serde(default = "default_pdf_command")]
    pub command: String,

    /// `{html}` and `{pdf}` are substituted
    pub args: Option<Vec<String>>,

    #[serde(default = "default_pdf_timeout")]
    pub timeout_secs: u64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            command: default_pdf_command(),
            args: None,
            timeout_secs: default_pdf_timeout(),
        }
    }
}

// Serde default helpers
fn default_program() -> String { "xcrun".to_string() }
fn default_tool_timeout() -> u64 { 300 }
fn default_pdf_command() -> String { "wkhtmltopdf".to_string() }
fn default_pdf_timeout() -> u64 { 120 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            eprintln!("Warning: ignoring malformed config '{}': {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Extraction tool settings: CLI timeout > config > defaults.
pub fn build_tool_settings(config: &ToolConfig, timeout_override: Option<u64>) -> ToolSettings {
    let defaults = ToolSettings::default();
    let timeout_secs = timeout_override.unwrap_or(config.timeout_secs).max(1);

    ToolSettings {
        program: config.program.clone(),
        args: config.args.clone().unwrap_or(defaults.args),
        detail_args: config.detail_args.clone(),
        attachment_args: config.attachment_args.clone().unwrap_or(defaults.attachment_args),
        timeout: Duration::from_secs(timeout_secs),
    }
}

pub fn build_pdf_settings(config: &PdfConfig) -> PdfSettings {
    let defaults = PdfSettings::default();
    PdfSettings {
        command: config.command.clone(),
        args: config.args.clone().unwrap_or(defaults.args),
        timeout: Duration::from_secs(config.timeout_secs.max(1)),
    }
}
