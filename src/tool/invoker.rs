use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::pipeline::error::ReportError;
use crate::trace::logger::{LogSink, log_event};
use crate::trace::trace::{InvocationEvent, InvocationOutcome};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

pub const BUNDLE_PLACEHOLDER: &str = "{bundle}";
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// What one run of the extraction tool produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInvocationResult {
    pub command: String,
    /// `None` when the process was ended by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl RawInvocationResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Capability to run the extraction tool against a bundle.
///
/// Implementations only report process completion; `Timeout` and spawn
/// failures are their only errors. Exit-status and empty-output
/// classification happens in [`extract`].
pub trait ToolInvoker {
    /// Human-readable command line, used in logs and diagnostics.
    fn command_line(&self, bundle: &Path, want_detail: bool) -> String;

    fn invoke(&self, bundle: &Path, want_detail: bool) -> Result<RawInvocationResult, ReportError>;

    /// Export attachments (screenshots) of `bundle` into `output_dir`.
    fn export_attachments(
        &self,
        bundle: &Path,
        output_dir: &Path,
    ) -> Result<RawInvocationResult, ReportError> {
        let _ = output_dir;
        Err(ReportError::ExtractionFailed {
            command: format!("export attachments {}", bundle.display()),
            exit_code: None,
            stderr: "attachment export is not supported by this invoker".into(),
        })
    }
}

// ============================================================================
// Validated, logged extraction
// ============================================================================

/// Run the extraction tool on `bundle` and classify the outcome.
///
/// The path is checked before anything is spawned. Every attempt, whatever
/// its outcome, appends one line to `log`.
pub fn extract(
    invoker: &dyn ToolInvoker,
    log: &dyn LogSink,
    bundle: &Path,
    want_detail: bool,
) -> Result<RawInvocationResult, ReportError> {
    let bundle_text = bundle.display().to_string();

    if let Err(reason) = check_bundle(bundle) {
        log_event(
            log,
            &InvocationEvent::now(&bundle_text, want_detail, InvocationOutcome::InvalidInput)
                .with_message(&reason),
        );
        return Err(ReportError::InvalidInput {
            path: bundle.to_path_buf(),
            reason,
        });
    }

    let command = invoker.command_line(bundle, want_detail);
    let event = |outcome| {
        InvocationEvent::now(&bundle_text, want_detail, outcome).with_command(&command)
    };

    let raw = match invoker.invoke(bundle, want_detail) {
        Ok(raw) => raw,
        Err(e) => {
            let outcome = match e {
                ReportError::Timeout { .. } => InvocationOutcome::Timeout,
                ReportError::SpawnFailed { .. } => InvocationOutcome::SpawnFailed,
                _ => InvocationOutcome::ExtractionFailed,
            };
            log_event(log, &event(outcome).with_message(&e));
            return Err(e);
        }
    };

    let finished = |outcome| {
        event(outcome)
            .with_exit_code(raw.exit_code)
            .with_stdout_len(raw.stdout.len())
            .with_elapsed_ms(raw.duration.as_millis())
            .with_stderr(&raw.stderr)
    };

    if !raw.success() {
        log_event(log, &finished(InvocationOutcome::ExtractionFailed));
        return Err(ReportError::ExtractionFailed {
            command: raw.command.clone(),
            exit_code: raw.exit_code,
            stderr: raw.stderr.trim().to_string(),
        });
    }

    if raw.stdout.trim().is_empty() {
        log_event(log, &finished(InvocationOutcome::EmptyResult));
        return Err(ReportError::EmptyResult {
            command: raw.command.clone(),
        });
    }

    log_event(log, &finished(InvocationOutcome::Ok));
    Ok(raw)
}

/// The bundle must exist and be readable. Its internal layout is the tool's business.
fn check_bundle(bundle: &Path) -> Result<(), String> {
    let metadata = std::fs::metadata(bundle).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => "path does not exist".to_string(),
        _ => format!("cannot access path: {}", e),
    })?;

    let readable = if metadata.is_dir() {
        std::fs::read_dir(bundle).map(|_| ())
    } else {
        std::fs::File::open(bundle).map(|_| ())
    };

    readable.map_err(|e| format!("path is not readable: {}", e))
}

// ============================================================================
// xcresulttool via a child process
// ============================================================================

/// How to call the extraction tool. Arguments may contain `{bundle}` and `{output}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub program: String,
    pub args: Vec<String>,
    /// Appended to `args` when full detail is requested.
    ///
    /// Empty by default: `get test-results tests` is the only subcommand that
    /// emits the plan/suite/case tree the counts are built from, so both
    /// detail levels run the same command. `summary` output has no tree and
    /// cannot serve the non-detail level.
    pub detail_args: Vec<String>,
    pub attachment_args: Vec<String>,
    pub timeout: Duration,
}

impl Default for ToolSettings {
    fn default() -> Self {
        let owned = |args: &[&str]| args.iter().map(|a| a.to_string()).collect();
        Self {
            program: "xcrun".into(),
            args: owned(&[
                "xcresulttool",
                "get",
                "test-results",
                "tests",
                "--path",
                BUNDLE_PLACEHOLDER,
                "--compact",
            ]),
            detail_args: Vec::new(),
            attachment_args: owned(&[
                "xcresulttool",
                "export",
                "attachments",
                "--path",
                BUNDLE_PLACEHOLDER,
                "--output-path",
                OUTPUT_PLACEHOLDER,
            ]),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Runs `xcrun xcresulttool` (or whatever the settings name) as a child process.
pub struct XcresultTool {
    settings: ToolSettings,
}

impl XcresultTool {
    pub fn new(settings: ToolSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    fn extraction_args(&self, bundle: &Path, want_detail: bool) -> Vec<String> {
        let mut args = self.settings.args.clone();
        if want_detail {
            args.extend(self.settings.detail_args.iter().cloned());
        }
        substitute(&args, bundle, None)
    }
}

impl ToolInvoker for XcresultTool {
    fn command_line(&self, bundle: &Path, want_detail: bool) -> String {
        format_command(&self.settings.program, &self.extraction_args(bundle, want_detail))
    }

    fn invoke(&self, bundle: &Path, want_detail: bool) -> Result<RawInvocationResult, ReportError> {
        let args = self.extraction_args(bundle, want_detail);
        run_with_timeout(&self.settings.program, &args, self.settings.timeout)
    }

    fn export_attachments(
        &self,
        bundle: &Path,
        output_dir: &Path,
    ) -> Result<RawInvocationResult, ReportError> {
        let args = substitute(&self.settings.attachment_args, bundle, Some(output_dir));
        run_with_timeout(&self.settings.program, &args, self.settings.timeout)
    }
}

fn substitute(args: &[String], bundle: &Path, output: Option<&Path>) -> Vec<String> {
    let bundle = absolute(bundle);
    let bundle = bundle.to_string_lossy();
    let output = output.map(|o| absolute(o).to_string_lossy().to_string());

    args.iter()
        .map(|arg| {
            let arg = arg.replace(BUNDLE_PLACEHOLDER, &bundle);
            match output {
                Some(ref out) => arg.replace(OUTPUT_PLACEHOLDER, out),
                None => arg,
            }
        })
        .collect()
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

pub fn format_command(program: &str, args: &[String]) -> String {
    std::iter::once(program.to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Spawn `program`, capture stdout/stderr, and kill it once `timeout` elapses.
///
/// Output of a killed process is discarded.
pub fn run_with_timeout(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<RawInvocationResult, ReportError> {
    let command = format_command(program, args);
    let started_at = Instant::now();

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ReportError::SpawnFailed {
            command: command.clone(),
            source,
        })?;

    // Drain both pipes concurrently so a chatty tool never blocks on a full pipe.
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let exit_code = match wait_for_child(&mut child, timeout) {
        Ok(Some(code)) => code,
        Ok(None) => {
            return Err(ReportError::Timeout { command, timeout });
        }
        Err(source) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ReportError::SpawnFailed { command, source });
        }
    };

    let stdout = join_reader(stdout_reader);
    let stderr = join_reader(stderr_reader);

    Ok(RawInvocationResult {
        command,
        exit_code,
        stdout,
        stderr,
        duration: started_at.elapsed(),
    })
}

/// `Ok(Some(code))` on exit, `Ok(None)` when the child was killed for running too long.
fn wait_for_child(child: &mut Child, timeout: Duration) -> std::io::Result<Option<Option<i32>>> {
    let started_at = Instant::now();

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status.code()));
        }

        if started_at.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }

        thread::sleep(POLL_INTERVAL);
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
