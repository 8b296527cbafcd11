use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Longest stderr excerpt copied into a log line.
const STDERR_EXCERPT_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationOutcome {
    Ok,
    InvalidInput,
    SpawnFailed,
    ExtractionFailed,
    Timeout,
    EmptyResult,
}

/// One line per extraction-tool invocation attempt.
#[derive(Debug, Serialize)]
pub struct InvocationEvent {
    pub timestamp: String,
    pub event: &'static str,
    pub bundle: String,
    pub detail: bool,
    pub outcome: InvocationOutcome,

    pub command: Option<String>,
    pub exit_code: Option<i32>,
    pub stdout_len: Option<usize>,
    pub elapsed_ms: Option<u128>,
    pub stderr: Option<String>,
    pub message: Option<String>,
}

impl InvocationEvent {
    pub fn now(bundle: &str, detail: bool, outcome: InvocationOutcome) -> Self {
        Self {
            timestamp: timestamp(),
            event: "invocation",
            bundle: bundle.to_string(),
            detail,
            outcome,
            command: None,
            exit_code: None,
            stdout_len: None,
            elapsed_ms: None,
            stderr: None,
            message: None,
        }
    }

    pub fn with_command(mut self, command: impl ToString) -> Self {
        self.command = Some(command.to_string());
        self
    }

    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    pub fn with_stdout_len(mut self, len: usize) -> Self {
        self.stdout_len = Some(len);
        self
    }

    pub fn with_elapsed_ms(mut self, ms: u128) -> Self {
        self.elapsed_ms = Some(ms);
        self
    }

    pub fn with_stderr(mut self, stderr: &str) -> Self {
        let trimmed = stderr.trim();
        if !trimmed.is_empty() {
            self.stderr = Some(trimmed.chars().take(STDERR_EXCERPT_CHARS).collect());
        }
        self
    }

    pub fn with_message(mut self, message: impl ToString) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

/// Progress line for the stages after extraction (parse, aggregate, snapshot, ...).
#[derive(Debug, Serialize)]
pub struct PipelineEvent {
    pub timestamp: String,
    pub event: &'static str,
    pub stage: String,
    pub ok: bool,
    pub message: Option<String>,
}

impl PipelineEvent {
    pub fn ok(stage: &str) -> Self {
        Self {
            timestamp: timestamp(),
            event: "pipeline",
            stage: stage.to_string(),
            ok: true,
            message: None,
        }
    }

    pub fn failed(stage: &str, message: impl ToString) -> Self {
        Self {
            ok: false,
            ..Self::ok(stage).with_message(message)
        }
    }

    pub fn with_message(mut self, message: impl ToString) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
