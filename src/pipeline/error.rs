use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Coarse error category, one per failure mode of the report pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ExtractionFailed,
    Timeout,
    EmptyResult,
    MalformedResult,
    EmptyTree,
    WriteFailed,
}

#[derive(Debug)]
pub enum ReportError {
    /// Bundle path missing or unreadable; raised before any process is spawned
    InvalidInput { path: PathBuf, reason: String },

    /// Extraction tool could not be started at all (not on PATH, not executable)
    SpawnFailed { command: String, source: std::io::Error },

    /// Extraction tool ran but exited non-zero
    ExtractionFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Extraction tool exceeded its time budget and was killed
    Timeout { command: String, timeout: Duration },

    /// Extraction tool exited zero with nothing on stdout
    EmptyResult { command: String },

    /// Output was not JSON at all
    MalformedJson { source: serde_json::Error },

    /// Output was JSON but a structural field (kind, name) was missing or unusable
    MalformedResult(String),

    /// Parsed tree contains no test cases
    EmptyTree { source_path: PathBuf },

    /// Snapshot or report artifact could not be written
    WriteFailed { path: PathBuf, source: std::io::Error },
}

impl ReportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReportError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ReportError::SpawnFailed { .. } | ReportError::ExtractionFailed { .. } => {
                ErrorKind::ExtractionFailed
            }
            ReportError::Timeout { .. } => ErrorKind::Timeout,
            ReportError::EmptyResult { .. } => ErrorKind::EmptyResult,
            ReportError::MalformedJson { .. } | ReportError::MalformedResult(_) => {
                ErrorKind::MalformedResult
            }
            ReportError::EmptyTree { .. } => ErrorKind::EmptyTree,
            ReportError::WriteFailed { .. } => ErrorKind::WriteFailed,
        }
    }

    /// Process exit code for the CLI. Every kind maps to a distinct non-zero value.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::InvalidInput => 2,
            ErrorKind::ExtractionFailed => 3,
            ErrorKind::Timeout => 4,
            ErrorKind::EmptyResult => 5,
            ErrorKind::MalformedResult => 6,
            ErrorKind::EmptyTree => 7,
            ErrorKind::WriteFailed => 8,
        }
    }

    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::WriteFailed {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::InvalidInput { path, reason } => {
                write!(f, "Invalid bundle path {}: {}", path.display(), reason)
            }
            ReportError::SpawnFailed { command, source } => {
                write!(f, "Failed to run `{}` (is Xcode installed?): {}", command, source)
            }
            ReportError::ExtractionFailed {
                command,
                exit_code,
                stderr,
            } => {
                let code = exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                write!(f, "`{}` exited with {}: {}", command, code, stderr.trim())
            }
            ReportError::Timeout { command, timeout } => {
                write!(
                    f,
                    "`{}` did not finish within {}s and was terminated",
                    command,
                    timeout.as_secs()
                )
            }
            ReportError::EmptyResult { command } => {
                write!(f, "`{}` succeeded but produced no output", command)
            }
            ReportError::MalformedJson { source } => {
                write!(f, "Result output is not valid JSON: {}", source)
            }
            ReportError::MalformedResult(msg) => {
                write!(f, "Unexpected result structure: {}", msg)
            }
            ReportError::EmptyTree { source_path } => {
                write!(f, "No test cases found in {}", source_path.display())
            }
            ReportError::WriteFailed { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::SpawnFailed { source, .. } => Some(source),
            ReportError::MalformedJson { source } => Some(source),
            ReportError::WriteFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
