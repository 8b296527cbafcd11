use std::{fs::OpenOptions, io::Write, path::Path, sync::Mutex};

use serde::Serialize;

/// Append-only text sink for run history. One call, one line.
pub trait LogSink: Send + Sync {
    fn append(&self, line: &str);
}

/// Serialize `event` as one JSON line into `sink`.
pub fn log_event<E: Serialize>(sink: &dyn LogSink, event: &E) {
    match serde_json::to_string(event) {
        Ok(json) => sink.append(&json),
        Err(e) => eprintln!("Warning: failed to serialize log event: {}", e),
    }
}

/// Appends lines to a file. Opening failures disable logging instead of aborting the run.
pub struct FileLogSink {
    file: Option<Mutex<std::fs::File>>,
}

impl FileLogSink {
    pub fn new(path: &Path) -> Self {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = OpenOptions::new().create(true).append(true).open(path);

        match file {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
            },
            Err(e) => {
                eprintln!("Warning: could not open log file '{}': {}", path.display(), e);
                Self { file: None }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }
}

impl LogSink for FileLogSink {
    fn append(&self, line: &str) {
        let file_mutex = match &self.file {
            Some(f) => f,
            None => return, // logging disabled
        };

        let mut file = match file_mutex.lock() {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Warning: log file lock poisoned: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", line.trim_end()) {
            eprintln!("Warning: failed to write log line: {}", e);
        }
    }
}

/// Discards everything.
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn append(&self, _line: &str) {}
}

/// Keeps lines in memory; handy for embedding and tests.
#[derive(Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl LogSink for MemoryLogSink {
    fn append(&self, line: &str) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line.to_string()),
            Err(poisoned) => poisoned.into_inner().push(line.to_string()),
        }
    }
}
