use std::cell::Cell;
use std::path::Path;
use std::time::Duration;

use xcresult_report::pipeline::error::ReportError;
use xcresult_report::tool::attachments::MANIFEST_FILE;
use xcresult_report::tool::invoker::{RawInvocationResult, ToolInvoker};

/// Returns canned output instead of running xcresulttool.
pub struct FakeInvoker {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub manifest: Option<String>,
    pub calls: Cell<usize>,
    pub export_calls: Cell<usize>,
}

impl FakeInvoker {
    pub fn returning(stdout: &str) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
            manifest: None,
            calls: Cell::new(0),
            export_calls: Cell::new(0),
        }
    }

    pub fn failing(exit_code: i32, stderr: &str) -> Self {
        Self {
            exit_code: Some(exit_code),
            stderr: stderr.to_string(),
            ..Self::returning("")
        }
    }

    pub fn with_manifest(mut self, manifest: &str) -> Self {
        self.manifest = Some(manifest.to_string());
        self
    }

    fn result(&self, command: &str, stdout: &str) -> RawInvocationResult {
        RawInvocationResult {
            command: command.to_string(),
            exit_code: self.exit_code,
            stdout: stdout.to_string(),
            stderr: self.stderr.clone(),
            duration: Duration::from_millis(5),
        }
    }
}

impl ToolInvoker for FakeInvoker {
    fn command_line(&self, bundle: &Path, want_detail: bool) -> String {
        format!("fake-xcresulttool {} detail={}", bundle.display(), want_detail)
    }

    fn invoke(&self, bundle: &Path, want_detail: bool) -> Result<RawInvocationResult, ReportError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.result(&self.command_line(bundle, want_detail), &self.stdout))
    }

    fn export_attachments(
        &self,
        _bundle: &Path,
        output_dir: &Path,
    ) -> Result<RawInvocationResult, ReportError> {
        self.export_calls.set(self.export_calls.get() + 1);
        if let Some(ref manifest) = self.manifest {
            std::fs::write(output_dir.join(MANIFEST_FILE), manifest)
                .map_err(|e| ReportError::write_failed(output_dir, e))?;
        }
        Ok(self.result("fake-export", ""))
    }
}

/// A directory that passes the bundle existence check.
pub fn fake_bundle(root: &Path) -> std::path::PathBuf {
    let bundle = root.join("Tests.xcresult");
    std::fs::create_dir_all(&bundle).unwrap();
    std::fs::write(bundle.join("Info.plist"), "<plist/>").unwrap();
    bundle
}
