//! Error diagnostics engine: one report per script failure.

use crate::hints::match_hints;
use crate::locator::{code_context, extract_line, ContextWindow};
use crate::report::ErrorReport;
use crate::source::{FsSourceProvider, SourceProvider};
use crate::stack::reconstruct;
use scriptforge_runtime::{ScriptError, ScriptSource};
use std::path::{Path, PathBuf};
use tracing::error;

/// Builds reports for failures of one script.
///
/// The script's name and path are supplied up front; the engine never
/// goes looking for scripts on its own.
pub struct ErrorDiagnostics {
    script_name: String,
    script_path: PathBuf,
    window: ContextWindow,
    provider: Box<dyn SourceProvider>,
}

impl ErrorDiagnostics {
    /// Diagnostics for a script, reading source text from disk.
    pub fn new(script_name: impl Into<String>, script_path: impl Into<PathBuf>) -> Self {
        Self {
            script_name: script_name.into(),
            script_path: script_path.into(),
            window: ContextWindow::default(),
            provider: Box::new(FsSourceProvider),
        }
    }

    /// Diagnostics for a loaded script.
    pub fn for_script(script: &ScriptSource) -> Self {
        Self::new(script.name(), script.path())
    }

    /// Replace the source provider.
    pub fn with_provider(mut self, provider: impl SourceProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    /// Replace the code context window.
    pub fn with_window(mut self, window: ContextWindow) -> Self {
        self.window = window;
        self
    }

    /// Script display name.
    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    /// Script path.
    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    /// Build the report for `failure`. Never fails.
    ///
    /// `context` names what the host was doing, e.g. `load` or `on_tick`.
    pub fn diagnose(&self, failure: &ScriptError, context: &str) -> ErrorReport {
        let line = extract_line(&failure.message);

        let code_context = line.and_then(|line| {
            self.provider
                .read_source(&self.script_path)
                .and_then(|text| code_context(&text, line, self.window))
        });

        let stack = reconstruct(&failure.frames, line, &self.script_name);
        let hints = match_hints(&failure.message);

        ErrorReport {
            script: self.script_name.clone(),
            path: self.script_path.clone(),
            context: context.to_string(),
            message: failure.message.clone(),
            line,
            code_context,
            stack,
            hints,
        }
    }

    /// Build the report and log it to the host's sink.
    pub fn report(&self, failure: &ScriptError, context: &str) -> ErrorReport {
        let report = self.diagnose(failure, context);
        error!(
            script = %self.script_name,
            context = %context,
            line = ?report.line,
            "{}",
            report
        );
        report
    }
}
