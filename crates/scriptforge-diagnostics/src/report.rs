//! The report assembled for one script failure.

use crate::hints::HintBlock;
use crate::locator::CodeContext;
use crate::stack::StackTrace;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Marker in front of the failing line in the code context block.
pub const ERROR_LINE_MARKER: &str = ">>>";

/// A structured diagnostic for one failure.
///
/// Built, formatted and dropped within a single diagnostic call. `Display`
/// renders the human-readable text; `to_json` gives the same content as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    /// Script display name.
    pub script: String,

    /// Path the script was loaded from.
    pub path: PathBuf,

    /// What the host was doing when the script failed, e.g. `on_tick`.
    pub context: String,

    /// Decorated message as raised by the interpreter.
    pub message: String,

    /// Failing line, `None` when the message carried none.
    pub line: Option<u32>,

    pub code_context: Option<CodeContext>,
    pub stack: StackTrace,
    pub hints: Vec<HintBlock>,
}

impl ErrorReport {
    /// Header line identifying the script and context.
    pub fn header(&self) -> String {
        if self.context.is_empty() {
            format!("Script error in '{}' ({})", self.script, self.path.display())
        } else {
            format!(
                "Script error in '{}' ({}) during {}",
                self.script,
                self.path.display(),
                self.context
            )
        }
    }

    /// Serialize the report as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header())?;
        writeln!(f, "  message: {}", self.message)?;
        match self.line {
            Some(line) => writeln!(f, "  line: {}", line)?,
            None => writeln!(f, "  line: unknown")?,
        }

        if let Some(context) = &self.code_context {
            writeln!(f, "Code context:")?;
            let width = context
                .lines
                .last()
                .map_or(1, |line| line.number.to_string().len());
            for line in &context.lines {
                let marker = if line.is_error { ERROR_LINE_MARKER } else { "" };
                writeln!(
                    f,
                    "  {:>3} {:>width$} | {}",
                    marker,
                    line.number,
                    line.text,
                    width = width
                )?;
            }
        }

        writeln!(f, "Stack trace:")?;
        match &self.stack {
            StackTrace::Unavailable => writeln!(f, "  stack trace not available")?,
            trace => {
                for frame in trace.frames() {
                    if frame.is_error_site {
                        writeln!(f, "  -> {}  <- error site", frame)?;
                    } else {
                        writeln!(f, "     {}", frame)?;
                    }
                }
            }
        }

        for block in &self.hints {
            writeln!(f, "Hint ({}):", block.rule)?;
            for hint in &block.hints {
                writeln!(f, "  - {}", hint)?;
            }
        }

        Ok(())
    }
}
