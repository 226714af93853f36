//! Stack reconstructor: renders captured frames as a readable trace.

use scriptforge_runtime::StackFrame;
use serde::Serialize;
use std::fmt;

/// Name shown for frames the interpreter could not name.
pub const ANONYMOUS_FUNCTION: &str = "<anonymous_function>";

/// Location shown for frames without one.
pub const UNKNOWN_LOCATION: &str = "<unknown_location>";

/// Name of the frame synthesized when only the line is known.
pub const SCRIPT_SCOPE: &str = "<script_scope>";

/// A frame ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFrame {
    pub function: String,
    pub location: String,

    /// Set on the innermost frame only.
    pub is_error_site: bool,
}

impl fmt::Display for RenderedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.function, self.location)
    }
}

/// The stack section of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "frames", rename_all = "snake_case")]
pub enum StackTrace {
    /// Frames captured by the interpreter, innermost first.
    Captured(Vec<RenderedFrame>),

    /// No frames were captured but the failing line is known.
    Synthesized(RenderedFrame),

    /// Neither frames nor a line are available.
    Unavailable,
}

impl StackTrace {
    /// Frames in display order.
    pub fn frames(&self) -> &[RenderedFrame] {
        match self {
            StackTrace::Captured(frames) => frames,
            StackTrace::Synthesized(frame) => std::slice::from_ref(frame),
            StackTrace::Unavailable => &[],
        }
    }

    /// The frame flagged as the error site.
    pub fn error_site(&self) -> Option<&RenderedFrame> {
        self.frames().iter().find(|frame| frame.is_error_site)
    }
}

/// Build the stack section.
///
/// Falls back to a single script-scope frame at `line` when nothing was
/// captured, and to [`StackTrace::Unavailable`] when the line is unknown too.
pub fn reconstruct(frames: &[StackFrame], line: Option<u32>, script_name: &str) -> StackTrace {
    if !frames.is_empty() {
        let rendered = frames
            .iter()
            .enumerate()
            .map(|(depth, frame)| render_frame(frame, depth == 0))
            .collect();
        return StackTrace::Captured(rendered);
    }

    match line {
        Some(line) => StackTrace::Synthesized(RenderedFrame {
            function: SCRIPT_SCOPE.to_string(),
            location: format!("{}:{}", script_name, line),
            is_error_site: true,
        }),
        None => StackTrace::Unavailable,
    }
}

fn render_frame(frame: &StackFrame, is_error_site: bool) -> RenderedFrame {
    RenderedFrame {
        function: frame
            .name
            .clone()
            .unwrap_or_else(|| ANONYMOUS_FUNCTION.to_string()),
        location: frame
            .location
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        is_error_site,
    }
}
