//! Source locator: failing line number and the code around it.
//!
//! Lua decorates messages as `"<source>:<line>: <message>"`. The line is the
//! text between the first and the second colon.

use serde::{Deserialize, Serialize};

/// How many lines to show around the failing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindow {
    /// Lines shown before the failing line.
    pub before: u32,

    /// Lines shown after the failing line.
    pub after: u32,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            before: 3,
            after: 1,
        }
    }
}

/// One source line in a code context window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextLine {
    /// 1-based line number.
    pub number: u32,

    /// Line text without the trailing newline.
    pub text: String,

    /// Whether this is the failing line.
    pub is_error: bool,
}

/// A contiguous slice of source lines around a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeContext {
    pub lines: Vec<ContextLine>,
}

impl CodeContext {
    /// The line marked as failing.
    pub fn error_line(&self) -> Option<&ContextLine> {
        self.lines.iter().find(|line| line.is_error)
    }
}

/// Recover the line number from a decorated message.
///
/// Returns `None` when the message does not follow the
/// `"<source>:<line>:"` convention.
pub fn extract_line(message: &str) -> Option<u32> {
    let first = message.find(':')?;
    let rest = &message[first + 1..];
    let second = rest.find(':')?;
    rest[..second].trim().parse().ok()
}

/// Cut the window around `line` out of `source`, clamped to the file.
///
/// Returns `None` when `line` is not a line of `source`.
pub fn code_context(source: &str, line: u32, window: ContextWindow) -> Option<CodeContext> {
    let total = u32::try_from(source.lines().count()).ok()?;
    if line == 0 || line > total {
        return None;
    }

    let first = line.saturating_sub(window.before).max(1);
    let last = line.saturating_add(window.after).min(total);

    let lines = source
        .lines()
        .zip(1u32..)
        .skip((first - 1) as usize)
        .take((last - first + 1) as usize)
        .map(|(text, number)| ContextLine {
            number,
            text: text.to_string(),
            is_error: number == line,
        })
        .collect();

    Some(CodeContext { lines })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "line1\nline2\nline3\nline4\nline5\nline6\nline7\nline8\n";

    fn numbers(context: &CodeContext) -> Vec<u32> {
        context.lines.iter().map(|l| l.number).collect()
    }

    #[test]
    fn test_extract_line() {
        assert_eq!(
            extract_line("script.lua:7: attempt to call a nil value (global 'doThing')"),
            Some(7)
        );
        assert_eq!(extract_line("[string \"x\"]:12: boom"), Some(12));
    }

    #[test]
    fn test_extract_line_without_prefix() {
        assert_eq!(extract_line("attempt to call a nil value"), None);
        assert_eq!(extract_line("no colon at all"), None);
        assert_eq!(extract_line("only:one colon"), None);
        assert_eq!(extract_line("script.lua:abc: message"), None);
        assert_eq!(extract_line("C:\\scripts\\a.lua:3: boom"), None);
    }

    #[test]
    fn test_code_context_window() {
        let context = code_context(SOURCE, 5, ContextWindow::default()).unwrap();
        assert_eq!(numbers(&context), vec![2, 3, 4, 5, 6]);
        assert_eq!(context.error_line().unwrap().text, "line5");
    }

    #[test]
    fn test_code_context_clamped_at_start() {
        let context = code_context(SOURCE, 2, ContextWindow::default()).unwrap();
        assert_eq!(numbers(&context), vec![1, 2, 3]);
    }

    #[test]
    fn test_code_context_clamped_at_end() {
        let context = code_context(SOURCE, 8, ContextWindow::default()).unwrap();
        assert_eq!(numbers(&context), vec![5, 6, 7, 8]);
        assert!(context.lines.last().unwrap().is_error);
    }

    #[test]
    fn test_code_context_out_of_range() {
        assert!(code_context(SOURCE, 0, ContextWindow::default()).is_none());
        assert!(code_context(SOURCE, 9, ContextWindow::default()).is_none());
        assert!(code_context("", 1, ContextWindow::default()).is_none());
    }

    #[test]
    fn test_code_context_custom_window() {
        let window = ContextWindow {
            before: 0,
            after: 0,
        };
        let context = code_context(SOURCE, 4, window).unwrap();
        assert_eq!(numbers(&context), vec![4]);
    }
}
