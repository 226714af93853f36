//! The interpreter exception surfaced when a script fails.
//!
//! Lua reports failures as a decorated message string with a textual
//! `stack traceback:` appended. This module splits the two apart and parses
//! the traceback into structured frames, innermost first.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Header line Lua puts in front of a traceback.
pub const TRACEBACK_HEADER: &str = "stack traceback:";

/// Source id used by Lua for native functions.
const NATIVE_SOURCE: &str = "[C]";

/// Where a frame was executing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// Chunk name or `[C]` for native code.
    pub source: String,

    /// Current line, when the interpreter knows it.
    pub line: Option<u32>,
}

impl SourceLocation {
    /// Create a location.
    pub fn new(source: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            source: source.into(),
            line,
        }
    }

    /// Parse a traceback location such as `main.lua:12` or `[C]`.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some((source, line)) = text.rsplit_once(':') {
            if let Ok(line) = line.parse::<u32>() {
                return Self::new(source, Some(line));
            }
        }
        Self::new(text, None)
    }

    /// Whether this location is inside native code.
    pub fn is_native(&self) -> bool {
        self.source == NATIVE_SOURCE
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.source, line),
            None => write!(f, "{}", self.source),
        }
    }
}

/// One entry of the captured call stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackFrame {
    /// Function name, if the interpreter could name it.
    pub name: Option<String>,

    /// Source location, if known.
    pub location: Option<SourceLocation>,
}

impl StackFrame {
    /// Create a frame.
    pub fn new(name: Option<&str>, location: Option<SourceLocation>) -> Self {
        Self {
            name: name.map(str::to_string),
            location,
        }
    }

    fn is_native(&self) -> bool {
        self.location.as_ref().is_some_and(SourceLocation::is_native)
    }
}

/// A script failure as raised by the interpreter.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ScriptError {
    /// Decorated message, `"<source>:<line>: <message>"` when Lua knows the position.
    pub message: String,

    /// Call stack, innermost frame first. May be empty.
    pub frames: Vec<StackFrame>,
}

impl ScriptError {
    /// Create an error without a captured stack.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            frames: Vec::new(),
        }
    }

    /// Create an error with a captured stack.
    pub fn with_frames(message: impl Into<String>, frames: Vec<StackFrame>) -> Self {
        Self {
            message: message.into(),
            frames,
        }
    }

    /// Split a decorated message that may carry an appended traceback.
    pub fn from_decorated(text: &str) -> Self {
        match text.find(TRACEBACK_HEADER) {
            Some(at) => Self::with_frames(text[..at].trim_end(), parse_traceback(&text[at..])),
            None => Self::new(text.trim_end()),
        }
    }

    /// Convert any interpreter failure.
    pub fn from_lua(error: &mlua::Error) -> Self {
        match error {
            mlua::Error::RuntimeError(text) => Self::from_decorated(text),
            mlua::Error::SyntaxError { message, .. } => Self::from_decorated(message),
            mlua::Error::CallbackError { traceback, cause } => {
                let mut inner = Self::from_lua(cause);
                if inner.frames.is_empty() {
                    inner.frames = parse_traceback(traceback);
                }
                inner.decorate_with_caller();
                inner
            }
            mlua::Error::WithContext { cause, .. } => Self::from_lua(cause),
            other => Self::new(other.to_string()),
        }
    }
}

impl ScriptError {
    /// Prefix an undecorated message with the innermost script position.
    ///
    /// Host functions raise plain messages; Lua's own native functions get
    /// `"<source>:<line>: "` from the interpreter. This gives both the same shape.
    fn decorate_with_caller(&mut self) {
        if has_position(&self.message) {
            return;
        }

        let caller = self
            .frames
            .iter()
            .filter_map(|frame| frame.location.as_ref())
            .find(|location| !location.is_native() && location.line.is_some());

        if let Some(location) = caller {
            self.message = format!("{}: {}", location, self.message);
        }
    }
}

/// Whether `message` starts with a `"<source>:<line>:"` position.
fn has_position(message: &str) -> bool {
    let mut parts = message.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(line), Some(_)) => line.trim().parse::<u32>().is_ok(),
        _ => false,
    }
}

impl From<mlua::Error> for ScriptError {
    fn from(error: mlua::Error) -> Self {
        Self::from_lua(&error)
    }
}

/// Parse a Lua traceback into frames, innermost first.
///
/// Lines that are not frames (`(...tail calls...)`, skipped-level markers)
/// are dropped. Native frames in front of the first script frame belong to
/// the error machinery (message handler, `error`) and are trimmed.
pub fn parse_traceback(text: &str) -> Vec<StackFrame> {
    let body = match text.find(TRACEBACK_HEADER) {
        Some(at) => &text[at + TRACEBACK_HEADER.len()..],
        None => text,
    };

    let frames: Vec<StackFrame> = body.lines().filter_map(parse_frame).collect();

    match frames.iter().position(|frame| !frame.is_native()) {
        Some(first_script) => frames.into_iter().skip(first_script).collect(),
        None => frames,
    }
}

fn parse_frame(line: &str) -> Option<StackFrame> {
    let (location, what) = line.trim().split_once(": in ")?;
    Some(StackFrame {
        name: frame_name(what.trim()),
        location: Some(SourceLocation::parse(location)),
    })
}

fn frame_name(what: &str) -> Option<String> {
    if what == "main chunk" {
        return Some(what.to_string());
    }
    if what == "?" || what.starts_with("function <") {
        return None;
    }

    // function 'name', local 'name', method 'name', field 'name', upvalue 'name'
    let open = what.find('\'')?;
    let close = what.rfind('\'')?;
    (close > open + 1).then(|| what[open + 1..close].to_string())
}
