//! # scriptforge-diagnostics
//!
//! Turns a raw `ScriptError` into an `ErrorReport` a person can act on.
//!
//! The pieces are independent and have no state:
//!
//! - [`locator`] recovers the failing line from the decorated message and
//!   cuts a window of source around it
//! - [`stack`] renders the captured call stack, innermost frame first
//! - [`hints`] matches the message against known error families
//!
//! [`ErrorDiagnostics`] runs them in that order for one script and
//! assembles the report. Every step degrades to "unavailable" on its own;
//! producing a report never fails.

pub mod engine;
pub mod hints;
pub mod locator;
pub mod report;
pub mod source;
pub mod stack;

pub use engine::ErrorDiagnostics;
pub use hints::{match_hints, HintBlock, Identifier};
pub use locator::{code_context, extract_line, CodeContext, ContextLine, ContextWindow};
pub use report::ErrorReport;
pub use source::{FsSourceProvider, MemorySourceProvider, SourceProvider};
pub use stack::{reconstruct, RenderedFrame, StackTrace};
