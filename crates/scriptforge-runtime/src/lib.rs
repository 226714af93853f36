//! # scriptforge-runtime
//!
//! The interpreter boundary for Scriptforge.
//!
//! This crate provides:
//! - `ScriptEngine`, the engine handle modules bind their functions into
//! - `ScriptSource`, script metadata plus the code to run
//! - `ScriptError`, the interpreter exception with its captured call stack
//!
//! ## Interpreter
//!
//! Scripts are Lua 5.4, embedded through `mlua`. Every script is loaded
//! under the chunk name `@<display name>`, so the interpreter decorates its
//! error messages as `"<display name>:<line>: <message>"`.

pub mod engine;
pub mod error;
pub mod exception;
pub mod script;

pub use engine::ScriptEngine;
pub use error::{RuntimeError, RuntimeResult};
pub use exception::{parse_traceback, ScriptError, SourceLocation, StackFrame};
pub use script::ScriptSource;

/// Re-exported so module crates bind functions against the same `mlua`.
pub use mlua;
