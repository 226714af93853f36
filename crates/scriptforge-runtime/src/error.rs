//! Error types for the Scriptforge runtime.

use thiserror::Error;

/// Errors that can occur while setting up or feeding the interpreter.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Script file could not be found.
    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    /// Script metadata is unusable.
    #[error("Invalid script: {0}")]
    InvalidScript(String),

    /// A global could not be bound because the name is taken by a non-table value.
    #[error("Binding error: {0}")]
    Binding(String),

    /// Error raised by the interpreter itself.
    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;
