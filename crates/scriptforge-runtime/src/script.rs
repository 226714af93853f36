//! Script metadata and loading.

use crate::error::{RuntimeError, RuntimeResult};
use std::path::{Path, PathBuf};

/// A script ready to be handed to the engine.
///
/// The display name is what the interpreter prints in decorated messages;
/// the path is where diagnostics re-read the source from.
#[derive(Debug, Clone)]
pub struct ScriptSource {
    name: String,
    path: PathBuf,
    code: String,
}

impl ScriptSource {
    /// Build a script from in-memory code.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            code: code.into(),
        }
    }

    /// Read a script from disk, using the file name as display name.
    pub fn from_file(path: &Path) -> RuntimeResult<Self> {
        if !path.is_file() {
            return Err(RuntimeError::ScriptNotFound(path.display().to_string()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| RuntimeError::InvalidScript(format!("{} has no file name", path.display())))?;
        let code = std::fs::read_to_string(path)?;

        Ok(Self::new(name, path, code))
    }

    /// Display name used in messages and report headers.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path the script was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Script code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Chunk name handed to the interpreter.
    ///
    /// The `@` prefix makes Lua print the name verbatim instead of
    /// `[string "..."]`.
    pub fn chunk_name(&self) -> String {
        format!("@{}", self.name)
    }
}
