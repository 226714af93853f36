//! Source providers: where diagnostics re-read script text from.
//!
//! A provider only feeds the code context block. When it has nothing to
//! offer the block is left out of the report.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Gives back the full text of a script, or `None` when unavailable.
pub trait SourceProvider {
    fn read_source(&self, path: &Path) -> Option<String>;
}

/// Reads scripts from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceProvider;

impl SourceProvider for FsSourceProvider {
    fn read_source(&self, path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!("Source unavailable for {:?}: {}", path, e);
                None
            }
        }
    }
}

/// Serves scripts kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySourceProvider {
    sources: HashMap<PathBuf, String>,
}

impl MemorySourceProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the text served for `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.sources.insert(path.into(), text.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_source(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl SourceProvider for MemorySourceProvider {
    fn read_source(&self, path: &Path) -> Option<String> {
        self.sources.get(path).cloned()
    }
}
