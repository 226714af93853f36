//! Configuration file loading and management
//!
//! This module handles loading and parsing the host configuration from
//! `$XDG_CONFIG_HOME/scriptforge/config.toml`. If the configuration file doesn't
//! exist, a default configuration is created with documented comments.

use anyhow::{Context, Result};
use scriptforge_diagnostics::ContextWindow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Largest code context window accepted on either side of the failing line.
pub const MAX_CONTEXT_LINES: u32 = 50;

/// Main host configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HostConfig {
    /// Host loop configuration
    #[serde(default)]
    pub host: HostSection,
    /// Script location
    #[serde(default)]
    pub scripts: ScriptsConfig,
    /// Error report configuration
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    /// Per-module switches, keyed by module name
    #[serde(default)]
    pub modules: HashMap<String, ModuleConfig>,
}

/// Host loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostSection {
    /// Log level (trace, debug, info, warn, error)
    /// Default: "info"
    pub log_level: String,
    /// Milliseconds between `on_tick` calls
    /// Default: 100
    pub tick_interval_ms: u64,
    /// Stop after this many ticks; run until Ctrl+C when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,
}

/// Script location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Directory holding scripts
    /// Default: "scripts"
    pub dir: PathBuf,
    /// Entry script, relative to `dir`
    /// Default: "main.lua"
    pub entry: String,
}

/// Error report configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Lines shown before the failing line
    pub context_before: u32,
    /// Lines shown after the failing line
    pub context_after: u32,
    /// Also print each report as JSON on stdout
    pub json: bool,
}

/// Per-module configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModuleConfig {
    /// Whether the module is registered at startup
    pub enabled: bool,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            tick_interval_ms: 100,
            max_ticks: None,
        }
    }
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("scripts"),
            entry: "main.lua".to_string(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        let window = ContextWindow::default();
        Self {
            context_before: window.before,
            context_after: window.after,
            json: false,
        }
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl HostConfig {
    /// Load configuration from the specified path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: HostConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default XDG config location
    ///
    /// If the configuration file doesn't exist, creates a default configuration
    /// file with documented comments.
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_file(&config_path)?;
        }

        Self::load(&config_path)
    }

    /// Get the default configuration file path
    ///
    /// Returns `$XDG_CONFIG_HOME/scriptforge/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "scriptforge", "scriptforge")
            .context("Failed to determine project directories")?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Create a default configuration file with documented comments
    pub fn create_default_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write default config file: {}", path.display()))?;

        tracing::info!("Created default configuration file at: {}", path.display());
        Ok(())
    }

    fn default_config_content() -> String {
        r#"# Scriptforge Host Configuration

[host]
# Log level: trace, debug, info, warn, error
# RUST_LOG overrides this when set.
# Default: "info"
log_level = "info"

# Milliseconds between on_tick(dt) calls
# Default: 100
tick_interval_ms = 100

# Stop after this many ticks. Without it the host runs until Ctrl+C.
# max_ticks = 600

[scripts]
# Directory holding scripts
# Default: "scripts"
dir = "scripts"

# Entry script, relative to dir
# Default: "main.lua"
entry = "main.lua"

[diagnostics]
# Source lines shown around the failing line in error reports
context_before = 3
context_after = 1

# Also print every error report as JSON on stdout
json = false

# Modules can be switched off by name:
# [modules.core]
# enabled = false
"#
        .to_string()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.host.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log_level: {}. Must be one of: {}",
                self.host.log_level,
                valid_log_levels.join(", ")
            );
        }

        if self.host.tick_interval_ms == 0 {
            anyhow::bail!("host.tick_interval_ms must be greater than 0");
        }

        if self.scripts.entry.trim().is_empty() {
            anyhow::bail!("scripts.entry cannot be empty");
        }

        if self.diagnostics.context_before > MAX_CONTEXT_LINES
            || self.diagnostics.context_after > MAX_CONTEXT_LINES
        {
            anyhow::bail!(
                "diagnostics context window cannot exceed {} lines per side",
                MAX_CONTEXT_LINES
            );
        }

        Ok(())
    }

    /// Path of the entry script
    pub fn entry_path(&self) -> PathBuf {
        self.scripts.dir.join(&self.scripts.entry)
    }

    /// Code context window for error reports
    pub fn context_window(&self) -> ContextWindow {
        ContextWindow {
            before: self.diagnostics.context_before,
            after: self.diagnostics.context_after,
        }
    }

    /// Whether the module `name` should be registered; modules not listed are enabled
    pub fn module_enabled(&self, name: &str) -> bool {
        self.modules.get(name).map_or(true, |module| module.enabled)
    }
}
