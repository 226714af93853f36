//! The contract every capability module implements.

use scriptforge_runtime::{mlua, RuntimeError, ScriptEngine};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Priority used by modules that do not pick one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Errors a module may return from its lifecycle hooks.
#[derive(Error, Debug)]
pub enum ModuleError {
    /// The module reported a failure of its own.
    #[error("{0}")]
    Failed(String),

    /// A lifecycle hook panicked.
    #[error("panicked: {0}")]
    Panicked(String),

    /// Engine setup failed.
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// The interpreter rejected a binding.
    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),
}

impl ModuleError {
    /// Create a module-specific failure.
    pub fn failed(message: impl Into<String>) -> Self {
        ModuleError::Failed(message.into())
    }
}

/// Result type for module lifecycle hooks.
pub type ModuleResult<T> = std::result::Result<T, ModuleError>;

/// A lifecycle hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Initialize,
    RegisterApi,
    Shutdown,
}

impl LifecycleStage {
    /// Hook name as it appears in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStage::Initialize => "initialize",
            LifecycleStage::RegisterApi => "register_api",
            LifecycleStage::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a module is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    /// Not known to the registry.
    Unregistered,
    /// Registered, waiting for initialization.
    Registered,
    /// `initialize` and `register_api` both succeeded.
    Initialized,
    /// `shutdown` succeeded.
    ShutDown,
    /// The named hook failed; the module is skipped from then on.
    Failed(LifecycleStage),
}

/// A pluggable unit exposing host functionality to scripts.
///
/// Hooks are called by the registry only, on the host thread:
/// `initialize`, then `register_api` (only if `initialize` succeeded), and
/// finally `shutdown` (only for initialized modules).
pub trait ScriptModule: Any {
    /// Stable name, unique within a registry.
    fn name(&self) -> &str;

    /// Lower values initialize first and shut down last.
    ///
    /// Read once when the module is registered.
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Informational only; deprecated modules still register.
    fn deprecated(&self) -> bool {
        false
    }

    /// Prepare internal state.
    fn initialize(&mut self) -> ModuleResult<()> {
        Ok(())
    }

    /// Bind functions and values into the shared engine.
    fn register_api(&mut self, engine: &ScriptEngine) -> ModuleResult<()>;

    /// Release resources.
    fn shutdown(&mut self) -> ModuleResult<()> {
        Ok(())
    }

    /// Get as Any for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Get as mutable Any for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
