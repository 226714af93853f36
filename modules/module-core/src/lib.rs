//! # module-core
//!
//! The core utility module. It runs first (priority 0) so every other
//! module and script can log through it.
//!
//! Exposes a global `host` table:
//!
//! | Function | Returns |
//! |----------|---------|
//! | `host.log(level, message)` | nothing; `level` is trace, debug, info, warn or error |
//! | `host.time()` | current UTC time, RFC 3339 |
//! | `host.now_millis()` | milliseconds since the Unix epoch |
//! | `host.version` | host version string |

use chrono::Utc;
use scriptforge_module_api::{ModuleError, ModuleResult, ScriptModule};
use scriptforge_runtime::mlua;
use scriptforge_runtime::ScriptEngine;
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, info};

/// Name the module registers under.
pub const MODULE_NAME: &str = "core";

/// Global table the module binds into.
pub const TABLE_NAME: &str = "host";

/// Core utility module.
pub struct CoreModule {
    version: String,
    log_target: String,
    messages_logged: Rc<Cell<u64>>,
    initialized: bool,
}

impl CoreModule {
    /// Create the module, reporting `version` to scripts.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            log_target: "script".to_string(),
            messages_logged: Rc::new(Cell::new(0)),
            initialized: false,
        }
    }

    /// Tag attached to every script log line, `script` by default.
    pub fn with_log_target(mut self, target: impl Into<String>) -> Self {
        self.log_target = target.into();
        self
    }

    /// Tag attached to every script log line.
    pub fn log_target(&self) -> &str {
        &self.log_target
    }

    /// Number of messages scripts logged through `host.log`.
    pub fn messages_logged(&self) -> u64 {
        self.messages_logged.get()
    }

    /// Whether `initialize` ran and `shutdown` has not.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

fn log_script_message(target: &str, level: &str, message: &str) -> mlua::Result<()> {
    match level {
        "trace" => tracing::trace!(source = %target, "{}", message),
        "debug" => tracing::debug!(source = %target, "{}", message),
        "info" => tracing::info!(source = %target, "{}", message),
        "warn" => tracing::warn!(source = %target, "{}", message),
        "error" => tracing::error!(source = %target, "{}", message),
        other => {
            return Err(mlua::Error::runtime(format!(
                "unknown log level '{}' (expected trace, debug, info, warn or error)",
                other
            )))
        }
    }
    Ok(())
}

impl ScriptModule for CoreModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn priority(&self) -> i32 {
        0
    }

    fn initialize(&mut self) -> ModuleResult<()> {
        if self.log_target.is_empty() {
            return Err(ModuleError::failed("log target cannot be empty"));
        }
        self.messages_logged.set(0);
        self.initialized = true;
        Ok(())
    }

    fn register_api(&mut self, engine: &ScriptEngine) -> ModuleResult<()> {
        let lua = engine.lua();
        let host = engine.register_table(TABLE_NAME)?;

        let target = self.log_target.clone();
        let counter = Rc::clone(&self.messages_logged);
        host.set(
            "log",
            lua.create_function(move |_, (level, message): (String, String)| {
                log_script_message(&target, &level, &message)?;
                counter.set(counter.get() + 1);
                Ok(())
            })?,
        )?;

        host.set(
            "time",
            lua.create_function(|_, ()| Ok(Utc::now().to_rfc3339()))?,
        )?;

        host.set(
            "now_millis",
            lua.create_function(|_, ()| Ok(Utc::now().timestamp_millis()))?,
        )?;

        host.set("version", self.version.as_str())?;

        debug!("Bound '{}' table", TABLE_NAME);
        Ok(())
    }

    fn shutdown(&mut self) -> ModuleResult<()> {
        info!(
            "Core module shutting down after {} script log message(s)",
            self.messages_logged.get()
        );
        self.initialized = false;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
