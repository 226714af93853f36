//! The engine handle shared by every module bound to one interpreter.

use crate::error::{RuntimeError, RuntimeResult};
use crate::exception::ScriptError;
use crate::script::ScriptSource;
use mlua::{Function, IntoLuaMulti, Lua, Table, Value};
use tracing::debug;

/// One embedded Lua interpreter.
///
/// Modules bind their functions into the globals of this engine during
/// `register_api`; the host loads scripts and calls hooks through it.
pub struct ScriptEngine {
    lua: Lua,
}

impl ScriptEngine {
    /// Create a fresh interpreter with the standard libraries loaded.
    pub fn new() -> Self {
        Self { lua: Lua::new() }
    }

    /// Access the underlying interpreter to create functions and values.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Bind a function as a global.
    pub fn register_function(&self, name: &str, function: Function) -> RuntimeResult<()> {
        debug!(function = %name, "Binding global function");
        self.lua.globals().set(name, function)?;
        Ok(())
    }

    /// Get the global table `name`, creating it when absent.
    ///
    /// Several modules may contribute to the same namespace table.
    pub fn register_table(&self, name: &str) -> RuntimeResult<Table> {
        let globals = self.lua.globals();
        match globals.get::<Value>(name)? {
            Value::Table(table) => Ok(table),
            Value::Nil => {
                let table = self.lua.create_table()?;
                globals.set(name, table.clone())?;
                debug!(table = %name, "Created global table");
                Ok(table)
            }
            other => Err(RuntimeError::Binding(format!(
                "global '{}' is already a {}",
                name,
                other.type_name()
            ))),
        }
    }

    /// Run a script's top-level chunk.
    pub fn load(&self, source: &ScriptSource) -> Result<(), ScriptError> {
        debug!(script = %source.name(), "Loading script");
        self.lua
            .load(source.code())
            .set_name(source.chunk_name())
            .exec()
            .map_err(|e| ScriptError::from_lua(&e))
    }

    /// Check whether a global function is defined.
    pub fn has_function(&self, name: &str) -> bool {
        matches!(self.lua.globals().get::<Value>(name), Ok(Value::Function(_)))
    }

    /// Call the global hook `name` if the script defines it.
    ///
    /// Returns `Ok(false)` when there is no such function.
    pub fn call_hook(&self, name: &str, args: impl IntoLuaMulti) -> Result<bool, ScriptError> {
        let hook = match self.lua.globals().get::<Value>(name) {
            Ok(Value::Function(hook)) => hook,
            Ok(_) => return Ok(false),
            Err(e) => return Err(ScriptError::from_lua(&e)),
        };

        hook.call::<()>(args).map_err(|e| ScriptError::from_lua(&e))?;
        Ok(true)
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}
