//! # scriptforge-module-api
//!
//! Capability modules and the registry that drives their lifecycle.
//!
//! A module exposes one slice of host functionality to scripts. It
//! implements [`ScriptModule`] and is handed to the [`ModuleRegistry`]
//! bound to one [`ScriptEngine`](scriptforge_runtime::ScriptEngine):
//!
//! - `initialize_all` brings modules up in `(priority, registration order)`
//! - modules registered afterwards are brought up immediately
//! - `shutdown_all` tears them down in the exact reverse order
//!
//! A failing module is logged, recorded and skipped. It never stops the
//! other modules and never surfaces as an error to the caller.

pub mod module;
pub mod registry;

pub use module::{
    LifecycleStage, ModuleError, ModuleResult, ModuleState, ScriptModule, DEFAULT_PRIORITY,
};
pub use registry::{LifecycleFailure, ModuleInfo, ModuleRegistry};
