//! Module registry bound to one engine.
//!
//! The registry owns its modules, drives them through their lifecycle in
//! priority order and isolates their failures from each other.

use crate::module::{LifecycleStage, ModuleError, ModuleResult, ModuleState, ScriptModule};
use scriptforge_runtime::ScriptEngine;
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use tracing::{debug, error, info, warn};

/// `name`, `priority` and `deprecated` are read once, at registration, and
/// stay fixed for the module's lifetime in the registry.
struct ModuleEntry {
    module: Box<dyn ScriptModule>,
    name: String,
    priority: i32,
    deprecated: bool,
    /// Registration sequence, the tie-break for equal priorities.
    sequence: u64,
    state: ModuleState,
}

/// A lifecycle hook failure caught by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleFailure {
    pub module: String,
    pub stage: LifecycleStage,
    pub message: String,
}

/// Information about a registered module.
///
/// `priority` and `deprecated` are the values captured at registration, the
/// ones that decide the lifecycle order.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub priority: i32,
    pub deprecated: bool,
    pub state: ModuleState,
}

/// Registry for the capability modules of one engine.
pub struct ModuleRegistry {
    /// Engine shared by every module for the registry's lifetime.
    engine: Rc<ScriptEngine>,

    /// Modules in registration order.
    modules: Vec<ModuleEntry>,

    initialized: bool,
    next_sequence: u64,
    failures: Vec<LifecycleFailure>,
}

impl ModuleRegistry {
    /// Create an empty registry bound to `engine`.
    pub fn new(engine: Rc<ScriptEngine>) -> Self {
        Self {
            engine,
            modules: Vec::new(),
            initialized: false,
            next_sequence: 0,
            failures: Vec::new(),
        }
    }

    /// The engine modules register into.
    pub fn engine(&self) -> &Rc<ScriptEngine> {
        &self.engine
    }

    /// Register a module.
    ///
    /// Returns `false` and changes nothing if the name is taken. Once the
    /// registry is initialized the module is brought up right away; a
    /// failure there is logged and the module stays registered.
    pub fn register<M: ScriptModule>(&mut self, module: M) -> bool {
        self.register_boxed(Box::new(module))
    }

    /// Register an already boxed module.
    pub fn register_boxed(&mut self, module: Box<dyn ScriptModule>) -> bool {
        let name = module.name().to_string();

        if self.contains(&name) {
            warn!(module = %name, "Module '{}' is already registered", name);
            return false;
        }

        let priority = module.priority();
        let deprecated = module.deprecated();
        if deprecated {
            warn!(module = %name, "Module '{}' is deprecated", name);
        }

        self.modules.push(ModuleEntry {
            module,
            name: name.clone(),
            priority,
            deprecated,
            sequence: self.next_sequence,
            state: ModuleState::Registered,
        });
        self.next_sequence += 1;

        info!(module = %name, priority, "Registered module");

        if self.initialized {
            debug!(module = %name, "Registry already initialized, bringing module up");
            self.bring_up(self.modules.len() - 1);
        }

        true
    }

    /// Initialize every waiting module in priority order.
    ///
    /// No-op when already initialized. A failing module is skipped and the
    /// pass continues; the registry counts as initialized afterwards either way.
    pub fn initialize_all(&mut self) {
        if self.initialized {
            debug!("Module registry already initialized");
            return;
        }

        let pending: Vec<usize> = self
            .ordered_indices()
            .into_iter()
            .filter(|&index| {
                matches!(
                    self.modules[index].state,
                    ModuleState::Registered | ModuleState::ShutDown
                )
            })
            .collect();

        info!("Initializing {} module(s)", pending.len());
        for index in pending {
            self.bring_up(index);
        }

        self.initialized = true;

        let ready = self
            .modules
            .iter()
            .filter(|entry| entry.state == ModuleState::Initialized)
            .count();
        info!(
            "Module initialization complete: {} of {} ready",
            ready,
            self.modules.len()
        );
    }

    /// Shut down every initialized module in reverse initialization order.
    ///
    /// No-op when not initialized. Failures are logged and recorded.
    pub fn shutdown_all(&mut self) {
        if !self.initialized {
            debug!("Module registry not initialized, nothing to shut down");
            return;
        }

        for index in self.ordered_indices().into_iter().rev() {
            let entry = &mut self.modules[index];
            if entry.state != ModuleState::Initialized {
                continue;
            }

            match guarded(|| entry.module.shutdown()) {
                Ok(()) => {
                    entry.state = ModuleState::ShutDown;
                    info!(module = %entry.name, "Module shut down");
                }
                Err(e) => {
                    entry.state = ModuleState::Failed(LifecycleStage::Shutdown);
                    let name = entry.name.clone();
                    self.record_failure(name, LifecycleStage::Shutdown, e);
                }
            }
        }

        self.initialized = false;
        info!("Module registry shut down");
    }

    /// Whether `initialize_all` has run since the last shutdown.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Get a module by name.
    pub fn get_module(&self, name: &str) -> Option<&dyn ScriptModule> {
        self.entry(name).map(|entry| entry.module.as_ref())
    }

    /// Get a mutable module by name.
    pub fn get_module_mut(&mut self, name: &str) -> Option<&mut dyn ScriptModule> {
        self.modules
            .iter_mut()
            .find(|entry| entry.name == name)
            .map(|entry| entry.module.as_mut())
    }

    /// Get the first module, in registration order, of concrete type `T`.
    pub fn get_module_as<T: ScriptModule>(&self) -> Option<&T> {
        self.modules
            .iter()
            .find_map(|entry| entry.module.as_any().downcast_ref::<T>())
    }

    /// Mutable variant of [`get_module_as`](Self::get_module_as).
    pub fn get_module_as_mut<T: ScriptModule>(&mut self) -> Option<&mut T> {
        self.modules
            .iter_mut()
            .find_map(|entry| entry.module.as_any_mut().downcast_mut::<T>())
    }

    /// Lifecycle state of a module; `Unregistered` for unknown names.
    pub fn state_of(&self, name: &str) -> ModuleState {
        self.entry(name)
            .map_or(ModuleState::Unregistered, |entry| entry.state)
    }

    /// Check if a module with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Get the number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if no module is registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Module names in registration order.
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// Module names in the order `initialize_all` visits them.
    pub fn initialization_order(&self) -> Vec<&str> {
        self.ordered_indices()
            .into_iter()
            .map(|index| self.modules[index].name.as_str())
            .collect()
    }

    /// Module names in the order `shutdown_all` visits them.
    pub fn shutdown_order(&self) -> Vec<&str> {
        let mut order = self.initialization_order();
        order.reverse();
        order
    }

    /// Every lifecycle failure caught so far, oldest first.
    pub fn failures(&self) -> &[LifecycleFailure] {
        &self.failures
    }

    /// List module information in registration order.
    pub fn list_modules(&self) -> Vec<ModuleInfo> {
        self.modules
            .iter()
            .map(|entry| ModuleInfo {
                name: entry.name.clone(),
                priority: entry.priority,
                deprecated: entry.deprecated,
                state: entry.state,
            })
            .collect()
    }

    fn entry(&self, name: &str) -> Option<&ModuleEntry> {
        self.modules.iter().find(|entry| entry.name == name)
    }

    /// Indices sorted by `(priority, sequence)`.
    ///
    /// The key is unique per module, so the order does not depend on the
    /// stability of the sort.
    fn ordered_indices(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.modules.len()).collect();
        order.sort_by_key(|&index| {
            let entry = &self.modules[index];
            (entry.priority, entry.sequence)
        });
        order
    }

    /// Run `initialize` then `register_api` for one module.
    fn bring_up(&mut self, index: usize) {
        let engine = &self.engine;
        let entry = &mut self.modules[index];

        let outcome = guarded(|| entry.module.initialize())
            .map_err(|e| (LifecycleStage::Initialize, e))
            .and_then(|()| {
                guarded(|| entry.module.register_api(engine))
                    .map_err(|e| (LifecycleStage::RegisterApi, e))
            });

        match outcome {
            Ok(()) => {
                entry.state = ModuleState::Initialized;
                info!(module = %entry.name, priority = entry.priority, "Module initialized");
            }
            Err((stage, e)) => {
                entry.state = ModuleState::Failed(stage);
                let name = entry.name.clone();
                self.record_failure(name, stage, e);
            }
        }
    }

    fn record_failure(&mut self, module: String, stage: LifecycleStage, e: ModuleError) {
        error!(
            module = %module,
            stage = %stage,
            "Module lifecycle error in '{}' during {}: {}",
            module,
            stage,
            e
        );
        self.failures.push(LifecycleFailure {
            module,
            stage,
            message: e.to_string(),
        });
    }
}

/// Call a lifecycle hook, turning a panic into a `ModuleError`.
fn guarded<F>(hook: F) -> ModuleResult<()>
where
    F: FnOnce() -> ModuleResult<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(result) => result,
        Err(payload) => Err(ModuleError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
