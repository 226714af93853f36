//! The script host: one engine, its module registry and the loaded script.

use crate::config::HostConfig;
use module_core::CoreModule;
use scriptforge_diagnostics::{ErrorDiagnostics, ErrorReport};
use scriptforge_module_api::{ModuleRegistry, ScriptModule};
use scriptforge_runtime::mlua::IntoLuaMulti;
use scriptforge_runtime::{ScriptEngine, ScriptError, ScriptSource};
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Hook called once per host tick with the elapsed seconds.
pub const TICK_HOOK: &str = "on_tick";

/// Hook called before modules shut down.
pub const SHUTDOWN_HOOK: &str = "on_shutdown";

/// The current script, with the diagnostics bound to its source.
struct LoadedScript {
    source: ScriptSource,
    diagnostics: ErrorDiagnostics,
}

/// Runs scripts against a set of modules sharing one engine.
///
/// Script failures never escape the host: each one becomes an
/// [`ErrorReport`] that is logged and handed back to the caller.
pub struct ScriptHost {
    config: HostConfig,
    registry: ModuleRegistry,
    script: Option<LoadedScript>,
    ticks: u64,
}

impl ScriptHost {
    /// Create a host with a fresh engine and no modules.
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            registry: ModuleRegistry::new(Rc::new(ScriptEngine::new())),
            script: None,
            ticks: 0,
        }
    }

    /// Host configuration.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// The shared engine.
    pub fn engine(&self) -> &Rc<ScriptEngine> {
        self.registry.engine()
    }

    /// Module registry.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Module registry, mutably.
    pub fn registry_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.registry
    }

    /// Register a module. Returns `false` for a duplicate name.
    pub fn register_module<M: ScriptModule>(&mut self, module: M) -> bool {
        self.registry.register(module)
    }

    /// Register the modules shipped with the host, skipping disabled ones.
    pub fn register_builtin_modules(&mut self) {
        let core = CoreModule::new(env!("CARGO_PKG_VERSION"));
        if self.config.module_enabled(core.name()) {
            self.registry.register(core);
        } else {
            info!(module = %core.name(), "Module disabled by configuration");
        }
    }

    /// Initialize every registered module.
    pub fn start(&mut self) {
        self.registry.initialize_all();

        let failed = self.registry.failures().len();
        if failed > 0 {
            warn!("{} module lifecycle failure(s) during startup", failed);
        }
        info!(
            "Host started with {} module(s): {:?}",
            self.registry.len(),
            self.registry.initialization_order()
        );
    }

    /// Whether a script is loaded.
    pub fn has_script(&self) -> bool {
        self.script.is_some()
    }

    /// Name of the loaded script.
    pub fn script_name(&self) -> Option<&str> {
        self.script.as_ref().map(|loaded| loaded.source.name())
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Load and run the script at `path`, replacing any loaded script.
    ///
    /// A script that cannot be read is reported and the previous script
    /// stays loaded. A script whose top-level chunk fails is reported but
    /// still replaces the previous one: the chunk may already have redefined
    /// hooks, so later failures are diagnosed against the new source.
    pub fn load_script(&mut self, path: &Path) -> Result<(), ErrorReport> {
        let source = match ScriptSource::from_file(path) {
            Ok(source) => source,
            Err(e) => {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let diagnostics = ErrorDiagnostics::new(name, path)
                    .with_window(self.config.context_window());
                return Err(diagnostics.report(&ScriptError::new(e.to_string()), "load"));
            }
        };

        let diagnostics =
            ErrorDiagnostics::for_script(&source).with_window(self.config.context_window());

        let outcome = self.engine().load(&source);
        let loaded = self.script.insert(LoadedScript {
            source,
            diagnostics,
        });

        match outcome {
            Ok(()) => {
                info!(
                    script = %loaded.source.name(),
                    "Loaded script from {}",
                    loaded.source.path().display()
                );
                Ok(())
            }
            Err(failure) => Err(loaded.diagnostics.report(&failure, "load")),
        }
    }

    /// Call the script's `on_tick(dt)` hook.
    ///
    /// Returns the report for a failing tick; the host keeps running.
    pub fn tick(&mut self, dt: f64) -> Option<ErrorReport> {
        self.ticks += 1;
        self.call_hook(TICK_HOOK, dt).err()
    }

    /// Call a global hook of the loaded script if it defines one.
    ///
    /// Returns `Ok(false)` when no script is loaded or the hook is absent.
    pub fn call_hook(&self, name: &str, args: impl IntoLuaMulti) -> Result<bool, ErrorReport> {
        let Some(loaded) = &self.script else {
            return Ok(false);
        };

        self.engine()
            .call_hook(name, args)
            .map_err(|failure| loaded.diagnostics.report(&failure, name))
    }

    /// Run the script's `on_shutdown` hook, then shut every module down.
    ///
    /// Returns the report if the hook failed; modules shut down regardless.
    pub fn stop(&mut self) -> Option<ErrorReport> {
        let report = self.call_hook(SHUTDOWN_HOOK, ()).err();
        self.registry.shutdown_all();
        debug!("Host stopped after {} tick(s)", self.ticks);
        report
    }
}
