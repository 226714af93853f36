//! Integration tests for scriptforge-module-api.
//!
//! These tests cover:
//! - Full lifecycle: register → initialize_all → late register → shutdown_all
//! - Fault isolation between modules, including panicking hooks
//! - Modules binding real functions into the shared engine
//! - The log entries emitted for lifecycle failures

use scriptforge_module_api::{
    LifecycleStage, ModuleError, ModuleRegistry, ModuleResult, ModuleState, ScriptModule,
};
use scriptforge_runtime::{ScriptEngine, ScriptSource};
use std::any::Any;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

// ==============================================================================
// Test Fixture Helpers
// ==============================================================================

type Journal = Rc<RefCell<Vec<String>>>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Fault {
    Healthy,
    InitializeError,
    RegisterApiError,
    InitializePanic,
}

/// A module that journals its hooks and binds `<name>_ping()` into the engine.
struct JournalModule {
    name: String,
    priority: i32,
    deprecated: bool,
    fault: Fault,
    journal: Journal,
}

impl JournalModule {
    fn new(name: &str, priority: i32, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            priority,
            deprecated: false,
            fault: Fault::Healthy,
            journal: Rc::clone(journal),
        }
    }

    fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = fault;
        self
    }

    fn mark_deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    fn record(&self, stage: &str) {
        self.journal
            .borrow_mut()
            .push(format!("{}:{}", stage, self.name));
    }
}

impl ScriptModule for JournalModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn deprecated(&self) -> bool {
        self.deprecated
    }

    fn initialize(&mut self) -> ModuleResult<()> {
        self.record("initialize");
        match self.fault {
            Fault::InitializeError => Err(ModuleError::failed("boom")),
            Fault::InitializePanic => panic!("initialize exploded"),
            _ => Ok(()),
        }
    }

    fn register_api(&mut self, engine: &ScriptEngine) -> ModuleResult<()> {
        self.record("register_api");
        if self.fault == Fault::RegisterApiError {
            return Err(ModuleError::failed("boom"));
        }

        let reply = self.name.clone();
        let ping = engine
            .lua()
            .create_function(move |_, ()| Ok(reply.clone()))?;
        engine.register_function(&format!("{}_ping", self.name), ping)?;
        Ok(())
    }

    fn shutdown(&mut self) -> ModuleResult<()> {
        self.record("shutdown");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn new_journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

fn visited(journal: &Journal, stage: &str) -> Vec<String> {
    let prefix = format!("{}:", stage);
    journal
        .borrow()
        .iter()
        .filter_map(|line| line.strip_prefix(&prefix).map(str::to_string))
        .collect()
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with logs captured, returning the formatted output.
fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    buffer.contents()
}

// ==============================================================================
// Ordering
// ==============================================================================

#[test]
fn test_priority_then_registration_order() {
    let journal = new_journal();
    let mut registry = ModuleRegistry::new(Rc::new(ScriptEngine::new()));

    registry.register(JournalModule::new("world", 10, &journal));
    registry.register(JournalModule::new("economy", 5, &journal));
    registry.register(JournalModule::new("npc", 5, &journal));

    assert_eq!(registry.initialization_order(), vec!["economy", "npc", "world"]);
    assert_eq!(registry.shutdown_order(), vec!["world", "npc", "economy"]);

    registry.initialize_all();
    registry.shutdown_all();

    assert_eq!(visited(&journal, "initialize"), vec!["economy", "npc", "world"]);
    assert_eq!(visited(&journal, "shutdown"), vec!["world", "npc", "economy"]);
}

#[test]
fn test_many_equal_priorities_keep_registration_order() {
    let journal = new_journal();
    let mut registry = ModuleRegistry::new(Rc::new(ScriptEngine::new()));

    let names: Vec<String> = (0..32).map(|i| format!("m{:02}", i)).collect();
    for (i, name) in names.iter().enumerate() {
        let priority = if i % 2 == 0 { 1 } else { 2 };
        registry.register(JournalModule::new(name, priority, &journal));
    }

    registry.initialize_all();

    let expected: Vec<String> = names
        .iter()
        .step_by(2)
        .chain(names.iter().skip(1).step_by(2))
        .cloned()
        .collect();
    assert_eq!(visited(&journal, "initialize"), expected);
}

// ==============================================================================
// Fault Isolation
// ==============================================================================

#[test]
fn test_register_api_failure_does_not_block_later_module() {
    let journal = new_journal();
    let mut registry = ModuleRegistry::new(Rc::new(ScriptEngine::new()));

    registry.register(JournalModule::new("broken", 1, &journal).with_fault(Fault::RegisterApiError));
    registry.register(JournalModule::new("healthy", 2, &journal));

    let logs = capture_logs(|| registry.initialize_all());

    assert!(registry.is_initialized());
    assert_eq!(registry.state_of("healthy"), ModuleState::Initialized);
    assert_eq!(
        registry.state_of("broken"),
        ModuleState::Failed(LifecycleStage::RegisterApi)
    );

    let lifecycle_errors: Vec<&str> = logs
        .lines()
        .filter(|line| line.contains("Module lifecycle error"))
        .collect();
    assert_eq!(lifecycle_errors.len(), 1);
    assert!(lifecycle_errors[0].contains("broken"));
    assert!(lifecycle_errors[0].contains("boom"));
    assert!(lifecycle_errors[0].contains("ERROR"));

    assert_eq!(registry.failures().len(), 1);
    assert_eq!(registry.failures()[0].module, "broken");
    assert_eq!(registry.failures()[0].message, "boom");
}

#[test]
fn test_panicking_module_is_isolated() {
    let journal = new_journal();
    let mut registry = ModuleRegistry::new(Rc::new(ScriptEngine::new()));

    registry.register(JournalModule::new("panics", 1, &journal).with_fault(Fault::InitializePanic));
    registry.register(JournalModule::new("after", 2, &journal));
    registry.initialize_all();

    assert_eq!(
        registry.state_of("panics"),
        ModuleState::Failed(LifecycleStage::Initialize)
    );
    assert_eq!(registry.state_of("after"), ModuleState::Initialized);
    assert!(registry.failures()[0].message.contains("initialize exploded"));
}

#[test]
fn test_all_modules_failing_still_initializes_registry() {
    let journal = new_journal();
    let mut registry = ModuleRegistry::new(Rc::new(ScriptEngine::new()));

    registry.register(JournalModule::new("a", 1, &journal).with_fault(Fault::InitializeError));
    registry.register(JournalModule::new("b", 2, &journal).with_fault(Fault::RegisterApiError));
    registry.initialize_all();

    assert!(registry.is_initialized());
    assert_eq!(registry.failures().len(), 2);

    registry.shutdown_all();
    assert!(visited(&journal, "shutdown").is_empty());
}

// ==============================================================================
// Registration
// ==============================================================================

#[test]
fn test_duplicate_name_rejected() {
    let journal = new_journal();
    let mut registry = ModuleRegistry::new(Rc::new(ScriptEngine::new()));

    assert!(registry.register(JournalModule::new("ui", 1, &journal)));
    let logs = capture_logs(|| {
        assert!(!registry.register(JournalModule::new("ui", 2, &journal)));
    });

    assert_eq!(registry.len(), 1);
    assert!(logs.contains("already registered"));
}

#[test]
fn test_deprecated_module_still_registers() {
    let journal = new_journal();
    let mut registry = ModuleRegistry::new(Rc::new(ScriptEngine::new()));

    let logs = capture_logs(|| {
        assert!(registry.register(JournalModule::new("legacy", 1, &journal).mark_deprecated()));
    });

    assert!(logs.contains("deprecated"));
    assert!(registry.list_modules()[0].deprecated);
    registry.initialize_all();
    assert_eq!(registry.state_of("legacy"), ModuleState::Initialized);
}

#[test]
fn test_late_registration_binds_immediately() {
    let journal = new_journal();
    let engine = Rc::new(ScriptEngine::new());
    let mut registry = ModuleRegistry::new(Rc::clone(&engine));

    registry.register(JournalModule::new("early", 1, &journal));
    registry.initialize_all();
    assert!(!engine.has_function("late_ping"));

    registry.register(JournalModule::new("late", 0, &journal));
    assert_eq!(registry.state_of("late"), ModuleState::Initialized);
    assert!(engine.has_function("late_ping"));
    assert_eq!(visited(&journal, "initialize"), vec!["early", "late"]);
}

// ==============================================================================
// Engine Bindings
// ==============================================================================

#[test]
fn test_modules_bind_into_shared_engine() {
    let journal = new_journal();
    let engine = Rc::new(ScriptEngine::new());
    let mut registry = ModuleRegistry::new(Rc::clone(&engine));

    registry.register(JournalModule::new("economy", 1, &journal));
    registry.register(JournalModule::new("npc", 2, &journal));
    registry.initialize_all();

    engine
        .load(&ScriptSource::new(
            "t.lua",
            "t.lua",
            "answer = economy_ping() .. '+' .. npc_ping()",
        ))
        .unwrap();
    let answer: String = engine.lua().globals().get("answer").unwrap();
    assert_eq!(answer, "economy+npc");
}

#[test]
fn test_typed_lookup() {
    let journal = new_journal();
    let mut registry = ModuleRegistry::new(Rc::new(ScriptEngine::new()));
    registry.register(JournalModule::new("first", 3, &journal));
    registry.register(JournalModule::new("second", 1, &journal));

    let module = registry.get_module_as::<JournalModule>().unwrap();
    assert_eq!(module.name, "first");
    assert!(journal.borrow().is_empty());
}
