//! # scriptforge-host
//!
//! Runs one Lua script against the built-in modules.
//!
//! The host is responsible for:
//! - Registering and initializing modules in priority order
//! - Loading the entry script and ticking its `on_tick(dt)` hook
//! - Turning every script failure into a readable error report
//! - Shutting modules down in reverse order on exit
//!
//! ## Configuration
//!
//! The host reads configuration from `$XDG_CONFIG_HOME/scriptforge/config.toml`.
//! A script path given on the command line overrides `[scripts]`.
//!
//! ## Running
//!
//! ```bash
//! cargo run --bin scriptforge-host -- scripts/main.lua
//!
//! # With debug logging
//! RUST_LOG=debug cargo run --bin scriptforge-host
//! ```

use anyhow::Result;
use scriptforge_diagnostics::ErrorReport;
use scriptforge_host::{HostConfig, ScriptHost};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let loaded = HostConfig::load_default();
    let log_level = loaded
        .as_ref()
        .map(|config| config.host.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting scriptforge-host v{}", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => {
            info!("Loaded configuration from default path");
            config
        }
        Err(e) => {
            warn!("Failed to load config, using defaults: {:#}", e);
            HostConfig::default()
        }
    };

    let script_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.entry_path());
    let json = config.diagnostics.json;
    let max_ticks = config.host.max_ticks;
    let tick_interval = Duration::from_millis(config.host.tick_interval_ms);

    let mut host = ScriptHost::new(config);
    host.register_builtin_modules();
    host.start();

    for module in host.registry().list_modules() {
        info!(
            "Module: {} (priority {}, {:?}){}",
            module.name,
            module.priority,
            module.state,
            if module.deprecated { " [deprecated]" } else { "" }
        );
    }

    if let Err(report) = host.load_script(&script_path) {
        emit_json(json, &report);
        host.stop();
        anyhow::bail!("{}", report.header());
    }

    info!("Ticking every {:?}; press Ctrl+C to stop", tick_interval);

    let mut interval = tokio::time::interval(tick_interval);
    let mut last_tick = tokio::time::Instant::now();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                info!("Received Ctrl+C");
                break;
            }
            now = interval.tick() => {
                let dt = now.duration_since(last_tick).as_secs_f64();
                last_tick = now;

                if let Some(report) = host.tick(dt) {
                    emit_json(json, &report);
                }

                if max_ticks.is_some_and(|max| host.ticks() >= max) {
                    info!("Reached max_ticks ({})", host.ticks());
                    break;
                }
            }
        }
    }

    info!("Shutting down...");
    if let Some(report) = host.stop() {
        emit_json(json, &report);
    }

    info!("Host stopped");
    Ok(())
}

fn emit_json(enabled: bool, report: &ErrorReport) {
    if !enabled {
        return;
    }
    match report.to_json() {
        Ok(line) => println!("{}", line),
        Err(e) => warn!("Failed to serialize error report: {}", e),
    }
}
