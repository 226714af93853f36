//! Scriptforge host library
//!
//! This module exports the host components for the binary and for testing.

pub mod config;
pub mod host;

pub use config::HostConfig;
pub use host::{ScriptHost, SHUTDOWN_HOOK, TICK_HOOK};
