//! Runtime Configuration
//!
//! Knobs that affect the scheduler and diagnostics. The configuration is
//! installed per thread, matching the single-threaded event-loop model the
//! scheduler runs under.

use std::cell::RefCell;

use serde::Deserialize;

/// Tunable runtime behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How many times one job may run within a single flush before the flush
    /// is aborted with [`RuntimeError::RecursionLimit`](crate::RuntimeError).
    pub recursion_limit: usize,

    /// Emit a warning when code writes through a readonly proxy.
    pub warn_readonly_writes: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            recursion_limit: 100,
            warn_readonly_writes: true,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

thread_local! {
    static CONFIG: RefCell<RuntimeConfig> = RefCell::new(RuntimeConfig::default());
}

/// Install the configuration for the current thread.
pub fn set_runtime_config(config: RuntimeConfig) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

/// The configuration active on the current thread.
pub fn runtime_config() -> RuntimeConfig {
    CONFIG.with(|c| c.borrow().clone())
}
