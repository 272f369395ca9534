//! Builder registries for machine templates, cores, controllers, and interconnects.
//!
//! This module implements the plugin registration surface. It provides:
//! 1. **`Registry`:** A process-global map from string key to factory.
//! 2. **Singletons:** One registry each for machine templates, core types,
//!    cache-controller types, and interconnect types.
//!
//! Registries must be populated before the assembler runs; the standard pattern
//! is an explicit registration call from the program entry point (see
//! [`crate::models::register_builtins`]). Registering the same key twice
//! replaces the prior entry (last wins). Keys are case-sensitive. Lookups
//! return the factory without instantiating anything; absence at lookup time is
//! a fatal configuration error reported by the assembler.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::error::MachineError;
use crate::machine::Machine;
use crate::mem::MemoryHierarchy;
use crate::traits::{CacheController, Core, CoreId, Interconnect, PortKind};

/// Machine generator: populates a machine from a template by calling back into
/// the assembly methods.
pub type MachineGenerator = dyn Fn(&mut Machine) -> Result<(), MachineError> + Send + Sync;

/// Core factory: builds a core bound to the given machine, instance name, and
/// coreid.
pub type CoreFactory =
    dyn Fn(&mut Machine, &str, CoreId) -> Result<Box<dyn Core>, MachineError> + Send + Sync;

/// Controller factory: builds a cache controller bound to the given machine,
/// instance name, coreid, and port type tag. The memory hierarchy handle is
/// installed later, once it exists.
pub type ControllerFactory = dyn Fn(&mut Machine, &str, CoreId, PortKind) -> Result<Box<dyn CacheController>, MachineError>
    + Send
    + Sync;

/// Interconnect factory: builds an interconnect bound to the given instance
/// name and memory hierarchy.
pub type InterconnectFactory =
    dyn Fn(&str, &Arc<MemoryHierarchy>) -> Result<Box<dyn Interconnect>, MachineError>
        + Send
        + Sync;

/// Process-global map from string key to factory.
///
/// Factories are retained for the process lifetime.
pub struct Registry<F: ?Sized> {
    kind: &'static str,
    entries: RwLock<HashMap<String, Arc<F>>>,
}

impl<F: ?Sized> std::fmt::Debug for Registry<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("keys", &self.keys())
            .finish()
    }
}

impl<F: ?Sized> Registry<F> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `factory` under `key`, replacing any prior entry.
    pub fn register(&self, key: impl Into<String>, factory: Arc<F>) {
        let key = key.into();
        let prior = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), factory);
        if prior.is_some() {
            tracing::debug!(kind = self.kind, key, "replaced registry entry");
        }
    }

    /// Returns the factory registered under `key`, if any.
    pub fn lookup(&self, key: &str) -> Option<Arc<F>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Returns whether `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Returns the registered keys, sorted for deterministic diagnostics.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

/// Returns the machine template registry.
pub fn machine_templates() -> &'static Registry<MachineGenerator> {
    static REGISTRY: OnceLock<Registry<MachineGenerator>> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry::new("machine"))
}

/// Returns the core type registry.
pub fn core_types() -> &'static Registry<CoreFactory> {
    static REGISTRY: OnceLock<Registry<CoreFactory>> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry::new("core"))
}

/// Returns the cache-controller type registry.
pub fn controller_types() -> &'static Registry<ControllerFactory> {
    static REGISTRY: OnceLock<Registry<ControllerFactory>> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry::new("controller"))
}

/// Returns the interconnect type registry.
pub fn interconnect_types() -> &'static Registry<InterconnectFactory> {
    static REGISTRY: OnceLock<Registry<InterconnectFactory>> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry::new("interconnect"))
}
