//! Machine-level simulation driver for a cycle-accurate multicore simulator.
//!
//! This crate owns the lifecycle of a heterogeneous fleet of simulated cores
//! and the shared memory subsystem, and advances them in lock-step one cycle
//! at a time. It implements:
//! 1. **Registries:** Process-global builder registries for machine templates,
//!    core types, cache-controller types, and interconnect types.
//! 2. **Assembly:** Template-driven machine construction, a declarative
//!    connection graph, and a per-component option store.
//! 3. **Cycle engine:** Sequential and threaded simulation loops with a
//!    two-barrier worker protocol, termination-vote aggregation, statistics
//!    snapshots, and log rotation.
//! 4. **Models:** Builtin reference cores, controllers, interconnects, and
//!    machine templates to run the driver out of the box.
//!
//! A cycle is one `clock()` on the memory hierarchy followed by one
//! `runcycle()` on every core. The instruction-set emulator, real core
//! pipelines, and coherence protocols live behind the contracts in
//! [`traits`]; the driver invokes them and never reimplements them.

/// Process-wide simulation clock.
pub mod clock;
/// Driver configuration (defaults, hierarchical config structures).
pub mod config;
/// Architectural context pool.
pub mod context;
/// Fatal assembly and configuration errors.
pub mod error;
/// Machine aggregate, assembly, connections, and options.
pub mod machine;
/// Memory hierarchy handle clocked between cycle phases.
pub mod mem;
/// Builtin reference models and templates.
pub mod models;
/// Builder registries exposed to plugins.
pub mod registry;
/// Simulation loop, worker pool, and log plumbing.
pub mod sim;
/// Driver statistics and time-series output.
pub mod stats;
/// Component contracts consumed by the driver.
pub mod traits;

/// Root configuration type; use `SimConfig::default()` or deserialize from JSON.
pub use crate::config::SimConfig;
/// Fatal error type for configuration and assembly.
pub use crate::error::MachineError;
/// Root aggregate owning all simulated components.
pub use crate::machine::Machine;
/// Assembles a machine from a registered template.
pub use crate::machine::assemble;
/// Shared memory subsystem clocked once per cycle.
pub use crate::mem::MemoryHierarchy;
/// Registers the builtin models and templates.
pub use crate::models::register_builtins;
/// Cycle engine and its exit reporting.
pub use crate::sim::{CycleEngine, ExitReason, ExitReport};
