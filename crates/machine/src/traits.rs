//! Component contracts consumed by the driver.
//!
//! This module defines the traits implemented by all machine components. It provides:
//! 1. **`Core`:** The per-cycle advancement contract, termination voting, TLB
//!    flush fan-out targets, and stats hooks.
//! 2. **`CacheController` / `Interconnect`:** The two sides of the symmetric
//!    registration performed when connections are materialized.
//! 3. **`PortKind`:** The port type tag attached to controller and interconnect
//!    registrations.
//!
//! All implementors must be `Send`: in threaded simulation each core is advanced
//! by its owning worker thread, and controllers and interconnects are wired from
//! the orchestrator.

use std::io::{self, Write};
use std::sync::Arc;

use crate::context::Context;
use crate::mem::MemoryHierarchy;
use crate::stats::SimStats;

/// Small integer identifying a core; equals the core's position in the
/// machine's cores sequence and is stable for the machine's lifetime.
pub type CoreId = usize;

/// Port type tag carried by controller and interconnect registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// Instruction-side port of a core.
    Instruction,
    /// Data-side port of a core.
    Data,
    /// Upper (core-facing) side of an interconnect.
    Upper,
    /// Lower (memory-facing) side of an interconnect.
    Lower,
}

/// Trait for simulated cores owned by the machine.
///
/// The driver holds cores in coreid order and advances each exactly once per
/// cycle. Everything else about a core is opaque.
pub trait Core: Send {
    /// Returns this core's identifier.
    fn coreid(&self) -> CoreId;

    /// Resets microarchitectural state. Called once at the end of assembly.
    fn reset(&mut self);

    /// Picks up context rebinding performed by the emulator between runs.
    fn check_context_changes(&mut self);

    /// Advances the core by one cycle; returns `true` to vote for
    /// termination of the whole simulation.
    fn runcycle(&mut self) -> bool;

    /// Flushes all TLB state for the given context.
    fn flush_tlb(&mut self, ctx: &Context);

    /// Flushes TLB state for one virtual address of the given context.
    fn flush_tlb_virt(&mut self, ctx: &Context, vaddr: u64);

    /// Returns the number of user instructions this core has committed.
    fn instructions_committed(&self) -> u64;

    /// Installs the memory hierarchy handle. Called once the hierarchy
    /// exists, which is strictly after core construction.
    fn update_memory_hierarchy(&mut self, hierarchy: Arc<MemoryHierarchy>);

    /// Writes a human-readable dump of the core's state.
    ///
    /// # Errors
    ///
    /// Propagates write failures from `w`.
    fn dump_state(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Folds this core's counters into the driver statistics.
    fn update_stats(&self, stats: &mut SimStats);
}

/// Trait for cache controllers owned by the machine.
pub trait CacheController: Send {
    /// Returns the controller's instance name.
    fn name(&self) -> &str;

    /// Returns the core this controller serves.
    fn coreid(&self) -> CoreId;

    /// Returns the port type tag the controller was built with.
    fn port(&self) -> PortKind;

    /// Records an interconnect attached to this controller. One half of the
    /// mandatory symmetric registration; implementations may reject later
    /// traffic if it is missing.
    fn register_interconnect(&mut self, interconnect: &str, port: PortKind);

    /// Installs the memory hierarchy handle. Called once the hierarchy
    /// exists, which is strictly after controller construction.
    fn update_memory_hierarchy(&mut self, hierarchy: Arc<MemoryHierarchy>);

    /// Writes a human-readable dump of the controller's wiring.
    ///
    /// # Errors
    ///
    /// Propagates write failures from `w`.
    fn dump_info(&self, w: &mut dyn Write) -> io::Result<()>;
}

/// Trait for interconnects materialized from the connection graph.
pub trait Interconnect: Send {
    /// Returns the interconnect's instance name.
    fn name(&self) -> &str;

    /// Records a controller attached to this interconnect, in declaration
    /// order. The other half of the symmetric registration.
    fn register_controller(&mut self, controller: &str, port: PortKind);

    /// Writes a human-readable dump of the interconnect's wiring.
    ///
    /// # Errors
    ///
    /// Propagates write failures from `w`.
    fn dump_info(&self, w: &mut dyn Write) -> io::Result<()>;
}
