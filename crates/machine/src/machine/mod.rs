//! Machine aggregate and assembly methods.
//!
//! This module defines the root [`Machine`] type that owns every simulated
//! component. It provides:
//! 1. **Ownership:** Cores, cache controllers, interconnects, and the memory
//!    hierarchy, released in reverse construction order on reset or drop.
//! 2. **Assembly callbacks:** `add_core`, `add_controller`,
//!    `declare_connection`, and `attach`, invoked by machine generators while
//!    a template runs.
//! 3. **Run-time fan-out:** TLB flush broadcast, state dumps, statistics
//!    aggregation, and the fallback guest-context binding used at exit.

/// Connection graph declarations and materialization bookkeeping.
pub mod connections;

/// Per-component option store.
pub mod options;

/// Machine assembly from a registered template.
pub mod builder;

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;

use crate::context::{ContextId, ContextPool};
use crate::error::MachineError;
use crate::mem::MemoryHierarchy;
use crate::registry;
use crate::stats::SimStats;
use crate::traits::{CacheController, Core, CoreId, Interconnect, PortKind};

use connections::{ConnectionGraph, ConnectionId};
use options::OptionStore;

pub use builder::assemble;

/// Root aggregate owning all simulated components.
///
/// Field order matters: Rust drops fields in declaration order, and the
/// machine must release interconnects first and cores last, the reverse of
/// construction order.
pub struct Machine {
    name: String,
    interconnects: Vec<Box<dyn Interconnect>>,
    hierarchy: Option<Arc<MemoryHierarchy>>,
    controllers: Vec<Box<dyn CacheController>>,
    controller_index: HashMap<String, usize>,
    cores: Vec<Box<dyn Core>>,
    connections: ConnectionGraph,
    options: OptionStore,
    contexts: ContextPool,
    current_context: Option<ContextId>,
    next_coreid: CoreId,
    initialized: bool,
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.name)
            .field("cores", &self.cores.len())
            .field("controllers", &self.controllers.len())
            .field("interconnects", &self.interconnects.len())
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl Machine {
    /// Creates an empty machine with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interconnects: Vec::new(),
            hierarchy: None,
            controllers: Vec::new(),
            controller_index: HashMap::new(),
            cores: Vec::new(),
            connections: ConnectionGraph::default(),
            options: OptionStore::default(),
            contexts: ContextPool::new(),
            current_context: None,
            next_coreid: 0,
            initialized: false,
        }
    }

    /// Returns the machine name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether assembly has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ── Assembly callbacks (invoked by machine generators) ──────────────

    /// Allocates a new coreid, builds a core of `core_type` named
    /// `instance_prefix || coreid`, and appends it to the cores sequence.
    ///
    /// # Errors
    ///
    /// [`MachineError::UnknownCoreType`] when `core_type` has no registered
    /// builder; any error the factory itself reports.
    pub fn add_core(&mut self, instance_prefix: &str, core_type: &str) -> Result<CoreId, MachineError> {
        let factory = registry::core_types()
            .lookup(core_type)
            .ok_or_else(|| MachineError::UnknownCoreType(core_type.to_string()))?;
        let coreid = self.next_coreid;
        let instance = format!("{instance_prefix}{coreid}");
        let core = (*factory)(self, &instance, coreid)?;
        self.next_coreid += 1;
        self.cores.push(core);
        Ok(coreid)
    }

    /// Builds a controller of `controller_type` named
    /// `instance_prefix || coreid` for the given core and port, appends it,
    /// and indexes it by name for connection resolution.
    ///
    /// # Errors
    ///
    /// [`MachineError::UnknownControllerType`] for an unregistered type,
    /// [`MachineError::DuplicateController`] when the composed name is taken;
    /// any error the factory itself reports.
    pub fn add_controller(
        &mut self,
        coreid: CoreId,
        instance_prefix: &str,
        controller_type: &str,
        port: PortKind,
    ) -> Result<String, MachineError> {
        let factory = registry::controller_types()
            .lookup(controller_type)
            .ok_or_else(|| MachineError::UnknownControllerType(controller_type.to_string()))?;
        let instance = format!("{instance_prefix}{coreid}");
        if self.controller_index.contains_key(&instance) {
            return Err(MachineError::DuplicateController(instance));
        }
        let controller = (*factory)(self, &instance, coreid, port)?;
        let index = self.controllers.len();
        self.controllers.push(controller);
        let _ = self.controller_index.insert(instance.clone(), index);
        Ok(instance)
    }

    /// Declares an empty connection named `instance_prefix || seq_id` for an
    /// interconnect of `interconnect_type` and returns its handle.
    pub fn declare_connection(
        &mut self,
        interconnect_type: &str,
        instance_prefix: &str,
        seq_id: usize,
    ) -> ConnectionId {
        let name = format!("{instance_prefix}{seq_id}");
        self.connections.declare(interconnect_type, name)
    }

    /// Appends a (controller, port) attachment to a declared connection.
    /// Attachment order is preserved and observable by the interconnect.
    pub fn attach(&mut self, connection: ConnectionId, controller_name: &str, port: PortKind) {
        self.connections.attach(connection, controller_name, port);
    }

    /// Claims the next architectural context for `owner`.
    ///
    /// # Errors
    ///
    /// [`MachineError::ContextPoolExhausted`] when no slot is free.
    pub fn claim_context(&mut self, owner: CoreId) -> Result<ContextId, MachineError> {
        self.contexts.claim(owner)
    }

    // ── Component access ────────────────────────────────────────────────

    /// Returns the owned cores in coreid order.
    pub fn cores(&self) -> &[Box<dyn Core>] {
        &self.cores
    }

    /// Returns the owned cores mutably, in coreid order.
    pub fn cores_mut(&mut self) -> &mut [Box<dyn Core>] {
        &mut self.cores
    }

    /// Returns the number of cores.
    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    /// Returns the owned controllers in construction order.
    pub fn controllers(&self) -> &[Box<dyn CacheController>] {
        &self.controllers
    }

    /// Returns the controller registered under `name`.
    pub fn controller(&self, name: &str) -> Option<&dyn CacheController> {
        self.controller_index
            .get(name)
            .map(|&i| self.controllers[i].as_ref())
    }

    /// Returns the owned interconnects in materialization order.
    pub fn interconnects(&self) -> &[Box<dyn Interconnect>] {
        &self.interconnects
    }

    /// Returns the connection graph.
    pub fn connections(&self) -> &ConnectionGraph {
        &self.connections
    }

    /// Returns the option store.
    pub fn options(&self) -> &OptionStore {
        &self.options
    }

    /// Returns the option store mutably. Writable during assembly only by
    /// convention; the driver never writes after the template has run.
    pub fn options_mut(&mut self) -> &mut OptionStore {
        &mut self.options
    }

    /// Returns the context pool.
    pub fn contexts(&self) -> &ContextPool {
        &self.contexts
    }

    /// Returns the memory hierarchy handle, present once assembly completes.
    pub fn hierarchy(&self) -> Option<&Arc<MemoryHierarchy>> {
        self.hierarchy.as_ref()
    }

    // ── Run-time fan-out ────────────────────────────────────────────────

    /// Broadcasts a full TLB flush for `ctx` to every core in coreid order.
    /// Only legal while no cycle is in progress.
    pub fn flush_tlb(&mut self, ctx: ContextId) {
        let Some(context) = self.contexts.get(ctx) else {
            return;
        };
        for core in &mut self.cores {
            core.flush_tlb(context);
        }
    }

    /// Broadcasts a single-address TLB flush for `ctx` to every core in
    /// coreid order. Only legal while no cycle is in progress.
    pub fn flush_tlb_virt(&mut self, ctx: ContextId, vaddr: u64) {
        let Some(context) = self.contexts.get(ctx) else {
            return;
        };
        for core in &mut self.cores {
            core.flush_tlb_virt(context, vaddr);
        }
    }

    /// Sums every core's committed-instruction counter.
    pub fn committed_instructions(&self) -> u64 {
        self.cores.iter().map(|c| c.instructions_committed()).sum()
    }

    /// Returns the currently bound guest context, if any.
    pub fn current_context(&self) -> Option<ContextId> {
        self.current_context
    }

    /// Ensures a guest-context reference is bound so the emulator can resume
    /// cleanly after exit. Returns the binding.
    pub fn bind_fallback_context(&mut self) -> Option<ContextId> {
        if self.current_context.is_none() {
            self.current_context = self.contexts.first_claimed();
        }
        self.current_context
    }

    /// Dumps every core's state and the hierarchy wiring to `w`.
    ///
    /// # Errors
    ///
    /// Propagates write failures from `w`.
    pub fn dump_state(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "machine {} ({} cores)", self.name, self.cores.len())?;
        for core in &self.cores {
            core.dump_state(w)?;
        }
        for controller in &self.controllers {
            controller.dump_info(w)?;
        }
        for interconnect in &self.interconnects {
            interconnect.dump_info(w)?;
        }
        if let Some(hierarchy) = &self.hierarchy {
            hierarchy.dump_info(w)?;
        }
        Ok(())
    }

    /// Folds every core's counters into `stats`.
    pub fn update_stats(&self, stats: &mut SimStats) {
        for core in &self.cores {
            core.update_stats(stats);
        }
    }

    /// Releases all owned components in reverse construction order and
    /// returns the machine to its pre-assembly state.
    pub fn reset(&mut self) {
        self.interconnects.clear();
        self.hierarchy = None;
        self.controllers.clear();
        self.controller_index.clear();
        self.cores.clear();
        self.connections.clear();
        self.options = OptionStore::default();
        self.contexts.release_all();
        self.current_context = None;
        self.next_coreid = 0;
        self.initialized = false;
    }

    // ── Crate-internal assembly plumbing ────────────────────────────────

    /// Installs the hierarchy handle and distributes it to every core and
    /// controller, which were built before the hierarchy existed.
    pub(crate) fn install_hierarchy(&mut self, hierarchy: Arc<MemoryHierarchy>) {
        for core in &mut self.cores {
            core.update_memory_hierarchy(Arc::clone(&hierarchy));
        }
        for controller in &mut self.controllers {
            controller.update_memory_hierarchy(Arc::clone(&hierarchy));
        }
        self.hierarchy = Some(hierarchy);
    }

    pub(crate) fn controller_mut(&mut self, name: &str) -> Option<&mut Box<dyn CacheController>> {
        self.controller_index
            .get(name)
            .copied()
            .map(|i| &mut self.controllers[i])
    }

    pub(crate) fn push_interconnect(&mut self, interconnect: Box<dyn Interconnect>) {
        self.interconnects.push(interconnect);
    }

    pub(crate) fn mark_connections_materialized(&mut self) {
        self.connections.mark_materialized();
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    /// Splits the machine into the core slice and the hierarchy handle for
    /// the threaded engine, which borrows the cores across worker threads
    /// while the orchestrator clocks the hierarchy.
    pub(crate) fn cores_and_hierarchy(
        &mut self,
    ) -> (&mut [Box<dyn Core>], Option<Arc<MemoryHierarchy>>) {
        (self.cores.as_mut_slice(), self.hierarchy.clone())
    }
}
