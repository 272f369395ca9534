//! Timing core model.
//!
//! A wiring/timing stub that exercises the driver contract: it claims a guest
//! context at construction, commits a configurable number of instructions per
//! cycle, and can vote to terminate after a configured cycle count. Commit
//! behavior comes from the option store:
//!
//! - `commit_rate` (int): instructions committed per cycle; defaults to 0, so
//!   a core with no configured work commits nothing.
//! - `halt_at` (int): cycle count after which the core votes to terminate.

use std::io::{self, Write};
use std::sync::Arc;

use crate::context::{Context, ContextId};
use crate::error::MachineError;
use crate::machine::Machine;
use crate::mem::MemoryHierarchy;
use crate::stats::SimStats;
use crate::traits::{Core, CoreId};

/// Reference core model driven by the option store.
#[derive(Debug)]
pub struct TimingCore {
    name: String,
    coreid: CoreId,
    context: ContextId,
    commit_rate: u64,
    halt_at: Option<u64>,
    cycles: u64,
    committed: u64,
    tlb_flushes: u64,
    hierarchy: Option<Arc<MemoryHierarchy>>,
}

impl TimingCore {
    /// Builds a core named `name` for `coreid`, claiming the next guest
    /// context and reading its options from the machine.
    ///
    /// # Errors
    ///
    /// [`MachineError::ContextPoolExhausted`] when no context slot is free.
    pub fn build(
        machine: &mut Machine,
        name: &str,
        coreid: CoreId,
    ) -> Result<Box<dyn Core>, MachineError> {
        let context = machine.claim_context(coreid)?;
        let options = machine.options();
        let commit_rate = options
            .get_int(name, "commit_rate")
            .map_or(0, |v| v.max(0) as u64);
        let halt_at = options
            .get_int(name, "halt_at")
            .map(|v| v.max(0) as u64);
        Ok(Box::new(Self {
            name: name.to_string(),
            coreid,
            context,
            commit_rate,
            halt_at,
            cycles: 0,
            committed: 0,
            tlb_flushes: 0,
            hierarchy: None,
        }))
    }

    /// Returns the guest context this core is bound to.
    pub fn context(&self) -> ContextId {
        self.context
    }
}

impl Core for TimingCore {
    fn coreid(&self) -> CoreId {
        self.coreid
    }

    fn reset(&mut self) {
        self.cycles = 0;
        self.committed = 0;
        self.tlb_flushes = 0;
    }

    fn check_context_changes(&mut self) {
        // The reference model keeps its construction-time binding.
    }

    fn runcycle(&mut self) -> bool {
        self.cycles += 1;
        self.committed += self.commit_rate;
        self.halt_at.is_some_and(|halt| self.cycles >= halt)
    }

    fn flush_tlb(&mut self, _ctx: &Context) {
        self.tlb_flushes += 1;
    }

    fn flush_tlb_virt(&mut self, _ctx: &Context, _vaddr: u64) {
        self.tlb_flushes += 1;
    }

    fn instructions_committed(&self) -> u64 {
        self.committed
    }

    fn update_memory_hierarchy(&mut self, hierarchy: Arc<MemoryHierarchy>) {
        self.hierarchy = Some(hierarchy);
    }

    fn dump_state(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "core {} (coreid {}, ctx {}): cycles={} committed={} tlb_flushes={} mem_cycle={}",
            self.name,
            self.coreid,
            self.context,
            self.cycles,
            self.committed,
            self.tlb_flushes,
            self.hierarchy.as_ref().map_or(0, |h| h.cycle())
        )
    }

    fn update_stats(&self, stats: &mut SimStats) {
        stats.core_cycles += self.cycles;
    }
}
