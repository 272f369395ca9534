//! Mock cores, controllers, and interconnects with shared observers.
//!
//! Every registration helper generates a unique registry key, so tests that
//! run concurrently in one process never collide in the global registries.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mcsim_core::context::Context;
use mcsim_core::machine::Machine;
use mcsim_core::mem::MemoryHierarchy;
use mcsim_core::registry;
use mcsim_core::stats::SimStats;
use mcsim_core::traits::{CacheController, Core, CoreId, Interconnect, PortKind};

static UNIQUE: AtomicUsize = AtomicUsize::new(0);

/// Returns a registry key that no other test will use.
pub fn unique_key(prefix: &str) -> String {
    format!("{prefix}_{}", UNIQUE.fetch_add(1, Ordering::Relaxed))
}

/// Observable counters for one mock core.
#[derive(Debug, Default)]
pub struct CoreProbe {
    /// Number of `runcycle` calls.
    pub runcycles: AtomicU64,
    /// Number of `reset` calls.
    pub resets: AtomicU64,
    /// Number of `check_context_changes` calls.
    pub ctx_checks: AtomicU64,
    /// Number of TLB flush calls (full or single-address).
    pub tlb_flushes: AtomicU64,
    /// Whether the machine already had a hierarchy while the factory ran.
    pub hierarchy_seen_at_build: AtomicBool,
    /// Phase-ordering violations observed from inside `runcycle`.
    pub phase_violations: AtomicU64,
}

/// Behavior of one mock core.
#[derive(Debug, Clone, Default)]
pub struct CoreSpec {
    /// Instructions committed per cycle.
    pub commit_per_cycle: u64,
    /// Cycle count at which the core starts voting to terminate.
    pub vote_at: Option<u64>,
    /// Check from inside `runcycle` that the hierarchy was clocked exactly
    /// once more than this core has run.
    pub check_phase: bool,
}

impl CoreSpec {
    /// A core committing `n` instructions per cycle.
    pub fn committing(n: u64) -> Self {
        Self {
            commit_per_cycle: n,
            ..Self::default()
        }
    }
}

struct MockCore {
    coreid: CoreId,
    spec: CoreSpec,
    probe: Arc<CoreProbe>,
    cycles: u64,
    committed: u64,
    hierarchy: Option<Arc<MemoryHierarchy>>,
}

impl Core for MockCore {
    fn coreid(&self) -> CoreId {
        self.coreid
    }

    fn reset(&mut self) {
        let _ = self.probe.resets.fetch_add(1, Ordering::Relaxed);
    }

    fn check_context_changes(&mut self) {
        let _ = self.probe.ctx_checks.fetch_add(1, Ordering::Relaxed);
    }

    fn runcycle(&mut self) -> bool {
        self.cycles += 1;
        if self.spec.check_phase {
            let clocked = self.hierarchy.as_ref().map_or(0, |h| h.cycle());
            if clocked != self.cycles {
                let _ = self.probe.phase_violations.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.committed += self.spec.commit_per_cycle;
        let _ = self.probe.runcycles.fetch_add(1, Ordering::Relaxed);
        self.spec.vote_at.is_some_and(|at| self.cycles >= at)
    }

    fn flush_tlb(&mut self, _ctx: &Context) {
        let _ = self.probe.tlb_flushes.fetch_add(1, Ordering::Relaxed);
    }

    fn flush_tlb_virt(&mut self, _ctx: &Context, _vaddr: u64) {
        let _ = self.probe.tlb_flushes.fetch_add(1, Ordering::Relaxed);
    }

    fn instructions_committed(&self) -> u64 {
        self.committed
    }

    fn update_memory_hierarchy(&mut self, hierarchy: Arc<MemoryHierarchy>) {
        self.hierarchy = Some(hierarchy);
    }

    fn dump_state(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "mock core {}: cycles={}", self.coreid, self.cycles)
    }

    fn update_stats(&self, stats: &mut SimStats) {
        stats.core_cycles += self.cycles;
    }
}

/// Registers a mock core type whose instances follow `specs` by coreid.
/// Returns the type key and one probe per spec (indexed by coreid).
pub fn register_mock_core_type(specs: Vec<CoreSpec>) -> (String, Vec<Arc<CoreProbe>>) {
    let probes: Vec<Arc<CoreProbe>> = specs.iter().map(|_| Arc::default()).collect();
    let key = unique_key("mockcore");
    let factory_probes = probes.clone();
    registry::core_types().register(
        key.clone(),
        Arc::new(move |machine: &mut Machine, _name: &str, coreid: CoreId| {
            let spec = specs.get(coreid).cloned().unwrap_or_default();
            let probe = factory_probes
                .get(coreid)
                .cloned()
                .unwrap_or_else(Arc::default);
            if machine.hierarchy().is_some() {
                probe.hierarchy_seen_at_build.store(true, Ordering::Relaxed);
            }
            let _ = machine.claim_context(coreid)?;
            Ok(Box::new(MockCore {
                coreid,
                spec,
                probe,
                cycles: 0,
                committed: 0,
                hierarchy: None,
            }) as Box<dyn Core>)
        }),
    );
    (key, probes)
}

/// Registers a machine template adding `n` cores of `core_type` with the
/// instance prefix `core`. Returns the template key.
pub fn register_fleet_template(core_type: &str, n: usize) -> String {
    let key = unique_key("tmpl");
    let core_type = core_type.to_string();
    registry::machine_templates().register(
        key.clone(),
        Arc::new(move |machine: &mut Machine| {
            for _ in 0..n {
                let _ = machine.add_core("core", &core_type)?;
            }
            Ok(())
        }),
    );
    key
}

/// One recorded registration: (receiver instance, registered peer, port).
pub type Registration = (String, String, PortKind);

struct RecordingController {
    name: String,
    coreid: CoreId,
    port: PortKind,
    seen: Arc<Mutex<Vec<Registration>>>,
}

impl CacheController for RecordingController {
    fn name(&self) -> &str {
        &self.name
    }

    fn coreid(&self) -> CoreId {
        self.coreid
    }

    fn port(&self) -> PortKind {
        self.port
    }

    fn register_interconnect(&mut self, interconnect: &str, port: PortKind) {
        self.seen
            .lock()
            .unwrap()
            .push((self.name.clone(), interconnect.to_string(), port));
    }

    fn update_memory_hierarchy(&mut self, _hierarchy: Arc<MemoryHierarchy>) {}

    fn dump_info(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "mock controller {}", self.name)
    }
}

/// Registers a recording controller type. Returns the type key and the
/// shared list of interconnect registrations the instances observe.
pub fn register_recording_controller_type() -> (String, Arc<Mutex<Vec<Registration>>>) {
    let seen: Arc<Mutex<Vec<Registration>>> = Arc::default();
    let key = unique_key("mockctrl");
    let factory_seen = Arc::clone(&seen);
    registry::controller_types().register(
        key.clone(),
        Arc::new(
            move |_machine: &mut Machine, name: &str, coreid: CoreId, port: PortKind| {
                Ok(Box::new(RecordingController {
                    name: name.to_string(),
                    coreid,
                    port,
                    seen: Arc::clone(&factory_seen),
                }) as Box<dyn CacheController>)
            },
        ),
    );
    (key, seen)
}

struct RecordingInterconnect {
    name: String,
    seen: Arc<Mutex<Vec<Registration>>>,
}

impl Interconnect for RecordingInterconnect {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_controller(&mut self, controller: &str, port: PortKind) {
        self.seen
            .lock()
            .unwrap()
            .push((self.name.clone(), controller.to_string(), port));
    }

    fn dump_info(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "mock interconnect {}", self.name)
    }
}

/// Registers a recording interconnect type. Returns the type key and the
/// shared list of controller registrations the instances observe.
pub fn register_recording_interconnect_type() -> (String, Arc<Mutex<Vec<Registration>>>) {
    let seen: Arc<Mutex<Vec<Registration>>> = Arc::default();
    let key = unique_key("mockic");
    let factory_seen = Arc::clone(&seen);
    registry::interconnect_types().register(
        key.clone(),
        Arc::new(move |name: &str, _hierarchy: &Arc<MemoryHierarchy>| {
            Ok(Box::new(RecordingInterconnect {
                name: name.to_string(),
                seen: Arc::clone(&factory_seen),
            }) as Box<dyn Interconnect>)
        }),
    );
    (key, seen)
}
