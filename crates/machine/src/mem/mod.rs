//! Memory hierarchy handle.
//!
//! This module implements the shared memory subsystem the driver clocks between
//! the two phases of every cycle. It provides:
//! 1. **Clocking:** `clock` advances the hierarchy by exactly one cycle and runs
//!    every event that has come due.
//! 2. **Scheduling:** Controllers and interconnects queue wakeups against a
//!    cycle-ordered event queue.
//! 3. **Introspection:** Cycle count, pending-event depth, and a wiring dump.
//!
//! The handle is shared: cores and controllers receive an `Arc` after
//! construction, and in threaded simulation workers call into it concurrently
//! from `runcycle`. `clock` therefore takes `&self`; the cycle counter is atomic
//! and the event queue is mutex-guarded. Events run outside the lock so an event
//! may schedule further events.

use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::io::{self, Write};
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::SimConfig;
use crate::machine::Machine;

/// Callback run when a scheduled event comes due; receives the hierarchy cycle.
pub type Event = Box<dyn FnOnce(u64) + Send>;

struct Scheduled {
    due: u64,
    seq: u64,
    action: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// Shared memory subsystem clocked once per cycle, before any core advances.
pub struct MemoryHierarchy {
    cache_config_type: String,
    controllers: Vec<String>,
    cycle: AtomicU64,
    seq: AtomicU64,
    queue: Mutex<BinaryHeap<Reverse<Scheduled>>>,
}

impl std::fmt::Debug for MemoryHierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHierarchy")
            .field("cache_config_type", &self.cache_config_type)
            .field("controllers", &self.controllers)
            .field("cycle", &self.cycle)
            .finish_non_exhaustive()
    }
}

impl MemoryHierarchy {
    /// Builds the hierarchy for an assembled machine.
    ///
    /// Called strictly after all cores and controllers exist and strictly
    /// before the first cycle runs. Snapshots the controller roster for
    /// `dump_info` and takes the cache configuration selector from `config`.
    pub fn new(machine: &Machine, config: &SimConfig) -> Self {
        let controllers = machine
            .controllers()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        Self {
            cache_config_type: config.general.cache_config_type.clone(),
            controllers,
            cycle: AtomicU64::new(0),
            seq: AtomicU64::new(0),
            queue: Mutex::new(BinaryHeap::new()),
        }
    }

    /// Advances the hierarchy by one cycle and runs every due event. Returns
    /// the new cycle count.
    ///
    /// Called by the orchestrator only, between worker rendezvous.
    pub fn clock(&self) -> u64 {
        let now = self.cycle.fetch_add(1, Ordering::AcqRel) + 1;
        let mut due = Vec::new();
        {
            let mut queue = self
                .queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            while queue.peek().is_some_and(|Reverse(s)| s.due <= now) {
                if let Some(Reverse(s)) = queue.pop() {
                    due.push(s);
                }
            }
        }
        for scheduled in due {
            (scheduled.action)(now);
        }
        now
    }

    /// Queues `action` to run `delay` cycles from now. Events with the same
    /// due cycle run in scheduling order.
    pub fn schedule(&self, delay: u64, action: impl FnOnce(u64) + Send + 'static) {
        let due = self.cycle.load(Ordering::Acquire) + delay;
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Reverse(Scheduled {
                due,
                seq,
                action: Box::new(action),
            }));
    }

    /// Returns the number of cycles this hierarchy has been clocked.
    pub fn cycle(&self) -> u64 {
        self.cycle.load(Ordering::Acquire)
    }

    /// Returns the number of queued events not yet due.
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the cache configuration selector this hierarchy was built with.
    pub fn cache_config_type(&self) -> &str {
        &self.cache_config_type
    }

    /// Writes a human-readable dump of the hierarchy state.
    ///
    /// # Errors
    ///
    /// Propagates write failures from `w`.
    pub fn dump_info(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "memory hierarchy: config={} cycle={} pending_events={}",
            self.cache_config_type,
            self.cycle(),
            self.pending()
        )?;
        for name in &self.controllers {
            writeln!(w, "  controller {name}")?;
        }
        Ok(())
    }
}
