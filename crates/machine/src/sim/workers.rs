//! Worker pool for threaded simulation.
//!
//! This module implements the two-barrier handshake between the orchestrator
//! and the worker threads. It provides:
//! 1. **Rendezvous:** A run barrier and a join barrier, both of arity W + 1,
//!    bracketing phase 2 of every cycle.
//! 2. **Termination voting:** Workers OR their local votes into a
//!    mutex-guarded flag; the orchestrator takes-and-clears it once per cycle.
//! 3. **Committed counters:** Each worker publishes its slice's committed
//!    total after phase 2, so the orchestrator never touches the cores.
//! 4. **Teardown:** An exit state observed by workers right after the run
//!    barrier; the orchestrator signals it and the scope joins everyone.
//!
//! Worker *i* owns the contiguous core range starting at
//! `i * cores_per_worker` and, when the host supports it, is pinned to CPU
//! *i*. Pinning failure is a warning, not fatal.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Barrier, Mutex, PoisonError};

use crate::traits::Core;

/// Per-worker bookkeeping shared during startup, guarded by its own mutex.
#[derive(Debug, Default)]
struct StartupLog {
    started: usize,
    pinned: Vec<Option<usize>>,
}

/// Shared state for one threaded run: barriers, termination flag, committed
/// counters, and startup bookkeeping.
pub(crate) struct WorkerPool {
    run_barrier: Barrier,
    join_barrier: Barrier,
    termination: Mutex<bool>,
    exit: AtomicBool,
    committed: Vec<AtomicU64>,
    startup: Mutex<StartupLog>,
    workers: usize,
}

impl WorkerPool {
    /// Creates the pool for `workers` worker threads; both barriers have
    /// arity `workers + 1` so the orchestrator participates in each.
    pub(crate) fn new(workers: usize) -> Self {
        Self {
            run_barrier: Barrier::new(workers + 1),
            join_barrier: Barrier::new(workers + 1),
            termination: Mutex::new(false),
            exit: AtomicBool::new(false),
            committed: (0..workers).map(|_| AtomicU64::new(0)).collect(),
            startup: Mutex::new(StartupLog::default()),
            workers,
        }
    }

    /// Returns the number of workers this pool was built for.
    pub(crate) fn workers(&self) -> usize {
        self.workers
    }

    /// Orchestrator: releases all workers into phase 2.
    pub(crate) fn release_workers(&self) {
        let _ = self.run_barrier.wait();
    }

    /// Orchestrator: collects all workers at the end of phase 2.
    pub(crate) fn collect_workers(&self) {
        let _ = self.join_barrier.wait();
    }

    /// Orchestrator: reads and clears the shared termination flag.
    pub(crate) fn take_termination(&self) -> bool {
        let mut flag = self
            .termination
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *flag)
    }

    /// ORs a local termination vote into the shared flag. Also the surface
    /// for external stop requests, which take effect at the next cycle
    /// boundary.
    pub(crate) fn vote_terminate(&self) {
        let mut flag = self
            .termination
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *flag = true;
    }

    /// Orchestrator: signals the exit state and releases the run barrier so
    /// every worker observes it and returns.
    pub(crate) fn shutdown(&self) {
        self.exit.store(true, Ordering::Release);
        let _ = self.run_barrier.wait();
    }

    /// Sums the per-worker committed totals published after phase 2.
    pub(crate) fn committed_total(&self) -> u64 {
        self.committed
            .iter()
            .map(|c| c.load(Ordering::Acquire))
            .sum()
    }

    fn record_startup(&self, pinned: Option<usize>) {
        let mut startup = self
            .startup
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        startup.started += 1;
        startup.pinned.push(pinned);
        if startup.started == self.workers {
            let pinned_count = startup.pinned.iter().flatten().count();
            tracing::debug!(
                workers = self.workers,
                pinned = pinned_count,
                "worker pool online"
            );
        }
    }
}

/// Body of worker `index`: rendezvous at the run barrier, advance every core
/// in the assigned slice exactly once, publish the committed total, OR the
/// local termination vote into the shared flag, rendezvous at the join
/// barrier.
pub(crate) fn worker_loop(pool: &WorkerPool, index: usize, cores: &mut [Box<dyn Core>]) {
    pool.record_startup(pin_to_cpu(index));
    loop {
        let _ = pool.run_barrier.wait();
        if pool.exit.load(Ordering::Acquire) {
            return;
        }
        let mut vote = false;
        let mut committed = 0u64;
        for core in cores.iter_mut() {
            vote |= core.runcycle();
            committed += core.instructions_committed();
        }
        pool.committed[index].store(committed, Ordering::Release);
        if vote {
            pool.vote_terminate();
        }
        let _ = pool.join_barrier.wait();
    }
}

/// Pins the calling thread to CPU `index`. Returns the CPU on success.
#[cfg(target_os = "linux")]
fn pin_to_cpu(index: usize) -> Option<usize> {
    if index >= libc::CPU_SETSIZE as usize {
        tracing::warn!(worker = index, "worker index exceeds CPU set size; not pinning");
        return None;
    }
    // SAFETY: cpu_set_t is a plain bitmask; an all-zero value is a valid
    // empty set that CPU_SET then populates.
    let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    // SAFETY: `index` is bounds-checked against CPU_SETSIZE above.
    unsafe { libc::CPU_SET(index, &mut set) };
    // SAFETY: `set` is initialized above and pid 0 targets the calling
    // thread; the kernel copies the mask and keeps no reference to it.
    let rc = unsafe { libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) };
    if rc == 0 {
        Some(index)
    } else {
        tracing::warn!(worker = index, "could not pin worker to its CPU");
        None
    }
}

#[cfg(not(target_os = "linux"))]
fn pin_to_cpu(_index: usize) -> Option<usize> {
    None
}
