//! Cycle engine: owns the simulation loop.
//!
//! This module advances an assembled machine one cycle at a time. Every cycle,
//! regardless of mode:
//! 1. Deferred logging is enabled once the configured iteration is reached.
//! 2. A progress line is refreshed at a fixed stride.
//! 3. The statistics header goes to the time-series file on the first cycle.
//! 4. A statistics snapshot goes out at a second fixed stride.
//! 5. The log is rotated once it exceeds the configured size.
//! 6. The memory hierarchy is clocked exactly once (phase 1).
//! 7. Every core advances exactly once and termination votes are collected
//!    (phase 2).
//! 8. Committed-instruction totals are recomputed and the cycle counters
//!    advance.
//! 9. The stop predicate is evaluated.
//!
//! In **sequential** mode the engine itself runs phase 2 in coreid order. In
//! **threaded** mode phase 2 is distributed over a worker pool bracketed by a
//! run barrier and a join barrier; reaching the deferred-logging threshold
//! abandons threaded mode and re-enters the same cycle sequentially, so
//! verbose logging never runs under concurrency.

use std::process;
use std::thread;

use crate::clock;
use crate::config::SimConfig;
use crate::machine::Machine;
use crate::mem::MemoryHierarchy;
use crate::sim::log::SimLog;
use crate::sim::workers::{self, WorkerPool};
use crate::stats::{SimStats, TimeSeriesWriter};

/// Progress-indicator stride in cycles.
const PROGRESS_STRIDE: u64 = 1_000;

/// Statistics-snapshot stride in cycles.
const SNAPSHOT_STRIDE: u64 = 10_000;

/// Why the cycle loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The user requested a stop at the next cycle boundary.
    AllFinished,
    /// The committed-instruction budget was met or exceeded.
    InstructionBudget,
    /// At least one core voted to terminate.
    CoreRequested,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllFinished => write!(f, "wait-all-finished"),
            Self::InstructionBudget => write!(f, "instruction budget reached"),
            Self::CoreRequested => write!(f, "core requested exit"),
        }
    }
}

/// Final outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    /// Why the loop stopped.
    pub reason: ExitReason,
    /// Completed cycles.
    pub cycles: u64,
    /// Fleet-wide committed instructions at exit.
    pub total_committed: u64,
}

/// Owns the machine and drives its per-cycle advancement.
#[derive(Debug)]
pub struct CycleEngine {
    machine: Machine,
    config: SimConfig,
    stats: SimStats,
    log: SimLog,
    series: Option<TimeSeriesWriter>,
    threaded_abandoned: bool,
}

impl CycleEngine {
    /// Builds the engine around an assembled machine. Opens the simulation
    /// log and time-series file as configured.
    pub fn new(machine: Machine, config: SimConfig) -> Self {
        let log = SimLog::from_config(&config.logging);
        let series = config
            .stats
            .time_stats_file
            .as_deref()
            .map(TimeSeriesWriter::create);
        Self {
            machine,
            config,
            stats: SimStats::default(),
            log,
            series,
            threaded_abandoned: false,
        }
    }

    /// Returns the owned machine.
    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Returns the owned machine mutably. Only legal between cycles.
    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    /// Returns the driver statistics.
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Consumes the engine, returning the machine.
    pub fn into_machine(self) -> Machine {
        self.machine
    }

    /// Returns whether the driver has enabled the simulation log.
    pub fn log_enabled(&self) -> bool {
        self.log.is_enabled()
    }

    /// Returns whether a threaded run was abandoned at the deferred-logging
    /// threshold.
    pub fn abandoned_threaded(&self) -> bool {
        self.threaded_abandoned
    }

    /// Returns whether the next loop entry would use threaded mode: it must
    /// be requested, the fleet must outnumber the worker granularity, and
    /// verbose logging must be off (the log stream has no cross-thread
    /// discipline).
    pub fn is_threaded_eligible(&self) -> bool {
        let threading = &self.config.threading;
        threading.threaded_simulation
            && !self.threaded_abandoned
            && threading.cores_per_worker > 0
            && self.machine.core_count() > threading.cores_per_worker
            && self.config.logging.loglevel == 0
    }

    /// Runs the cycle loop until the stop predicate fires.
    ///
    /// Abnormal cycle-time outcomes are folded into the exit path: cores
    /// report them through their termination vote and the loop halts cleanly.
    /// On exit a fallback guest-context reference is bound so the emulator
    /// can resume.
    pub fn run(&mut self) -> ExitReport {
        for core in self.machine.cores_mut() {
            core.check_context_changes();
        }
        let reason = loop {
            if self.is_threaded_eligible() {
                if let Some(reason) = self.run_threaded() {
                    break reason;
                }
                self.threaded_abandoned = true;
                tracing::info!(
                    iteration = self.stats.iterations,
                    "leaving threaded simulation at the deferred-logging threshold"
                );
            } else {
                break self.run_sequential();
            }
        };
        let _ = self.machine.bind_fallback_context();
        self.machine.update_stats(&mut self.stats);
        self.log
            .write_event(format_args!("simulation stopped: {reason}"));
        ExitReport {
            reason,
            cycles: self.stats.sim_cycle,
            total_committed: self.stats.total_user_insns_committed,
        }
    }

    /// Sequential mode: the driver itself runs phase 2, advancing each core
    /// in coreid order and ORing its termination vote.
    fn run_sequential(&mut self) -> ExitReason {
        let hierarchy = self.machine.hierarchy().cloned();
        loop {
            cycle_preamble(
                &self.config,
                &mut self.stats,
                &mut self.log,
                self.series.as_mut(),
                hierarchy.as_deref(),
            );
            let mut vote = false;
            for core in self.machine.cores_mut() {
                vote |= core.runcycle();
            }
            let committed = self.machine.committed_instructions();
            if let Some(reason) = cycle_postamble(&self.config, &mut self.stats, committed, vote) {
                return reason;
            }
        }
    }

    /// Threaded mode: spawns one worker per contiguous core range and
    /// rendezvous with them twice per cycle. Returns `None` when the
    /// deferred-logging threshold is reached, which tells `run` to re-enter
    /// the same cycle sequentially.
    fn run_threaded(&mut self) -> Option<ExitReason> {
        let Self {
            machine,
            config,
            stats,
            log,
            series,
            ..
        } = self;
        let cores_per_worker = config.threading.cores_per_worker;
        let (cores, hierarchy) = machine.cores_and_hierarchy();
        let worker_count = cores.len().div_ceil(cores_per_worker);
        let pool = WorkerPool::new(worker_count);
        tracing::debug!(workers = pool.workers(), cores_per_worker, "entering threaded simulation");

        thread::scope(|scope| {
            for (index, chunk) in cores.chunks_mut(cores_per_worker).enumerate() {
                let pool = &pool;
                let spawned = thread::Builder::new()
                    .name(format!("simworker{index}"))
                    .spawn_scoped(scope, move || workers::worker_loop(pool, index, chunk));
                if let Err(err) = spawned {
                    // Resource errors during pool setup are fatal.
                    eprintln!("\n[!] FATAL: cannot spawn simulation worker {index}: {err}");
                    process::exit(1);
                }
            }

            loop {
                let logging = &config.logging;
                if logging.start_log_at_iteration > 0
                    && stats.iterations >= logging.start_log_at_iteration
                    && !logging.log_user_only
                {
                    // Verbose logging never runs under concurrency; hand the
                    // current cycle back to the sequential loop untouched.
                    pool.shutdown();
                    return None;
                }
                cycle_preamble(config, stats, log, series.as_mut(), hierarchy.as_deref());
                pool.release_workers();
                pool.collect_workers();
                let vote = pool.take_termination();
                let committed = pool.committed_total();
                if let Some(reason) = cycle_postamble(config, stats, committed, vote) {
                    pool.shutdown();
                    return Some(reason);
                }
            }
        })
    }
}

/// Steps 1–6 of the per-cycle contract, shared by both modes. Ends by
/// clocking the memory hierarchy, which happens-before any core's `runcycle`.
fn cycle_preamble(
    config: &SimConfig,
    stats: &mut SimStats,
    log: &mut SimLog,
    series: Option<&mut TimeSeriesWriter>,
    hierarchy: Option<&MemoryHierarchy>,
) {
    let iteration = stats.iterations;
    let logging = &config.logging;
    if !log.is_enabled()
        && logging.start_log_at_iteration > 0
        && iteration >= logging.start_log_at_iteration
        && !logging.log_user_only
    {
        log.enable(clock::cycle());
    }
    if iteration > 0 && iteration % PROGRESS_STRIDE == 0 {
        eprint!(
            "\rcycle {iteration}: {} instructions committed",
            stats.total_user_insns_committed
        );
    }
    if let Some(series) = series {
        if iteration == 0 {
            series.emit_header();
        }
        if iteration > 0 && iteration % SNAPSHOT_STRIDE == 0 {
            series.emit_snapshot(clock::cycle(), stats);
        }
    }
    log.rotate_if_over();
    if let Some(hierarchy) = hierarchy {
        let _ = hierarchy.clock();
    }
}

/// Steps 8–9: recompute totals, advance the counters and the process-wide
/// clock, and evaluate the stop predicate.
fn cycle_postamble(
    config: &SimConfig,
    stats: &mut SimStats,
    committed: u64,
    any_vote: bool,
) -> Option<ExitReason> {
    stats.total_user_insns_committed = committed;
    stats.sim_cycle += 1;
    stats.iterations += 1;
    clock::advance();

    if config.run.wait_all_finished {
        return Some(ExitReason::AllFinished);
    }
    if committed >= config.run.stop_at_user_insns {
        return Some(ExitReason::InstructionBudget);
    }
    if any_vote {
        return Some(ExitReason::CoreRequested);
    }
    None
}
