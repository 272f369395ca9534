//! Simulation statistics collection and reporting.
//!
//! This module tracks the driver-owned counters and the time-series output. It provides:
//! 1. **Counters:** Completed cycles, loop iterations, and fleet-wide committed
//!    instructions.
//! 2. **Summary:** A human-readable end-of-run block with derived rates.
//! 3. **Time series:** A snapshot file receiving one header line on the first
//!    cycle and one snapshot line at a fixed cycle stride.
//!
//! Time-series I/O errors are handled here at the point of use: a failed write
//! disables the file and the run continues.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Driver-owned statistics counters.
///
/// Workers never touch these; the orchestrator updates them between the join
/// barrier and the next cycle's run barrier.
#[derive(Debug, Clone)]
pub struct SimStats {
    start_time: Instant,
    /// Completed machine cycles this run.
    pub sim_cycle: u64,
    /// Cycle-loop iterations; tracks `sim_cycle` but survives the threaded →
    /// sequential re-entry unchanged.
    pub iterations: u64,
    /// Fleet-wide user instructions committed, recomputed every cycle by
    /// summing each core's counter.
    pub total_user_insns_committed: u64,
    /// Sum of per-core cycle counts folded in by `Core::update_stats`.
    pub core_cycles: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            sim_cycle: 0,
            iterations: 0,
            total_user_insns_committed: 0,
            core_cycles: 0,
        }
    }
}

impl SimStats {
    /// Prints the end-of-run summary block to stdout.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let cyc = if self.sim_cycle == 0 { 1 } else { self.sim_cycle };
        let commits_per_cycle = self.total_user_insns_committed as f64 / cyc as f64;
        let khz = (self.sim_cycle as f64 / seconds) / 1000.0;
        println!("\n==========================================================");
        println!("MACHINE SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {seconds:.4} s");
        println!("sim_cycles               {}", self.sim_cycle);
        println!("sim_freq                 {khz:.2} kHz");
        println!("sim_insns                {}", self.total_user_insns_committed);
        println!("sim_commits_per_cycle    {commits_per_cycle:.4}");
        println!("core_cycles              {}", self.core_cycles);
        println!("==========================================================");
    }
}

/// Writer for the statistics time-series file.
///
/// The header is emitted at most once; snapshots are keyed by the cycle the
/// engine passes in. Any I/O failure drops the file handle and logs a warning,
/// so later calls become no-ops.
#[derive(Debug)]
pub struct TimeSeriesWriter {
    path: PathBuf,
    file: Option<File>,
    header_written: bool,
}

impl TimeSeriesWriter {
    /// Opens (truncating) the time-series file at `path`.
    pub fn create(path: &Path) -> Self {
        let file = match File::create(path) {
            Ok(f) => Some(f),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "cannot open time-series file");
                None
            }
        };
        Self {
            path: path.to_path_buf(),
            file,
            header_written: false,
        }
    }

    /// Emits the column header. Idempotent; later calls are no-ops.
    pub fn emit_header(&mut self) {
        if self.header_written {
            return;
        }
        self.header_written = true;
        self.write_line(format_args!("cycle committed iterations"));
    }

    /// Emits one snapshot line keyed by `cycle`.
    pub fn emit_snapshot(&mut self, cycle: u64, stats: &SimStats) {
        self.write_line(format_args!(
            "{cycle} {} {}",
            stats.total_user_insns_committed, stats.iterations
        ));
    }

    /// Returns whether the file is still writable.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn write_line(&mut self, line: std::fmt::Arguments<'_>) {
        if let Some(file) = self.file.as_mut() {
            if let Err(err) = writeln!(file, "{line}") {
                tracing::warn!(path = %self.path.display(), %err, "time-series write failed; skipping further snapshots");
                self.file = None;
            }
        }
    }
}
