//! Configuration system for the simulation driver.
//!
//! This module defines the configuration structures consumed by machine
//! assembly and the cycle engine. It provides:
//! 1. **Defaults:** Baseline driver constants (worker granularity, log sizes, budgets).
//! 2. **Structures:** Hierarchical config for general, run, threading, logging, and stats.
//! 3. **Validation:** The fatal configuration preconditions (a named machine
//!    template, positive worker granularity).
//!
//! Configuration is supplied via JSON or use `SimConfig::default()` for the CLI.

use serde::Deserialize;
use std::path::PathBuf;

/// Default configuration constants for the driver.
mod defaults {
    /// Cache configuration selector forwarded to the memory hierarchy.
    pub const CACHE_CONFIG_TYPE: &str = "auto";

    /// Number of cores assigned to each worker thread.
    pub const CORES_PER_WORKER: usize = 4;

    /// Log file rotation threshold in bytes (1 GiB).
    pub const LOG_FILE_SIZE: u64 = 1 << 30;

    /// Committed-instruction budget; `u64::MAX` means no budget.
    pub const STOP_AT_USER_INSNS: u64 = u64::MAX;
}

/// Root configuration structure containing all driver settings.
///
/// # Examples
///
/// Deserializing a partial configuration from JSON:
///
/// ```
/// use mcsim_core::config::SimConfig;
///
/// let json = r#"{
///     "general": { "machine_config": "dual_core" },
///     "run": { "stop_at_user_insns": 1000 },
///     "threading": { "threaded_simulation": true, "cores_per_worker": 1 }
/// }"#;
///
/// let config: SimConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.general.machine_config, "dual_core");
/// assert_eq!(config.general.cache_config_type, "auto");
/// assert_eq!(config.run.stop_at_user_insns, 1000);
/// assert!(config.threading.threaded_simulation);
/// assert_eq!(config.logging.loglevel, 0);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimConfig {
    /// Machine selection and memory-hierarchy forwarding.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Stop conditions for the cycle engine.
    #[serde(default)]
    pub run: RunConfig,
    /// Worker-pool configuration for threaded simulation.
    #[serde(default)]
    pub threading: ThreadingConfig,
    /// Simulation log configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Statistics time-series output.
    #[serde(default)]
    pub stats: StatsConfig,
}

impl SimConfig {
    /// Checks the fatal configuration preconditions.
    ///
    /// # Errors
    ///
    /// [`crate::error::MachineError::EmptyTemplateName`] when `machine_config` is empty,
    /// [`crate::error::MachineError::ZeroWorkerGranularity`] when `cores_per_worker` is zero.
    pub fn validate(&self) -> Result<(), crate::error::MachineError> {
        if self.general.machine_config.is_empty() {
            return Err(crate::error::MachineError::EmptyTemplateName);
        }
        if self.threading.cores_per_worker == 0 {
            return Err(crate::error::MachineError::ZeroWorkerGranularity);
        }
        Ok(())
    }
}

/// Machine selection and memory-hierarchy settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Machine template name resolved in the template registry. Required;
    /// empty is a fatal configuration error.
    #[serde(default)]
    pub machine_config: String,

    /// Cache configuration selector forwarded to the memory hierarchy.
    #[serde(default = "GeneralConfig::default_cache_config_type")]
    pub cache_config_type: String,
}

impl GeneralConfig {
    fn default_cache_config_type() -> String {
        defaults::CACHE_CONFIG_TYPE.to_string()
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            machine_config: String::new(),
            cache_config_type: defaults::CACHE_CONFIG_TYPE.to_string(),
        }
    }
}

/// Stop conditions evaluated at the end of every cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Committed-instruction budget; the engine exits once the fleet-wide
    /// total reaches it.
    #[serde(default = "RunConfig::default_stop_at_user_insns")]
    pub stop_at_user_insns: u64,

    /// Treat the next cycle boundary as a stop.
    #[serde(default)]
    pub wait_all_finished: bool,
}

impl RunConfig {
    fn default_stop_at_user_insns() -> u64 {
        defaults::STOP_AT_USER_INSNS
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            stop_at_user_insns: defaults::STOP_AT_USER_INSNS,
            wait_all_finished: false,
        }
    }
}

/// Worker-pool configuration.
///
/// Threaded mode is entered only when it is requested here, the machine has
/// strictly more cores than `cores_per_worker`, and verbose logging is off.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadingConfig {
    /// Request threaded simulation.
    #[serde(default)]
    pub threaded_simulation: bool,

    /// Number of cores assigned to each worker thread. Must be positive.
    #[serde(default = "ThreadingConfig::default_cores_per_worker")]
    pub cores_per_worker: usize,
}

impl ThreadingConfig {
    fn default_cores_per_worker() -> usize {
        defaults::CORES_PER_WORKER
    }
}

impl Default for ThreadingConfig {
    fn default() -> Self {
        Self {
            threaded_simulation: false,
            cores_per_worker: defaults::CORES_PER_WORKER,
        }
    }
}

/// Simulation log configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Verbosity level; `loglevel >= 1` forces sequential simulation because
    /// the log stream has no cross-thread discipline.
    #[serde(default)]
    pub loglevel: u32,

    /// Path of the simulation log file; `None` disables it.
    #[serde(default)]
    pub log_filename: Option<PathBuf>,

    /// Rotation threshold in bytes; once the file exceeds it, it is renamed
    /// and reopened.
    #[serde(default = "LoggingConfig::default_log_file_size")]
    pub log_file_size: u64,

    /// Iteration at which to enable logging; zero means not deferred.
    #[serde(default)]
    pub start_log_at_iteration: u64,

    /// Defer all logging decisions to a higher layer; the driver never
    /// enables its log when this is set.
    #[serde(default)]
    pub log_user_only: bool,
}

impl LoggingConfig {
    fn default_log_file_size() -> u64 {
        defaults::LOG_FILE_SIZE
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            loglevel: 0,
            log_filename: None,
            log_file_size: defaults::LOG_FILE_SIZE,
            start_log_at_iteration: 0,
            log_user_only: false,
        }
    }
}

/// Statistics time-series output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsConfig {
    /// Path of the time-series file receiving the header and periodic
    /// snapshots; `None` disables both.
    #[serde(default)]
    pub time_stats_file: Option<PathBuf>,
}
