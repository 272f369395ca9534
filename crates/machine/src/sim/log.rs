//! Simulation log file.
//!
//! The driver-owned log stream written by the orchestrator, never by workers;
//! that is why verbose logging forces sequential simulation. It provides:
//! 1. **Deferred enable:** Logging can be held off until a configured
//!    iteration; enabling records an event line.
//! 2. **Rotation:** Once the file exceeds the configured size it is renamed to
//!    a `.old` sibling and reopened fresh.
//!
//! Log I/O errors are handled here at the point of use: a failed open or write
//! drops the file handle and the run continues.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use crate::clock;
use crate::config::LoggingConfig;

/// Driver-owned simulation log with deferred enable and size-based rotation.
#[derive(Debug)]
pub struct SimLog {
    path: Option<PathBuf>,
    file: Option<File>,
    enabled: bool,
    user_only: bool,
    written: u64,
    rotate_at: u64,
}

impl SimLog {
    /// Builds the log from configuration. When logging is neither deferred
    /// nor delegated to a higher layer and `loglevel >= 1`, the log is
    /// enabled immediately.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut log = Self {
            path: config.log_filename.clone(),
            file: None,
            enabled: false,
            user_only: config.log_user_only,
            written: 0,
            rotate_at: config.log_file_size,
        };
        if config.loglevel >= 1 && config.start_log_at_iteration == 0 {
            log.enable(clock::cycle());
        }
        log
    }

    /// Enables logging and records the enable event. A no-op when already
    /// enabled or when logging decisions are deferred to a higher layer.
    pub fn enable(&mut self, cycle: u64) {
        if self.enabled || self.user_only {
            return;
        }
        self.enabled = true;
        self.open();
        self.write_event(format_args!("logging enabled at cycle {cycle}"));
    }

    /// Returns whether the driver has enabled logging.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns whether the log file is open.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Returns the bytes written to the current file.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Writes one event line when enabled.
    pub fn write_event(&mut self, args: std::fmt::Arguments<'_>) {
        if !self.enabled {
            return;
        }
        let line = format!("{args}");
        if let Some(file) = self.file.as_mut() {
            if let Err(err) = writeln!(file, "{line}") {
                tracing::warn!(%err, "simulation log write failed; closing log");
                self.file = None;
                return;
            }
            self.written += line.len() as u64 + 1;
        }
    }

    /// Rotates the log if it is open and has exceeded the configured size:
    /// the current file is renamed to a `.old` sibling and the path reopened.
    pub fn rotate_if_over(&mut self) {
        if self.file.is_some() && self.written > self.rotate_at {
            self.rotate();
        }
    }

    fn rotate(&mut self) {
        let Some(path) = self.path.clone() else {
            return;
        };
        // Close before renaming so the rename sees a flushed file.
        self.file = None;
        let backup = PathBuf::from(format!("{}.old", path.display()));
        if let Err(err) = fs::rename(&path, &backup) {
            tracing::warn!(path = %path.display(), %err, "log rotation rename failed");
        }
        self.open();
        self.write_event(format_args!("log rotated at cycle {}", clock::cycle()));
    }

    fn open(&mut self) {
        self.written = 0;
        let Some(path) = &self.path else {
            return;
        };
        match File::create(path) {
            Ok(file) => self.file = Some(file),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "cannot open simulation log");
                self.file = None;
            }
        }
    }
}
