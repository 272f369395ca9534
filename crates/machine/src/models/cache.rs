//! Write-through cache controller model.
//!
//! Records the wiring the driver performs (interconnect registrations, the
//! late-bound hierarchy handle) and schedules a warm-up event on the
//! hierarchy so the controller only reports itself online once the hierarchy
//! has been clocked.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::MachineError;
use crate::machine::Machine;
use crate::mem::MemoryHierarchy;
use crate::traits::{CacheController, CoreId, PortKind};

/// Reference write-through controller.
#[derive(Debug)]
pub struct WriteThroughController {
    name: String,
    coreid: CoreId,
    port: PortKind,
    interconnects: Vec<(String, PortKind)>,
    online: Arc<AtomicBool>,
    hierarchy: Option<Arc<MemoryHierarchy>>,
}

impl WriteThroughController {
    /// Builds a controller named `name` for `coreid` on `port`.
    ///
    /// # Errors
    ///
    /// Infallible today; the signature matches the controller factory contract.
    pub fn build(
        _machine: &mut Machine,
        name: &str,
        coreid: CoreId,
        port: PortKind,
    ) -> Result<Box<dyn CacheController>, MachineError> {
        Ok(Box::new(Self {
            name: name.to_string(),
            coreid,
            port,
            interconnects: Vec::new(),
            online: Arc::new(AtomicBool::new(false)),
            hierarchy: None,
        }))
    }

    /// Returns whether the warm-up event has run.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }
}

impl CacheController for WriteThroughController {
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
        self.interconnects.push((interconnect.to_string(), port));
    }

    fn update_memory_hierarchy(&mut self, hierarchy: Arc<MemoryHierarchy>) {
        let online = Arc::clone(&self.online);
        hierarchy.schedule(1, move |_cycle| online.store(true, Ordering::Release));
        self.hierarchy = Some(hierarchy);
    }

    fn dump_info(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "controller {} (coreid {}, port {:?}, online {}, mem_cycle {}): {} interconnects",
            self.name,
            self.coreid,
            self.port,
            self.is_online(),
            self.hierarchy.as_ref().map_or(0, |h| h.cycle()),
            self.interconnects.len()
        )
    }
}
