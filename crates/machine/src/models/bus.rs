//! Interconnect models.
//!
//! Two reference interconnects: a shared split-transaction bus accepting any
//! number of controllers, and a point-to-point link expecting exactly two
//! endpoints. Both record their attachments in declaration order, which the
//! driver guarantees to preserve.

use std::io::{self, Write};
use std::sync::Arc;

use crate::error::MachineError;
use crate::mem::MemoryHierarchy;
use crate::traits::{Interconnect, PortKind};

/// Shared split-transaction bus.
#[derive(Debug)]
pub struct SplitBus {
    name: String,
    attached: Vec<(String, PortKind)>,
    hierarchy: Arc<MemoryHierarchy>,
}

impl SplitBus {
    /// Builds a bus named `name` on the given hierarchy.
    ///
    /// # Errors
    ///
    /// Infallible today; the signature matches the interconnect factory contract.
    pub fn build(
        name: &str,
        hierarchy: &Arc<MemoryHierarchy>,
    ) -> Result<Box<dyn Interconnect>, MachineError> {
        Ok(Box::new(Self {
            name: name.to_string(),
            attached: Vec::new(),
            hierarchy: Arc::clone(hierarchy),
        }))
    }
}

impl Interconnect for SplitBus {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_controller(&mut self, controller: &str, port: PortKind) {
        self.attached.push((controller.to_string(), port));
    }

    fn dump_info(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "split_bus {} (hierarchy cycle {}): {} controllers",
            self.name,
            self.hierarchy.cycle(),
            self.attached.len()
        )?;
        for (controller, port) in &self.attached {
            writeln!(w, "  {controller} ({port:?})")?;
        }
        Ok(())
    }
}

/// Point-to-point link between exactly two controllers.
#[derive(Debug)]
pub struct PointToPoint {
    name: String,
    endpoints: Vec<(String, PortKind)>,
    hierarchy: Arc<MemoryHierarchy>,
}

impl PointToPoint {
    /// Builds a link named `name` on the given hierarchy.
    ///
    /// # Errors
    ///
    /// Infallible today; the signature matches the interconnect factory contract.
    pub fn build(
        name: &str,
        hierarchy: &Arc<MemoryHierarchy>,
    ) -> Result<Box<dyn Interconnect>, MachineError> {
        Ok(Box::new(Self {
            name: name.to_string(),
            endpoints: Vec::with_capacity(2),
            hierarchy: Arc::clone(hierarchy),
        }))
    }
}

impl Interconnect for PointToPoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_controller(&mut self, controller: &str, port: PortKind) {
        if self.endpoints.len() == 2 {
            tracing::warn!(
                link = self.name,
                controller,
                "point-to-point link already has two endpoints"
            );
        }
        self.endpoints.push((controller.to_string(), port));
    }

    fn dump_info(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "p2p {} (hierarchy cycle {}): {} endpoints",
            self.name,
            self.hierarchy.cycle(),
            self.endpoints.len()
        )
    }
}
