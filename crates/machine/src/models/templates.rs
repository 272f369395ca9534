//! Builtin machine templates.
//!
//! Two fixed topologies used by the CLI out of the box:
//! - `single_core`: one `ooo` core, no controllers, no interconnects.
//! - `dual_core`: two `ooo` cores committing 100 instructions per cycle, each
//!   with instruction- and data-side write-through controllers joined by one
//!   shared split bus.

use crate::error::MachineError;
use crate::machine::Machine;
use crate::traits::PortKind;

/// Generator for the `single_core` template.
///
/// # Errors
///
/// Propagates core-builder failures.
pub fn single_core(machine: &mut Machine) -> Result<(), MachineError> {
    let _ = machine.add_core("core", "ooo")?;
    Ok(())
}

/// Generator for the `dual_core` template.
///
/// # Errors
///
/// Propagates core- and controller-builder failures.
pub fn dual_core(machine: &mut Machine) -> Result<(), MachineError> {
    // Options first: core builders read them during construction.
    for index in 0..2 {
        machine
            .options_mut()
            .set_int_indexed("core", index, "commit_rate", 100);
    }

    let bus = machine.declare_connection("split_bus", "bus", 0);
    for _ in 0..2 {
        let coreid = machine.add_core("core", "ooo")?;
        let icache = machine.add_controller(coreid, "l1i_", "wt_cache", PortKind::Instruction)?;
        let dcache = machine.add_controller(coreid, "l1d_", "wt_cache", PortKind::Data)?;
        machine.attach(bus, &icache, PortKind::Upper);
        machine.attach(bus, &dcache, PortKind::Upper);
    }
    Ok(())
}
