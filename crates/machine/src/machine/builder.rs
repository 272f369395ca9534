//! Machine assembly from a registered template.
//!
//! This module drives the construction of a machine graph. It performs:
//! 1. **Template resolution:** Looks up the template in the machine registry;
//!    the failure diagnostic names the missing key and lists what is registered.
//! 2. **Generation:** Invokes the generator, which calls back into the machine
//!    to add cores, controllers, connection declarations, and options.
//! 3. **Hierarchy construction:** Builds the memory hierarchy strictly after
//!    all cores and controllers exist and hands the late-bound handle to each.
//! 4. **Interconnect materialization:** Walks the connection graph in insertion
//!    order and performs the mandatory symmetric registrations.

use std::sync::Arc;

use crate::config::SimConfig;
use crate::error::MachineError;
use crate::machine::Machine;
use crate::machine::connections::ConnectionDef;
use crate::mem::MemoryHierarchy;
use crate::registry;

/// Assembles `machine` from the template named `template_name`.
///
/// On success the machine owns its cores, controllers, hierarchy, and
/// interconnects, every core has been reset, and the first cycle may run.
///
/// # Errors
///
/// Any configuration error from the template, its builders, or connection
/// resolution. These are fatal by construction; callers report the diagnostic
/// and abort.
pub fn assemble(
    machine: &mut Machine,
    template_name: &str,
    config: &SimConfig,
) -> Result<(), MachineError> {
    if template_name.is_empty() {
        return Err(MachineError::EmptyTemplateName);
    }
    let generator = registry::machine_templates()
        .lookup(template_name)
        .ok_or_else(|| MachineError::UnknownTemplate {
            name: template_name.to_string(),
            available: registry::machine_templates().keys().join(", "),
        })?;

    (*generator)(machine)?;

    // The hierarchy is constructed strictly after all cores and controllers
    // exist and strictly before the first cycle runs.
    let hierarchy = Arc::new(MemoryHierarchy::new(machine, config));
    machine.install_hierarchy(Arc::clone(&hierarchy));

    materialize_interconnects(machine, &hierarchy)?;

    for core in machine.cores_mut() {
        core.reset();
    }
    machine.mark_initialized();
    tracing::info!(
        template = template_name,
        cores = machine.core_count(),
        controllers = machine.controllers().len(),
        interconnects = machine.interconnects().len(),
        "machine assembled"
    );
    Ok(())
}

/// Walks the connection graph in insertion order, instantiating each declared
/// interconnect and registering it with its controllers (and vice versa).
fn materialize_interconnects(
    machine: &mut Machine,
    hierarchy: &Arc<MemoryHierarchy>,
) -> Result<(), MachineError> {
    let defs: Vec<ConnectionDef> = machine.connections().defs().to_vec();
    for def in &defs {
        let factory = registry::interconnect_types()
            .lookup(def.kind())
            .ok_or_else(|| MachineError::UnknownInterconnectType(def.kind().to_string()))?;
        let mut interconnect = (*factory)(def.name(), hierarchy)?;
        for (controller_name, port) in def.attachments() {
            let controller = machine.controller_mut(controller_name).ok_or_else(|| {
                MachineError::UnknownController {
                    connection: def.name().to_string(),
                    controller: controller_name.clone(),
                }
            })?;
            // Both registrations are mandatory and symmetric.
            interconnect.register_controller(controller_name, *port);
            controller.register_interconnect(def.name(), *port);
        }
        machine.push_interconnect(interconnect);
    }
    machine.mark_connections_materialized();
    Ok(())
}
