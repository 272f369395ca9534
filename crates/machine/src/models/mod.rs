//! Builtin reference models and their registration.
//!
//! This module ships the plugins the driver is useful with out of the box:
//! 1. **Cores:** `ooo` and `atom`, both options-driven timing stubs.
//! 2. **Controllers:** `wt_cache`, a write-through wiring stub.
//! 3. **Interconnects:** `split_bus` and `p2p`.
//! 4. **Machine templates:** `single_core` and `dual_core`.
//!
//! [`register_builtins`] is the explicit registration entry point the program
//! start calls before any machine is assembled. Registration is last-wins, so
//! calling it more than once is harmless.

/// Interconnect models.
pub mod bus;

/// Cache controller model.
pub mod cache;

/// Timing core model.
pub mod core;

/// Builtin machine templates.
pub mod templates;

use std::sync::Arc;

use crate::registry;

/// Registers every builtin core, controller, interconnect, and machine
/// template. Call once from the program entry point, before assembly.
pub fn register_builtins() {
    registry::core_types().register("ooo", Arc::new(core::TimingCore::build));
    registry::core_types().register("atom", Arc::new(core::TimingCore::build));
    registry::controller_types().register("wt_cache", Arc::new(cache::WriteThroughController::build));
    registry::interconnect_types().register("split_bus", Arc::new(bus::SplitBus::build));
    registry::interconnect_types().register("p2p", Arc::new(bus::PointToPoint::build));
    registry::machine_templates().register("single_core", Arc::new(templates::single_core));
    registry::machine_templates().register("dual_core", Arc::new(templates::dual_core));
}
