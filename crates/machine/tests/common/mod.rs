//! Shared test infrastructure.

pub mod mocks;

use mcsim_core::config::SimConfig;
use mcsim_core::machine::{Machine, assemble};

/// Installs a tracing subscriber for test debugging; safe to call repeatedly.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds and assembles a machine from `template` with the given config,
/// panicking on any assembly error.
pub fn assembled_machine(template: &str, config: &SimConfig) -> Machine {
    init_tracing();
    let mut machine = Machine::new(template);
    assemble(&mut machine, template, config).unwrap();
    machine
}

/// A config whose machine name is `template` and whose other settings are
/// defaults.
pub fn config_for(template: &str) -> SimConfig {
    let mut config = SimConfig::default();
    config.general.machine_config = template.to_string();
    config
}
