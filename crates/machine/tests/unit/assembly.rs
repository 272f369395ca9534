//! Machine assembly unit tests.
//!
//! Verifies coreid allocation, context claiming, hierarchy construction
//! ordering, fatal diagnostics for unknown keys, and the TLB fan-out.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use mcsim_core::error::MachineError;
use mcsim_core::machine::{Machine, assemble};
use mcsim_core::registry;
use mcsim_core::traits::PortKind;
use pretty_assertions::assert_eq;

use crate::common::mocks::{
    CoreSpec, register_fleet_template, register_mock_core_type,
    register_recording_controller_type, unique_key,
};
use crate::common::{assembled_machine, config_for};

// ══════════════════════════════════════════════════════════
// 1. Coreid and context invariants
// ══════════════════════════════════════════════════════════

#[test]
fn coreids_form_the_sequence_zero_to_n() {
    let (core_type, _probes) = register_mock_core_type(vec![CoreSpec::default(); 3]);
    let template = register_fleet_template(&core_type, 3);
    let machine = assembled_machine(&template, &config_for(&template));

    assert_eq!(machine.core_count(), 3);
    for (position, core) in machine.cores().iter().enumerate() {
        assert_eq!(core.coreid(), position);
    }
}

#[test]
fn each_core_claims_one_context() {
    let (core_type, _probes) = register_mock_core_type(vec![CoreSpec::default(); 3]);
    let template = register_fleet_template(&core_type, 3);
    let machine = assembled_machine(&template, &config_for(&template));

    assert_eq!(machine.contexts().claimed(), 3);
    assert_eq!(machine.contexts().get(0).unwrap().owner(), Some(0));
    assert_eq!(machine.contexts().get(2).unwrap().owner(), Some(2));
}

// ══════════════════════════════════════════════════════════
// 2. Hierarchy construction ordering
// ══════════════════════════════════════════════════════════

#[test]
fn hierarchy_is_built_strictly_after_cores() {
    let (core_type, probes) = register_mock_core_type(vec![CoreSpec::default(); 2]);
    let template = register_fleet_template(&core_type, 2);
    let machine = assembled_machine(&template, &config_for(&template));

    assert!(machine.hierarchy().is_some());
    for probe in &probes {
        assert!(
            !probe.hierarchy_seen_at_build.load(Ordering::Relaxed),
            "core factory must run before the hierarchy exists"
        );
    }
}

#[test]
fn cores_are_reset_once_at_end_of_assembly() {
    let (core_type, probes) = register_mock_core_type(vec![CoreSpec::default(); 2]);
    let template = register_fleet_template(&core_type, 2);
    let _machine = assembled_machine(&template, &config_for(&template));

    for probe in &probes {
        assert_eq!(probe.resets.load(Ordering::Relaxed), 1);
    }
}

#[test]
fn assembled_machine_is_initialized() {
    let (core_type, _probes) = register_mock_core_type(vec![CoreSpec::default()]);
    let template = register_fleet_template(&core_type, 1);
    let machine = assembled_machine(&template, &config_for(&template));
    assert!(machine.is_initialized());
}

// ══════════════════════════════════════════════════════════
// 3. Fatal configuration diagnostics
// ══════════════════════════════════════════════════════════

#[test]
fn unknown_template_is_fatal_and_lists_registered() {
    let known = register_fleet_template("ooo", 1);
    let missing = unique_key("ghost_template");
    let mut machine = Machine::new(&missing);
    let err = assemble(&mut machine, &missing, &config_for(&missing)).unwrap_err();

    let message = err.to_string();
    assert!(message.contains(&missing), "diagnostic names the missing key");
    assert!(message.contains(&known), "diagnostic lists registered templates");
}

#[test]
fn empty_template_name_is_fatal() {
    let mut machine = Machine::new("unnamed");
    assert!(matches!(
        assemble(&mut machine, "", &config_for("")),
        Err(MachineError::EmptyTemplateName)
    ));
}

#[test]
fn unknown_core_type_is_fatal_before_cycle_one() {
    let missing_core = unique_key("ghost_core");
    let template = register_fleet_template(&missing_core, 1);
    let mut machine = Machine::new(&template);
    let err = assemble(&mut machine, &template, &config_for(&template)).unwrap_err();

    assert!(matches!(err, MachineError::UnknownCoreType(_)));
    assert!(err.to_string().contains(&missing_core));
    assert!(machine.hierarchy().is_none(), "assembly stops before the hierarchy");
}

#[test]
fn unknown_controller_type_is_fatal() {
    let (core_type, _probes) = register_mock_core_type(vec![CoreSpec::default()]);
    let missing_controller = unique_key("ghost_ctrl");
    let template = unique_key("tmpl_badctrl");
    let core_type_key = core_type.clone();
    let missing = missing_controller.clone();
    registry::machine_templates().register(
        template.clone(),
        Arc::new(move |machine: &mut Machine| {
            let coreid = machine.add_core("core", &core_type_key)?;
            let _ = machine.add_controller(coreid, "l1_", &missing, PortKind::Data)?;
            Ok(())
        }),
    );

    let mut machine = Machine::new(&template);
    let err = assemble(&mut machine, &template, &config_for(&template)).unwrap_err();
    assert!(matches!(err, MachineError::UnknownControllerType(_)));
}

#[test]
fn duplicate_controller_name_is_fatal() {
    let (core_type, _probes) = register_mock_core_type(vec![CoreSpec::default()]);
    let (controller_type, _seen) = register_recording_controller_type();
    let template = unique_key("tmpl_dupctrl");
    let core_key = core_type.clone();
    let ctrl_key = controller_type.clone();
    registry::machine_templates().register(
        template.clone(),
        Arc::new(move |machine: &mut Machine| {
            let coreid = machine.add_core("core", &core_key)?;
            let _ = machine.add_controller(coreid, "l1_", &ctrl_key, PortKind::Data)?;
            let _ = machine.add_controller(coreid, "l1_", &ctrl_key, PortKind::Instruction)?;
            Ok(())
        }),
    );

    let mut machine = Machine::new(&template);
    assert!(matches!(
        assemble(&mut machine, &template, &config_for(&template)),
        Err(MachineError::DuplicateController(_))
    ));
}

// ══════════════════════════════════════════════════════════
// 4. TLB fan-out and reset
// ══════════════════════════════════════════════════════════

#[test]
fn tlb_flush_broadcasts_to_every_core() {
    let (core_type, probes) = register_mock_core_type(vec![CoreSpec::default(); 3]);
    let template = register_fleet_template(&core_type, 3);
    let mut machine = assembled_machine(&template, &config_for(&template));

    machine.flush_tlb(0);
    machine.flush_tlb_virt(0, 0x4000_1000);
    for probe in &probes {
        assert_eq!(probe.tlb_flushes.load(Ordering::Relaxed), 2);
    }
}

#[test]
fn machine_reset_releases_everything() {
    let (core_type, _probes) = register_mock_core_type(vec![CoreSpec::default(); 2]);
    let template = register_fleet_template(&core_type, 2);
    let mut machine = assembled_machine(&template, &config_for(&template));

    machine.reset();
    assert_eq!(machine.core_count(), 0);
    assert!(machine.hierarchy().is_none());
    assert!(machine.controllers().is_empty());
    assert!(machine.interconnects().is_empty());
    assert_eq!(machine.contexts().claimed(), 0);
    assert!(!machine.is_initialized());
}

#[test]
fn dump_state_covers_every_core() {
    let (core_type, _probes) = register_mock_core_type(vec![CoreSpec::default(); 2]);
    let template = register_fleet_template(&core_type, 2);
    let machine = assembled_machine(&template, &config_for(&template));

    let mut out = Vec::new();
    machine.dump_state(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("mock core 0"));
    assert!(text.contains("mock core 1"));
    assert!(text.contains("memory hierarchy"));
}
