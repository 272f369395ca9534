//! Option store unit tests.
//!
//! Verifies typed round-trips, overwrite-on-set, exact-triple lookup with no
//! type coercion, and the prefix+index name composition.

use mcsim_core::machine::options::{OptionStore, instance_name};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ══════════════════════════════════════════════════════════
// 1. Round-trips per kind
// ══════════════════════════════════════════════════════════

#[test]
fn bool_roundtrip() {
    let mut store = OptionStore::default();
    store.set_bool("core0", "enable_l2", true);
    assert_eq!(store.get_bool("core0", "enable_l2"), Some(true));
}

#[test]
fn int_roundtrip() {
    let mut store = OptionStore::default();
    store.set_int("core0", "commit_rate", 100);
    assert_eq!(store.get_int("core0", "commit_rate"), Some(100));
}

#[test]
fn str_roundtrip() {
    let mut store = OptionStore::default();
    store.set_str("core0", "predictor", "tournament");
    assert_eq!(store.get_str("core0", "predictor"), Some("tournament"));
}

// ══════════════════════════════════════════════════════════
// 2. Exact-triple lookup, no coercion
// ══════════════════════════════════════════════════════════

#[test]
fn lookup_misses_other_instance() {
    let mut store = OptionStore::default();
    store.set_int("core0", "commit_rate", 100);
    assert_eq!(store.get_int("core1", "commit_rate"), None);
}

#[test]
fn lookup_misses_other_option() {
    let mut store = OptionStore::default();
    store.set_int("core0", "commit_rate", 100);
    assert_eq!(store.get_int("core0", "halt_at"), None);
}

#[test]
fn no_cross_type_coercion() {
    let mut store = OptionStore::default();
    store.set_int("core0", "commit_rate", 1);
    assert_eq!(store.get_bool("core0", "commit_rate"), None);
    assert_eq!(store.get_str("core0", "commit_rate"), None);
}

#[test]
fn duplicate_set_overwrites() {
    let mut store = OptionStore::default();
    store.set_str("bus0", "arbiter", "fixed");
    store.set_str("bus0", "arbiter", "round_robin");
    assert_eq!(store.get_str("bus0", "arbiter"), Some("round_robin"));
}

// ══════════════════════════════════════════════════════════
// 3. Prefix + index composition
// ══════════════════════════════════════════════════════════

#[test]
fn instance_name_composition() {
    assert_eq!(instance_name("core", 3), "core3");
    assert_eq!(instance_name("l1d_", 0), "l1d_0");
}

#[test]
fn indexed_set_matches_plain_get() {
    let mut store = OptionStore::default();
    store.set_int_indexed("core", 2, "commit_rate", 7);
    assert_eq!(store.get_int("core2", "commit_rate"), Some(7));
    assert_eq!(store.get_int_indexed("core", 2, "commit_rate"), Some(7));
}

#[test]
fn indexed_bool_and_str() {
    let mut store = OptionStore::default();
    store.set_bool_indexed("core", 0, "trace", true);
    store.set_str_indexed("core", 0, "kind", "ooo");
    assert_eq!(store.get_bool_indexed("core", 0, "trace"), Some(true));
    assert_eq!(store.get_str_indexed("core", 0, "kind"), Some("ooo"));
}

// ══════════════════════════════════════════════════════════
// 4. Round-trip property over all three kinds
// ══════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn int_roundtrip_property(instance in "[a-z][a-z0-9_]{0,11}", opt in "[a-z][a-z0-9_]{0,11}", value in any::<i64>()) {
        let mut store = OptionStore::default();
        store.set_int(&instance, &opt, value);
        prop_assert_eq!(store.get_int(&instance, &opt), Some(value));
        prop_assert_eq!(store.get_bool(&instance, &opt), None);
        prop_assert_eq!(store.get_str(&instance, &opt), None);
    }

    #[test]
    fn str_roundtrip_property(instance in "[a-z][a-z0-9_]{0,11}", opt in "[a-z][a-z0-9_]{0,11}", value in ".*") {
        let mut store = OptionStore::default();
        store.set_str(&instance, &opt, &value);
        prop_assert_eq!(store.get_str(&instance, &opt), Some(value.as_str()));
    }

    #[test]
    fn bool_roundtrip_property(instance in "[a-z][a-z0-9_]{0,11}", opt in "[a-z][a-z0-9_]{0,11}", value in any::<bool>()) {
        let mut store = OptionStore::default();
        store.set_bool(&instance, &opt, value);
        prop_assert_eq!(store.get_bool(&instance, &opt), Some(value));
    }
}
