//! Per-component option store.
//!
//! Three separately typed tables (bool, int, string) keyed by
//! component-instance name. Written by machine generators during assembly,
//! read by core and controller builders, read-only afterwards. Lookups match
//! the exact (instance, option, type) triple; there is no type coercion. A
//! convenience form composes the instance name from a component prefix and an
//! integer index.

use std::collections::HashMap;

/// Composes an instance name from a component prefix and index.
pub fn instance_name(prefix: &str, index: usize) -> String {
    format!("{prefix}{index}")
}

/// Named, typed option bags indexed by component-instance name.
#[derive(Debug, Default, Clone)]
pub struct OptionStore {
    bools: HashMap<String, HashMap<String, bool>>,
    ints: HashMap<String, HashMap<String, i64>>,
    strings: HashMap<String, HashMap<String, String>>,
}

impl OptionStore {
    /// Stores a bool option, creating the instance table lazily. Duplicate
    /// sets overwrite.
    pub fn set_bool(&mut self, instance: &str, opt: &str, value: bool) {
        let _ = self
            .bools
            .entry(instance.to_string())
            .or_default()
            .insert(opt.to_string(), value);
    }

    /// Stores an int option, creating the instance table lazily.
    pub fn set_int(&mut self, instance: &str, opt: &str, value: i64) {
        let _ = self
            .ints
            .entry(instance.to_string())
            .or_default()
            .insert(opt.to_string(), value);
    }

    /// Stores a string option, creating the instance table lazily.
    pub fn set_str(&mut self, instance: &str, opt: &str, value: &str) {
        let _ = self
            .strings
            .entry(instance.to_string())
            .or_default()
            .insert(opt.to_string(), value.to_string());
    }

    /// Returns the bool option for the exact (instance, option) pair.
    pub fn get_bool(&self, instance: &str, opt: &str) -> Option<bool> {
        self.bools.get(instance).and_then(|t| t.get(opt)).copied()
    }

    /// Returns the int option for the exact (instance, option) pair.
    pub fn get_int(&self, instance: &str, opt: &str) -> Option<i64> {
        self.ints.get(instance).and_then(|t| t.get(opt)).copied()
    }

    /// Returns the string option for the exact (instance, option) pair.
    pub fn get_str(&self, instance: &str, opt: &str) -> Option<&str> {
        self.strings
            .get(instance)
            .and_then(|t| t.get(opt))
            .map(String::as_str)
    }

    /// Stores a bool option for the instance `prefix || index`.
    pub fn set_bool_indexed(&mut self, prefix: &str, index: usize, opt: &str, value: bool) {
        self.set_bool(&instance_name(prefix, index), opt, value);
    }

    /// Stores an int option for the instance `prefix || index`.
    pub fn set_int_indexed(&mut self, prefix: &str, index: usize, opt: &str, value: i64) {
        self.set_int(&instance_name(prefix, index), opt, value);
    }

    /// Stores a string option for the instance `prefix || index`.
    pub fn set_str_indexed(&mut self, prefix: &str, index: usize, opt: &str, value: &str) {
        self.set_str(&instance_name(prefix, index), opt, value);
    }

    /// Returns the bool option for the instance `prefix || index`.
    pub fn get_bool_indexed(&self, prefix: &str, index: usize, opt: &str) -> Option<bool> {
        self.get_bool(&instance_name(prefix, index), opt)
    }

    /// Returns the int option for the instance `prefix || index`.
    pub fn get_int_indexed(&self, prefix: &str, index: usize, opt: &str) -> Option<i64> {
        self.get_int(&instance_name(prefix, index), opt)
    }

    /// Returns the string option for the instance `prefix || index`.
    pub fn get_str_indexed(&self, prefix: &str, index: usize, opt: &str) -> Option<&str> {
        self.get_str(&instance_name(prefix, index), opt)
    }
}
