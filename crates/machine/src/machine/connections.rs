//! Connection graph.
//!
//! A declarative description of which controllers attach to which named
//! interconnects. Declarations accumulate during machine assembly; the graph
//! is materialized exactly once, after the memory hierarchy exists, and is
//! read-only from then on. Attachment order on a declaration is preserved and
//! is observable by the interconnect implementation.

use crate::traits::PortKind;

/// Handle to a connection declaration in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionId(pub(crate) usize);

/// One declared interconnect: its type key, instance name, and ordered
/// controller attachments.
#[derive(Debug, Clone)]
pub struct ConnectionDef {
    kind: String,
    name: String,
    attachments: Vec<(String, PortKind)>,
}

impl ConnectionDef {
    /// Returns the interconnect type key to resolve at materialization.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the declared instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attachments in declaration order.
    pub fn attachments(&self) -> &[(String, PortKind)] {
        &self.attachments
    }
}

/// Insertion-ordered collection of connection declarations.
#[derive(Debug, Default)]
pub struct ConnectionGraph {
    defs: Vec<ConnectionDef>,
    materialized: bool,
}

impl ConnectionGraph {
    /// Appends an empty declaration and returns its handle.
    pub(crate) fn declare(&mut self, kind: &str, name: String) -> ConnectionId {
        debug_assert!(!self.materialized, "connection graph is read-only");
        let id = ConnectionId(self.defs.len());
        self.defs.push(ConnectionDef {
            kind: kind.to_string(),
            name,
            attachments: Vec::new(),
        });
        id
    }

    /// Appends a (controller, port) attachment to the declaration at `id`.
    pub(crate) fn attach(&mut self, id: ConnectionId, controller: &str, port: PortKind) {
        debug_assert!(!self.materialized, "connection graph is read-only");
        if let Some(def) = self.defs.get_mut(id.0) {
            def.attachments.push((controller.to_string(), port));
        }
    }

    /// Returns the declarations in insertion order.
    pub fn defs(&self) -> &[ConnectionDef] {
        &self.defs
    }

    /// Returns whether the graph has been materialized.
    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    pub(crate) fn mark_materialized(&mut self) {
        self.materialized = true;
    }

    pub(crate) fn clear(&mut self) {
        self.defs.clear();
        self.materialized = false;
    }
}
