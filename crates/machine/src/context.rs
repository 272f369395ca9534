//! Architectural context pool.
//!
//! Contexts are the guest emulator's architectural-state slots. They live in a
//! fixed-size pool owned by the machine; the machine claims them one at a time
//! in allocation order and binds each claimed slot to exactly one core for the
//! machine's lifetime. The pool hands out indices and tracks claims in a
//! used-bitset.

use crate::error::MachineError;
use crate::traits::CoreId;

/// Architectural maximum number of guest contexts.
pub const MAX_CONTEXTS: usize = 64;

/// Index of a context slot in the pool.
pub type ContextId = usize;

/// One architectural-state slot. Opaque to the driver beyond its identity and
/// the core it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    id: ContextId,
    owner: Option<CoreId>,
}

impl Context {
    /// Returns this context's pool index.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Returns the core this context is bound to, if claimed.
    pub fn owner(&self) -> Option<CoreId> {
        self.owner
    }
}

/// Fixed-size pool of guest contexts with an allocation cursor and used-bitset.
#[derive(Debug)]
pub struct ContextPool {
    slots: Vec<Context>,
    used: u64,
    cursor: usize,
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextPool {
    /// Creates a pool with all [`MAX_CONTEXTS`] slots unclaimed.
    pub fn new() -> Self {
        let slots = (0..MAX_CONTEXTS)
            .map(|id| Context { id, owner: None })
            .collect();
        Self {
            slots,
            used: 0,
            cursor: 0,
        }
    }

    /// Claims the next context in allocation order and binds it to `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::ContextPoolExhausted`] when every slot is claimed.
    pub fn claim(&mut self, owner: CoreId) -> Result<ContextId, MachineError> {
        if self.cursor >= MAX_CONTEXTS {
            return Err(MachineError::ContextPoolExhausted {
                limit: MAX_CONTEXTS,
            });
        }
        let id = self.cursor;
        self.cursor += 1;
        self.used |= 1 << id;
        self.slots[id].owner = Some(owner);
        Ok(id)
    }

    /// Returns the context at `id`, claimed or not.
    pub fn get(&self, id: ContextId) -> Option<&Context> {
        self.slots.get(id)
    }

    /// Returns whether the slot at `id` has been claimed.
    pub fn is_claimed(&self, id: ContextId) -> bool {
        id < MAX_CONTEXTS && self.used & (1 << id) != 0
    }

    /// Returns the number of claimed contexts.
    pub fn claimed(&self) -> usize {
        self.used.count_ones() as usize
    }

    /// Returns the lowest claimed context, if any. Used as the fallback
    /// binding when the engine exits.
    pub fn first_claimed(&self) -> Option<ContextId> {
        if self.used == 0 {
            None
        } else {
            Some(self.used.trailing_zeros() as usize)
        }
    }

    /// Releases every claim and rewinds the allocation cursor.
    pub(crate) fn release_all(&mut self) {
        for slot in &mut self.slots {
            slot.owner = None;
        }
        self.used = 0;
        self.cursor = 0;
    }
}
