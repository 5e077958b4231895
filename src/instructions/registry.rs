//! Instruction registry: one handler per operation, stored in `Operation::ALL` order.

use crate::config::NUM_OPERATIONS;
use crate::instructions::base::InstructionHandler;
use crate::instructions::registry_instructions::all_instructions;
use crate::operation::Operation;

/// Handler table indexed by `Operation::index()`. Complete by construction, so lookups
/// cannot miss.
pub struct InstructionRegistry {
    handlers: [Box<dyn InstructionHandler>; NUM_OPERATIONS],
}

impl InstructionRegistry {
    #[must_use]
    pub fn new() -> Self {
        let handlers = all_instructions();
        debug_assert!(handlers
            .iter()
            .zip(Operation::ALL)
            .all(|(handler, operation)| handler.operation() == operation));
        Self { handlers }
    }

    #[must_use]
    pub fn handler(&self, operation: Operation) -> &dyn InstructionHandler {
        self.handlers[operation.index()].as_ref()
    }
}

impl Default for InstructionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
