//! The full handler set, one per operation.

use super::arithmetic::{
    AddImmediateInstruction, AddRegisterInstruction, MultiplyImmediateInstruction,
    MultiplyRegisterInstruction,
};
use super::bitwise::{
    AndImmediateInstruction, AndRegisterInstruction, OrImmediateInstruction, OrRegisterInstruction,
};
use super::comparison::{
    EqualImmediateRegisterInstruction, EqualRegisterImmediateInstruction,
    EqualRegisterRegisterInstruction, GreaterThanImmediateRegisterInstruction,
    GreaterThanRegisterImmediateInstruction, GreaterThanRegisterRegisterInstruction,
};
use super::register_ops::{SetImmediateInstruction, SetRegisterInstruction};
use super::base::InstructionHandler;
use crate::config::NUM_OPERATIONS;

/// Every handler, in `Operation::ALL` order.
pub fn all_instructions() -> [Box<dyn InstructionHandler>; NUM_OPERATIONS] {
    [
        // Arithmetic
        Box::new(AddRegisterInstruction::new()),
        Box::new(AddImmediateInstruction::new()),
        Box::new(MultiplyRegisterInstruction::new()),
        Box::new(MultiplyImmediateInstruction::new()),
        // Bitwise
        Box::new(AndRegisterInstruction::new()),
        Box::new(AndImmediateInstruction::new()),
        Box::new(OrRegisterInstruction::new()),
        Box::new(OrImmediateInstruction::new()),
        // Assignment
        Box::new(SetRegisterInstruction::new()),
        Box::new(SetImmediateInstruction::new()),
        // Comparison
        Box::new(GreaterThanImmediateRegisterInstruction::new()),
        Box::new(GreaterThanRegisterImmediateInstruction::new()),
        Box::new(GreaterThanRegisterRegisterInstruction::new()),
        Box::new(EqualImmediateRegisterInstruction::new()),
        Box::new(EqualRegisterImmediateInstruction::new()),
        Box::new(EqualRegisterRegisterInstruction::new()),
    ]
}
