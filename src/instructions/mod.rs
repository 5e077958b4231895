//! Instruction set: handler trait, per-family handlers and the operation registry.

pub mod registry;
pub mod base;
pub mod arithmetic;
pub mod bitwise;
pub mod comparison;
pub mod register_ops;
pub mod registry_instructions;
