//! Bitwise instructions: BANR, BANI, BORR, BORI.

use crate::instructions::base::binary_instruction;
use crate::operation::Operation;

fn and(x: i64, y: i64) -> i64 {
    x & y
}

fn or(x: i64, y: i64) -> i64 {
    x | y
}

binary_instruction!(AndRegisterInstruction, Operation::Banr, and);
binary_instruction!(AndImmediateInstruction, Operation::Bani, and);
binary_instruction!(OrRegisterInstruction, Operation::Borr, or);
binary_instruction!(OrImmediateInstruction, Operation::Bori, or);
