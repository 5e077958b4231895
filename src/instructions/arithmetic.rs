//! Arithmetic instructions: ADDR, ADDI, MULR, MULI.
//! Two's-complement wrapping on overflow; no other overflow handling.

use crate::instructions::base::binary_instruction;
use crate::operation::Operation;

fn add(x: i64, y: i64) -> i64 {
    x.wrapping_add(y)
}

fn multiply(x: i64, y: i64) -> i64 {
    x.wrapping_mul(y)
}

// r[c] = r[a] + r[b]
binary_instruction!(AddRegisterInstruction, Operation::Addr, add);
// r[c] = r[a] + b
binary_instruction!(AddImmediateInstruction, Operation::Addi, add);
// r[c] = r[a] * r[b]
binary_instruction!(MultiplyRegisterInstruction, Operation::Mulr, multiply);
// r[c] = r[a] * b
binary_instruction!(MultiplyImmediateInstruction, Operation::Muli, multiply);
