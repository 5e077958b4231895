//! Comparison instructions: GTIR, GTRI, GTRR, EQIR, EQRI, EQRR.
//! Result is exactly 1 when the comparison holds, else 0.

use crate::instructions::base::binary_instruction;
use crate::operation::Operation;

fn greater_than(x: i64, y: i64) -> i64 {
    i64::from(x > y)
}

fn equal(x: i64, y: i64) -> i64 {
    i64::from(x == y)
}

// a > r[b]
binary_instruction!(GreaterThanImmediateRegisterInstruction, Operation::Gtir, greater_than);
// r[a] > b
binary_instruction!(GreaterThanRegisterImmediateInstruction, Operation::Gtri, greater_than);
// r[a] > r[b]
binary_instruction!(GreaterThanRegisterRegisterInstruction, Operation::Gtrr, greater_than);
// a == r[b]
binary_instruction!(EqualImmediateRegisterInstruction, Operation::Eqir, equal);
// r[a] == b
binary_instruction!(EqualRegisterImmediateInstruction, Operation::Eqri, equal);
// r[a] == r[b]
binary_instruction!(EqualRegisterRegisterInstruction, Operation::Eqrr, equal);
