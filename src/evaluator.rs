//! Pure instruction evaluation over register files.

use crate::error::VmResult;
use crate::instructions::base::InstructionContext;
use crate::instructions::registry::InstructionRegistry;
use crate::types::{Instruction, RegisterFile};
use std::sync::OnceLock;

fn get_registry() -> &'static InstructionRegistry {
    static REGISTRY: OnceLock<InstructionRegistry> = OnceLock::new();
    REGISTRY.get_or_init(InstructionRegistry::new)
}

/// Apply `instruction` to `registers`, returning a new file that differs at most in register `c`.
///
/// Fails with `RegisterOutOfBounds` when `c`, or an operand the operation reads as a register,
/// is not a valid index. The input file is never modified.
pub fn evaluate(registers: &RegisterFile, instruction: &Instruction) -> VmResult<RegisterFile> {
    let handler = get_registry().handler(instruction.operation);
    let mut next = registers.clone();
    let mut context = InstructionContext {
        registers: &mut next,
        a: instruction.a,
        b: instruction.b,
        c: instruction.c,
    };
    handler.execute(&mut context)?;
    Ok(next)
}

/// Human-readable form of an instruction with register operands marked (`addr r1 r2 r3`).
#[must_use]
pub fn disassemble(instruction: &Instruction) -> String {
    get_registry()
        .handler(instruction.operation)
        .disassemble(instruction.a, instruction.b, instruction.c)
}
