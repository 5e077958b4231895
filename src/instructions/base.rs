//! Base instruction handler trait and operand helpers.

use crate::error::VmResult;
use crate::operation::{OperandMode, Operation};
use crate::types::RegisterFile;

/// Operands and register file handed to a handler. `registers` is the caller's fresh copy;
/// handlers read their sources and then write only register `c`.
pub struct InstructionContext<'a> {
    pub registers: &'a mut RegisterFile,
    pub a: i64,
    pub b: i64,
    pub c: i64,
}

/// Resolve an operand to its value under `mode` (register lookup or literal).
pub fn operand_value(registers: &RegisterFile, operand: i64, mode: OperandMode) -> VmResult<i64> {
    match mode {
        OperandMode::Register => registers.read(operand),
        OperandMode::Immediate | OperandMode::Unused => Ok(operand),
    }
}

/// Write the result into register `c` of the context.
pub fn write_destination(context: &mut InstructionContext<'_>, value: i64) -> VmResult<()> {
    let index = context.registers.check_index(context.c)?;
    context.registers.store(index, value);
    Ok(())
}

/// Base trait for all instruction handlers.
pub trait InstructionHandler: Send + Sync {
    fn operation(&self) -> Operation;

    fn name(&self) -> &'static str {
        self.operation().mnemonic()
    }

    /// Execute against the context. Validates `c` first, then `a`, then `b`.
    fn execute(&self, context: &mut InstructionContext<'_>) -> VmResult<()>;

    fn disassemble(&self, a: i64, b: i64, c: i64) -> String {
        let (mode_a, mode_b) = self.operation().operand_modes();
        let render = |operand: i64, mode: OperandMode| match mode {
            OperandMode::Register => format!("r{operand}"),
            OperandMode::Immediate => operand.to_string(),
            OperandMode::Unused => "_".to_string(),
        };
        format!(
            "{} {} {} r{}",
            self.name(),
            render(a, mode_a),
            render(b, mode_b),
            c
        )
    }
}

/// Shared body of every handler: validate `c`, resolve `a`/`b` by the operation's operand modes
/// (register operands are bounds-checked), apply, write `c`.
pub fn execute_binary(
    context: &mut InstructionContext<'_>,
    operation: Operation,
    apply: fn(i64, i64) -> i64,
) -> VmResult<()> {
    context.registers.check_index(context.c)?;
    let (mode_a, mode_b) = operation.operand_modes();
    let x = operand_value(context.registers, context.a, mode_a)?;
    let y = operand_value(context.registers, context.b, mode_b)?;
    write_destination(context, apply(x, y))
}

/// Declare a unit-struct handler for `$operation` computing `$apply(a_value, b_value)`.
macro_rules! binary_instruction {
    ($name:ident, $operation:expr, $apply:expr) => {
        pub struct $name;

        impl $name {
            #[must_use]
            pub const fn new() -> Self {
                Self
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $crate::instructions::base::InstructionHandler for $name {
            fn operation(&self) -> $crate::operation::Operation {
                $operation
            }
            fn execute(
                &self,
                context: &mut $crate::instructions::base::InstructionContext<'_>,
            ) -> $crate::error::VmResult<()> {
                $crate::instructions::base::execute_binary(context, $operation, $apply)
            }
        }
    };
}

pub(crate) use binary_instruction;
