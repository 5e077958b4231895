//! Loop shortcuts: recognize known nine-instruction loop idioms and replace their execution
//! with a closed-form state update.

pub mod divisor_count;
pub mod divisor_sum;

pub use divisor_count::DivisorCountLoop;
pub use divisor_sum::DivisorSumLoop;

use crate::error::VmResult;
use crate::types::{ExecutionState, Instruction, Program, RegisterFile};
use std::ops::Range;

/// Instructions in every recognized loop body.
pub const LOOP_LEN: usize = 9;

/// A replaceable loop anchored at a fixed address.
pub trait LoopOptimizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Address the runner dispatches on.
    fn entry(&self) -> usize;

    /// Addresses owned by the loop; a shortcut leaves the pointer outside this range.
    fn range(&self) -> Range<usize> {
        self.entry()..self.entry() + LOOP_LEN
    }

    /// True when `program` still holds this loop at `entry` with the same registers.
    fn matches(&self, program: &Program) -> bool;

    /// State the plain interpreter would reach on leaving the loop, or `None` to fall back
    /// to plain interpretation (operands out of range, possible overflow).
    fn apply(&self, state: &ExecutionState) -> VmResult<Option<ExecutionState>>;
}

/// Every built-in idiom found anywhere in `program`.
#[must_use]
pub fn detect_idioms(program: &Program) -> Vec<Box<dyn LoopOptimizer>> {
    let mut found: Vec<Box<dyn LoopOptimizer>> = Vec::new();
    for entry in 0..program.len() {
        if let Some(idiom) = DivisorCountLoop::detect(program, entry) {
            crate::vm_log!("optimizer: {} detected at {}", idiom.name(), entry);
            found.push(Box::new(idiom));
        } else if let Some(idiom) = DivisorSumLoop::detect(program, entry) {
            crate::vm_log!("optimizer: {} detected at {}", idiom.name(), entry);
            found.push(Box::new(idiom));
        }
    }
    found
}

/// The `LOOP_LEN` instructions starting at `entry`.
pub(crate) fn loop_window(program: &Program, entry: usize) -> Option<&[Instruction; LOOP_LEN]> {
    let end = entry.checked_add(LOOP_LEN)?;
    program.instructions.get(entry..end)?.try_into().ok()
}

/// `a`/`b` are `x` and `y` in either order.
pub(crate) fn operands_are(instruction: &Instruction, x: i64, y: i64) -> bool {
    (instruction.a, instruction.b) == (x, y) || (instruction.a, instruction.b) == (y, x)
}

pub(crate) fn all_distinct(registers: &[i64]) -> bool {
    registers
        .iter()
        .enumerate()
        .all(|(i, r)| !registers[i + 1..].contains(r))
}

/// Validate loop registers against the live register file.
pub(crate) fn register_indices<const N: usize>(
    registers: &RegisterFile,
    operands: [i64; N],
) -> Option<[usize; N]> {
    let mut indices = [0usize; N];
    for (slot, operand) in indices.iter_mut().zip(operands) {
        *slot = registers.check_index(operand).ok()?;
    }
    Some(indices)
}
