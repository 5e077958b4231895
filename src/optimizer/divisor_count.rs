//! Counting loop: `k` is stepped until `(k + 1) * C` exceeds `b`, leaving `k = floor(b / C)`.
//!
//! ```text
//! s+0  seti 0 _ k
//! s+1  addi k 1 t
//! s+2  muli t C t
//! s+3  gtrr t b t
//! s+4  addr t p p
//! s+5  addi p 1 p
//! s+6  seti s+8 _ p
//! s+7  addi k 1 k
//! s+8  seti s _ p
//! ```

use super::{all_distinct, loop_window, operands_are, register_indices, LoopOptimizer};
use crate::error::VmResult;
use crate::operation::Operation;
use crate::types::{ExecutionState, Program};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DivisorCountLoop {
    pub entry: usize,
    pub counter: i64,
    pub scratch: i64,
    pub bound: i64,
    pub divisor: i64,
    pub ip_register: i64,
}

impl DivisorCountLoop {
    /// Recognize the loop at `entry`. The pointer register must be the program's binding.
    #[must_use]
    pub fn detect(program: &Program, entry: usize) -> Option<Self> {
        let p = program.ip_register? as i64;
        let [init, bump, scale, compare, branch, skip, exit, advance, back] =
            loop_window(program, entry)?;
        let k = init.c;
        let t = bump.c;
        let b = compare.b;
        let divisor = scale.b;
        let entry_operand = i64::try_from(entry).ok()?;

        let shaped = init.operation == Operation::Seti
            && init.a == 0
            && bump.operation == Operation::Addi
            && (bump.a, bump.b) == (k, 1)
            && scale.operation == Operation::Muli
            && (scale.a, scale.c) == (t, t)
            && divisor > 0
            && compare.operation == Operation::Gtrr
            && (compare.a, compare.c) == (t, t)
            && branch.operation == Operation::Addr
            && operands_are(branch, t, p)
            && branch.c == p
            && skip.operation == Operation::Addi
            && (skip.a, skip.b, skip.c) == (p, 1, p)
            && exit.operation == Operation::Seti
            && (exit.a, exit.c) == (entry_operand + 8, p)
            && advance.operation == Operation::Addi
            && (advance.a, advance.b, advance.c) == (k, 1, k)
            && back.operation == Operation::Seti
            && (back.a, back.c) == (entry_operand, p)
            && all_distinct(&[k, t, b, p]);

        shaped.then_some(Self {
            entry,
            counter: k,
            scratch: t,
            bound: b,
            divisor,
            ip_register: p,
        })
    }
}

impl LoopOptimizer for DivisorCountLoop {
    fn name(&self) -> &'static str {
        "divisor-count"
    }

    fn entry(&self) -> usize {
        self.entry
    }

    fn matches(&self, program: &Program) -> bool {
        Self::detect(program, self.entry).as_ref() == Some(self)
    }

    fn apply(&self, state: &ExecutionState) -> VmResult<Option<ExecutionState>> {
        if usize::try_from(state.ip).ok() != Some(self.entry) {
            return Ok(None);
        }
        let Some([k, t, b, p]) = register_indices(
            &state.registers,
            [self.counter, self.scratch, self.bound, self.ip_register],
        ) else {
            return Ok(None);
        };
        let bound = state.registers.as_slice()[b];
        if bound.checked_add(self.divisor).is_none() {
            return Ok(None);
        }
        let count = if bound < 0 { 0 } else { bound / self.divisor };

        let mut next = state.clone();
        let exit = self.entry as i64 + 8;
        next.registers.store(k, count);
        next.registers.store(t, 1);
        next.registers.store(p, exit);
        next.ip = exit + 1;
        crate::vm_log!(
            "optimizer: {} at {}: floor({} / {}) = {}",
            self.name(),
            self.entry,
            bound,
            self.divisor,
            count
        );
        Ok(Some(next))
    }
}
