//! Divisor-sum inner loop: for `j` in `j0..=max(j0, n)`, add `i` to `acc` whenever `i * j == n`.
//!
//! ```text
//! s+0  mulr i j t
//! s+1  eqrr t n t
//! s+2  addr t p p
//! s+3  addi p 1 p
//! s+4  addr i acc acc
//! s+5  addi j 1 j
//! s+6  gtrr j n t
//! s+7  addr p t p
//! s+8  seti s-1 _ p
//! ```

use super::{all_distinct, loop_window, operands_are, register_indices, LoopOptimizer};
use crate::error::VmResult;
use crate::operation::Operation;
use crate::types::{ExecutionState, Program};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DivisorSumLoop {
    pub entry: usize,
    pub factor: i64,
    pub candidate: i64,
    pub target: i64,
    pub scratch: i64,
    pub accumulator: i64,
    pub ip_register: i64,
}

impl DivisorSumLoop {
    #[must_use]
    pub fn detect(program: &Program, entry: usize) -> Option<Self> {
        let p = program.ip_register? as i64;
        let [product, equal, branch, skip, add, step, compare, exit, back] =
            loop_window(program, entry)?;
        let t = product.c;
        let j = step.a;
        let i = if product.a == j { product.b } else { product.a };
        let n = compare.b;
        let acc = add.c;
        let entry_operand = i64::try_from(entry).ok()?;

        let shaped = entry > 0
            && product.operation == Operation::Mulr
            && operands_are(product, i, j)
            && equal.operation == Operation::Eqrr
            && operands_are(equal, t, n)
            && equal.c == t
            && branch.operation == Operation::Addr
            && operands_are(branch, t, p)
            && branch.c == p
            && skip.operation == Operation::Addi
            && (skip.a, skip.b, skip.c) == (p, 1, p)
            && add.operation == Operation::Addr
            && operands_are(add, i, acc)
            && step.operation == Operation::Addi
            && (step.b, step.c) == (1, j)
            && compare.operation == Operation::Gtrr
            && (compare.a, compare.c) == (j, t)
            && exit.operation == Operation::Addr
            && operands_are(exit, p, t)
            && exit.c == p
            && back.operation == Operation::Seti
            && (back.a, back.c) == (entry_operand - 1, p)
            && all_distinct(&[i, j, n, t, acc, p]);

        shaped.then_some(Self {
            entry,
            factor: i,
            candidate: j,
            target: n,
            scratch: t,
            accumulator: acc,
            ip_register: p,
        })
    }
}

impl LoopOptimizer for DivisorSumLoop {
    fn name(&self) -> &'static str {
        "divisor-sum"
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
        let Some([i, j, n, t, acc, p]) = register_indices(
            &state.registers,
            [
                self.factor,
                self.candidate,
                self.target,
                self.scratch,
                self.accumulator,
                self.ip_register,
            ],
        ) else {
            return Ok(None);
        };
        let values = state.registers.as_slice();
        let (factor, start, target) = (values[i], values[j], values[n]);
        let last = start.max(target);
        let Some(after_last) = last.checked_add(1) else {
            return Ok(None);
        };
        if factor.checked_mul(start).is_none() || factor.checked_mul(last).is_none() {
            return Ok(None);
        }

        let hit = factor != 0
            && target.checked_rem(factor) == Some(0)
            && target
                .checked_div(factor)
                .map_or(false, |quotient| (start..=last).contains(&quotient));

        let mut next = state.clone();
        if hit {
            next.registers.store(acc, values[acc].wrapping_add(factor));
        }
        let exit = self.entry as i64 + 8;
        next.registers.store(j, after_last);
        next.registers.store(t, 1);
        next.registers.store(p, exit);
        next.ip = exit + 1;
        crate::vm_log!(
            "optimizer: {} at {}: i={} j={}..={} n={} hit={}",
            self.name(),
            self.entry,
            factor,
            start,
            last,
            target,
            hit
        );
        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ProgramParser;
    use crate::runner::Runner;
    use crate::types::RegisterFile;
    use proptest::prelude::*;

    const PROGRAM: &str = "#ip 3\nseti 30 0 2\nseti 1 0 4\nseti 1 0 5\nmulr 4 5 1\neqrr 1 2 1\naddr 1 3 3\naddi 3 1 3\naddr 4 0 0\naddi 5 1 5\ngtrr 5 2 1\naddr 3 1 3\nseti 2 0 3\naddi 4 1 4\ngtrr 4 2 1\naddr 1 3 3\nseti 1 0 3\nmulr 3 3 3\n";

    fn program() -> Program {
        ProgramParser::new().parse_program(PROGRAM).unwrap()
    }

    fn replay(program: &Program, optimizer: &DivisorSumLoop, state: &ExecutionState) -> ExecutionState {
        let runner = Runner::new(program);
        let mut state = state.clone();
        runner.step(&mut state).unwrap();
        while optimizer.range().contains(&(state.ip as usize)) {
            runner.step(&mut state).unwrap();
        }
        state
    }

    #[test]
    fn detects_loop_registers() {
        assert_eq!(
            DivisorSumLoop::detect(&program(), 3),
            Some(DivisorSumLoop {
                entry: 3,
                factor: 4,
                candidate: 5,
                target: 2,
                scratch: 1,
                accumulator: 0,
                ip_register: 3,
            })
        );
        assert!(DivisorSumLoop::detect(&program(), 2).is_none());
    }

    #[test]
    fn commuted_operands_are_accepted() {
        let source = PROGRAM
            .replace("mulr 4 5 1", "mulr 5 4 1")
            .replace("eqrr 1 2 1", "eqrr 2 1 1")
            .replace("addr 4 0 0", "addr 0 4 0")
            .replace("addr 3 1 3\nseti 2", "addr 1 3 3\nseti 2");
        let program = ProgramParser::new().parse_program(&source).unwrap();
        assert!(DivisorSumLoop::detect(&program, 3).is_some());
    }

    #[test]
    fn modified_body_no_longer_matches() {
        let optimizer = DivisorSumLoop::detect(&program(), 3).unwrap();
        let patched = program()
            .patch(7, crate::types::Instruction::new(Operation::Addi, 0, 1, 0))
            .unwrap();
        assert!(optimizer.matches(&program()));
        assert!(!optimizer.matches(&patched));
    }

    #[test]
    fn adds_factor_only_for_divisors() {
        let optimizer = DivisorSumLoop::detect(&program(), 3).unwrap();
        let divisor = ExecutionState::new(3, RegisterFile::from([10, 0, 30, 2, 6, 1]));
        let next = optimizer.apply(&divisor).unwrap().unwrap();
        assert_eq!(next.registers.as_slice(), &[16, 1, 30, 11, 6, 31]);
        assert_eq!(next.ip, 12);

        let other = ExecutionState::new(3, RegisterFile::from([10, 0, 30, 2, 7, 1]));
        let next = optimizer.apply(&other).unwrap().unwrap();
        assert_eq!(next.registers.get(0), Some(10));
    }

    #[test]
    fn declines_when_product_may_overflow() {
        let optimizer = DivisorSumLoop::detect(&program(), 3).unwrap();
        let state = ExecutionState::new(3, RegisterFile::from([0, 0, i64::MAX, 3, 2, 1]));
        assert_eq!(optimizer.apply(&state), Ok(None));
    }

    proptest! {
        #[test]
        fn shortcut_equals_replay(
            factor in 1i64..50,
            start in 0i64..60,
            target in 0i64..60,
            acc in -100i64..100,
            scratch in -3i64..3,
        ) {
            let program = program();
            let optimizer = DivisorSumLoop::detect(&program, 3).unwrap();
            let state = ExecutionState::new(
                3,
                RegisterFile::from([acc, scratch, target, 3, factor, start]),
            );
            let shortcut = optimizer.apply(&state).unwrap().unwrap();
            prop_assert_eq!(shortcut, replay(&program, &optimizer, &state));
        }
    }
}
