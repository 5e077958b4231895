//! Halting-value watch: which seed for a compared register halts a program soonest, and which
//! halts it last before the compared sequence starts repeating.

use crate::error::{VmError, VmResult};
use crate::runner::Runner;
use crate::types::ExecutionState;
use std::collections::HashSet;
use std::ops::ControlFlow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HaltingValues {
    /// Value seen on the first visit; seeding it halts in the fewest steps.
    pub first: i64,
    /// Value seen on the last visit before a repeat; seeding it halts in the most steps.
    pub last: i64,
    /// Number of distinct values observed.
    pub distinct: usize,
}

/// Record `register` every time the pointer reaches `address`, until a value repeats or the
/// program halts.
pub fn find_halting_values(
    runner: &Runner<'_>,
    initial: ExecutionState,
    address: usize,
    register: usize,
) -> VmResult<HaltingValues> {
    let program_len = runner.program().len();
    if address >= program_len {
        return Err(VmError::AddressOutOfRange {
            address,
            len: program_len,
        });
    }
    let index = initial.registers.check_index(register as i64)?;
    let watched = address as i64;

    let mut seen = HashSet::new();
    let mut order = Vec::new();
    runner.run_observed(initial, |state| {
        if state.ip != watched {
            return ControlFlow::Continue(());
        }
        let value = state.registers.as_slice()[index];
        if !seen.insert(value) {
            crate::vm_log!("watch: {} repeats after {} values", value, order.len());
            return ControlFlow::Break(());
        }
        order.push(value);
        ControlFlow::Continue(())
    })?;

    match (order.first(), order.last()) {
        (Some(&first), Some(&last)) => Ok(HaltingValues {
            first,
            last,
            distinct: order.len(),
        }),
        _ => Err(VmError::WatchNeverReached { address }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ProgramParser;
    use crate::types::Program;

    const CYCLE: &str = "#ip 5\nseti 0 0 1\nmuli 1 3 1\naddi 1 1 1\nbani 1 7 1\neqrr 1 0 2\naddr 2 5 5\nseti 0 0 5\n";

    fn program() -> Program {
        ProgramParser::new().parse_program(CYCLE).unwrap()
    }

    #[test]
    fn finds_first_and_last_before_cycle() {
        let program = program();
        let runner = Runner::new(&program);
        let initial = ExecutionState::seeded(6, &[(0, 99)]).unwrap();
        let values = find_halting_values(&runner, initial, 4, 1).unwrap();
        assert_eq!(
            values,
            HaltingValues {
                first: 1,
                last: 0,
                distinct: 4
            }
        );
    }

    #[test]
    fn seeding_first_value_halts() {
        let program = program();
        let initial = ExecutionState::seeded(6, &[(0, 1)]).unwrap();
        let report = Runner::new(&program).run(initial).unwrap();
        assert!(report.completed);
        assert_eq!(report.state.ip, 7);
    }

    #[test]
    fn unreached_address_is_an_error() {
        let program = ProgramParser::new()
            .parse_program("#ip 0\nseti 5 0 0\nseti 1 0 1\n")
            .unwrap();
        let runner = Runner::new(&program);
        assert_eq!(
            find_halting_values(&runner, ExecutionState::zeroed(2), 1, 1),
            Err(VmError::WatchNeverReached { address: 1 })
        );
        assert_eq!(
            find_halting_values(&runner, ExecutionState::zeroed(2), 2, 1),
            Err(VmError::AddressOutOfRange { address: 2, len: 2 })
        );
    }
}
