//! Program runner: drives the instruction pointer through a program, optionally binding it to a
//! register and dispatching to loop shortcuts.

use crate::config::VERIFY_STEP_LIMIT;
use crate::error::{VmError, VmResult};
use crate::evaluator::evaluate;
use crate::optimizer::{detect_idioms, LoopOptimizer};
use crate::types::{ExecutionState, Program};
use std::ops::ControlFlow;

/// Runtime options for a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Fail with `StepLimitExceeded` after this many steps (a shortcut counts as one).
    pub step_limit: Option<u64>,
    /// Replay every shortcut without it and fail if the states differ.
    pub verify_optimizations: bool,
}

impl RunConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_optimizations = verify;
        self
    }
}

/// Outcome of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub state: ExecutionState,
    /// Executed instructions plus applied shortcuts.
    pub steps: u64,
    pub shortcuts: u64,
    /// False when an observer stopped the run before the program halted.
    pub completed: bool,
}

pub struct Runner<'p> {
    program: &'p Program,
    config: RunConfig,
    optimizers: Vec<Box<dyn LoopOptimizer>>,
}

impl<'p> Runner<'p> {
    #[must_use]
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            config: RunConfig::default(),
            optimizers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn program(&self) -> &'p Program {
        self.program
    }

    /// Register a shortcut. It must match this runner's program and must not overlap a
    /// shortcut already registered.
    pub fn add_optimizer(&mut self, optimizer: Box<dyn LoopOptimizer>) -> VmResult<()> {
        if !optimizer.matches(self.program) {
            return Err(VmError::optimization(
                optimizer.name(),
                optimizer.entry(),
                "loop pattern not present in program",
            ));
        }
        let range = optimizer.range();
        if let Some(existing) = self
            .optimizers
            .iter()
            .find(|o| o.range().start < range.end && range.start < o.range().end)
        {
            return Err(VmError::optimization(
                optimizer.name(),
                optimizer.entry(),
                format!("overlaps {} at {}", existing.name(), existing.entry()),
            ));
        }
        self.optimizers.push(optimizer);
        Ok(())
    }

    /// Register every built-in idiom found in the program.
    #[must_use]
    pub fn with_detected_optimizers(mut self) -> Self {
        for optimizer in detect_idioms(self.program) {
            if self.add_optimizer(optimizer).is_err() {
                crate::vm_log!("runner: skipped overlapping idiom");
            }
        }
        self
    }

    #[must_use]
    pub fn optimizer_count(&self) -> usize {
        self.optimizers.len()
    }

    /// Execute one instruction without shortcuts. Returns `false` (and does nothing) once the
    /// program has halted.
    pub fn step(&self, state: &mut ExecutionState) -> VmResult<bool> {
        let Some(&instruction) = self.program.fetch(state.ip) else {
            return Ok(false);
        };
        crate::vm_trace!(
            "{:>6} {:<20} {:?}",
            state.ip,
            instruction.to_string(),
            state.registers
        );
        match self.program.ip_register {
            Some(register) => {
                let bound = register as i64;
                let index = state.registers.check_index(bound)?;
                state.registers.store(index, state.ip);
                state.registers = evaluate(&state.registers, &instruction)?;
                state.ip = state.registers.read(bound)?;
            }
            None => state.registers = evaluate(&state.registers, &instruction)?,
        }
        state.ip = state.ip.wrapping_add(1);
        Ok(true)
    }

    /// Run to completion.
    pub fn run(&self, initial: ExecutionState) -> VmResult<RunReport> {
        self.run_observed(initial, |_| ControlFlow::Continue(()))
    }

    /// Run to completion, calling `observer` with the state before every step. `Break` stops
    /// the run and the report is marked incomplete.
    pub fn run_observed<F>(&self, initial: ExecutionState, mut observer: F) -> VmResult<RunReport>
    where
        F: FnMut(&ExecutionState) -> ControlFlow<()>,
    {
        if let Some(register) = self.program.ip_register {
            initial.registers.check_index(register as i64)?;
        }
        crate::vm_log!(
            "runner: start ip={} registers={:?} instructions={} shortcuts={}",
            initial.ip,
            initial.registers,
            self.program.len(),
            self.optimizers.len()
        );

        let mut state = initial;
        let mut steps = 0u64;
        let mut shortcuts = 0u64;
        while !state.is_halted(self.program.len()) {
            if observer(&state).is_break() {
                crate::vm_log!("runner: stopped by observer at ip={} after {} steps", state.ip, steps);
                return Ok(RunReport {
                    state,
                    steps,
                    shortcuts,
                    completed: false,
                });
            }
            if let Some(limit) = self.config.step_limit {
                if steps >= limit {
                    return Err(VmError::StepLimitExceeded { limit });
                }
            }
            match self.shortcut(&state)? {
                Some(next) => {
                    state = next;
                    shortcuts += 1;
                }
                None => {
                    self.step(&mut state)?;
                }
            }
            steps += 1;
        }

        crate::vm_log!(
            "runner: halted ip={} registers={:?} steps={} shortcuts={}",
            state.ip,
            state.registers,
            steps,
            shortcuts
        );
        Ok(RunReport {
            state,
            steps,
            shortcuts,
            completed: true,
        })
    }

    fn shortcut(&self, state: &ExecutionState) -> VmResult<Option<ExecutionState>> {
        let Ok(address) = usize::try_from(state.ip) else {
            return Ok(None);
        };
        let Some(optimizer) = self.optimizers.iter().find(|o| o.entry() == address) else {
            return Ok(None);
        };
        let Some(next) = optimizer.apply(state)? else {
            return Ok(None);
        };
        if self.config.verify_optimizations {
            self.verify(optimizer.as_ref(), state, &next)?;
        }
        Ok(Some(next))
    }

    /// Replay the loop plainly until the pointer leaves its range and compare.
    fn verify(
        &self,
        optimizer: &dyn LoopOptimizer,
        start: &ExecutionState,
        shortcut: &ExecutionState,
    ) -> VmResult<()> {
        let range = optimizer.range();
        let mut replay = start.clone();
        let mut steps = 0u64;
        loop {
            if steps >= VERIFY_STEP_LIMIT {
                return Err(VmError::optimization(
                    optimizer.name(),
                    optimizer.entry(),
                    format!("replay did not leave the loop within {VERIFY_STEP_LIMIT} steps"),
                ));
            }
            if !self.step(&mut replay)? {
                break;
            }
            steps += 1;
            let inside = usize::try_from(replay.ip).map_or(false, |ip| range.contains(&ip));
            if !inside {
                break;
            }
        }
        if replay != *shortcut {
            return Err(VmError::optimization(
                optimizer.name(),
                optimizer.entry(),
                format!(
                    "shortcut gave ip={} {:?}, replay gave ip={} {:?}",
                    shortcut.ip, shortcut.registers, replay.ip, replay.registers
                ),
            ));
        }
        Ok(())
    }
}

/// Run `program` from `initial` with no shortcuts and return the halted state.
pub fn run(program: &Program, initial: ExecutionState) -> VmResult<ExecutionState> {
    Runner::new(program).run(initial).map(|report| report.state)
}
