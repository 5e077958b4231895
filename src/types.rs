//! VM type definitions: register files, instructions, samples, programs and execution state.

use crate::error::{VmError, VmResult};
use crate::operation::Operation;
use std::fmt;

// ============================================================================
// Register file
// ============================================================================

/// Fixed-length file of `i64` registers. The evaluator never mutates one in place; it
/// produces a new file with a single register replaced.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct RegisterFile(Vec<i64>);

impl RegisterFile {
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self(vec![0; len])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<i64> {
        self.0.get(index).copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<i64> {
        self.0
    }

    /// Validate an operand used as a register index.
    pub fn check_index(&self, index: i64) -> VmResult<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.0.len())
            .ok_or(VmError::RegisterOutOfBounds {
                index,
                len: self.0.len(),
            })
    }

    /// Value of the register addressed by operand `index`.
    pub fn read(&self, index: i64) -> VmResult<i64> {
        let i = self.check_index(index)?;
        Ok(self.0[i])
    }

    /// Copy of this file with register `index` set to `value`.
    pub fn with_value(&self, index: i64, value: i64) -> VmResult<Self> {
        let i = self.check_index(index)?;
        let mut next = self.clone();
        next.0[i] = value;
        Ok(next)
    }

    /// In-place store for the owners of execution state (ip binding, loop shortcuts).
    /// `index` must already be validated.
    pub(crate) fn store(&mut self, index: usize, value: i64) {
        self.0[index] = value;
    }
}

impl From<Vec<i64>> for RegisterFile {
    fn from(values: Vec<i64>) -> Self {
        Self(values)
    }
}

impl<const N: usize> From<[i64; N]> for RegisterFile {
    fn from(values: [i64; N]) -> Self {
        Self(values.to_vec())
    }
}

impl fmt::Debug for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

// ============================================================================
// Instructions
// ============================================================================

/// Decoded instruction. `c` is always a destination register index; `a`/`b` are
/// register indices or literals depending on `operation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub operation: Operation,
    pub a: i64,
    pub b: i64,
    pub c: i64,
}

impl Instruction {
    #[must_use]
    pub const fn new(operation: Operation, a: i64, b: i64, c: i64) -> Self {
        Self { operation, a, b, c }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.operation, self.a, self.b, self.c)
    }
}

/// Instruction whose opcode has not been resolved to an `Operation` yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawInstruction {
    pub opcode: u32,
    pub a: i64,
    pub b: i64,
    pub c: i64,
}

impl RawInstruction {
    #[must_use]
    pub const fn new(opcode: u32, a: i64, b: i64, c: i64) -> Self {
        Self { opcode, a, b, c }
    }

    /// Same operands under a concrete operation.
    #[must_use]
    pub const fn with_operation(&self, operation: Operation) -> Instruction {
        Instruction::new(operation, self.a, self.b, self.c)
    }
}

impl fmt::Display for RawInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.opcode, self.a, self.b, self.c)
    }
}

// ============================================================================
// Samples
// ============================================================================

/// Observed effect of one unresolved instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    pub before: RegisterFile,
    pub instruction: RawInstruction,
    pub after: RegisterFile,
}

// ============================================================================
// Programs
// ============================================================================

/// Instruction list with an optional register bound to the instruction pointer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program<I = Instruction> {
    pub ip_register: Option<usize>,
    pub instructions: Vec<I>,
}

impl<I> Program<I> {
    #[must_use]
    pub fn new(ip_register: Option<usize>, instructions: Vec<I>) -> Self {
        Self {
            ip_register,
            instructions,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at an instruction-pointer value, or `None` once the pointer has left the program.
    #[must_use]
    pub fn fetch(&self, ip: i64) -> Option<&I> {
        usize::try_from(ip).ok().and_then(|i| self.instructions.get(i))
    }
}

impl<I: Clone> Program<I> {
    /// Copy of the program with the instruction at `address` replaced.
    pub fn patch(&self, address: usize, instruction: I) -> VmResult<Self> {
        if address >= self.instructions.len() {
            return Err(VmError::AddressOutOfRange {
                address,
                len: self.instructions.len(),
            });
        }
        let mut patched = self.clone();
        patched.instructions[address] = instruction;
        Ok(patched)
    }
}

impl Program<Instruction> {
    /// Copy of the program that halts as soon as execution reaches `address`: the
    /// instruction there becomes `seti <len> 0 <ip_register>`, which jumps past the end.
    pub fn with_halt_at(&self, address: usize) -> VmResult<Self> {
        let ip_register = self.ip_register.ok_or(VmError::MissingIpRegister)?;
        let exit = Instruction::new(Operation::Seti, self.len() as i64, 0, ip_register as i64);
        self.patch(address, exit)
    }
}

impl fmt::Display for Program<Instruction> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ip) = self.ip_register {
            writeln!(f, "{} {ip}", crate::config::IP_DIRECTIVE)?;
        }
        for instruction in &self.instructions {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Execution state
// ============================================================================

/// Instruction pointer plus registers; the runner's only mutable aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExecutionState {
    pub ip: i64,
    pub registers: RegisterFile,
}

impl ExecutionState {
    #[must_use]
    pub fn new(ip: i64, registers: RegisterFile) -> Self {
        Self { ip, registers }
    }

    /// `ip = 0` with `len` zeroed registers.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self::new(0, RegisterFile::zeroed(len))
    }

    /// `ip = 0` with `len` registers, zero except for the given `(index, value)` seeds.
    pub fn seeded(len: usize, seeds: &[(usize, i64)]) -> VmResult<Self> {
        let mut registers = RegisterFile::zeroed(len);
        for &(index, value) in seeds {
            registers = registers.with_value(index as i64, value)?;
        }
        Ok(Self::new(0, registers))
    }

    /// True once the pointer is outside `[0, program_len)`.
    #[must_use]
    pub fn is_halted(&self, program_len: usize) -> bool {
        usize::try_from(self.ip).map_or(true, |ip| ip >= program_len)
    }
}
