//! Error taxonomy shared by the parser, evaluator, resolver, runner and optimizers.

use crate::operation::OperationSet;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// An operand used as a register index is outside `[0, len)`. The resolver treats this
    /// as "operation not applicable"; during a run it is fatal.
    #[error("register index {index} out of bounds: valid range [0, {len})")]
    RegisterOutOfBounds { index: i64, len: usize },

    #[error("no candidate operations left for opcode {opcode}")]
    NoCandidates { opcode: u32 },

    #[error("opcode {opcode} is still ambiguous: {candidates:?}")]
    AmbiguousMapping { opcode: u32, candidates: OperationSet },

    #[error("opcode {opcode} has no resolved operation")]
    UnknownOpcode { opcode: u32 },

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("optimization {name} at address {address} failed: {reason}")]
    OptimizationFailed {
        name: &'static str,
        address: usize,
        reason: String,
    },

    #[error("step limit of {limit} exceeded")]
    StepLimitExceeded { limit: u64 },

    #[error("program has no #ip register binding")]
    MissingIpRegister,

    #[error("address {address} is outside the program (length {len})")]
    AddressOutOfRange { address: usize, len: usize },

    #[error("watched address {address} was never reached")]
    WatchNeverReached { address: usize },
}

impl VmError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn optimization(name: &'static str, address: usize, reason: impl Into<String>) -> Self {
        Self::OptimizationFailed {
            name,
            address,
            reason: reason.into(),
        }
    }
}

pub type VmResult<T> = std::result::Result<T, VmError>;
