//! Register-machine opcode VM: instruction evaluator, `#ip`-bound program runner, opcode
//! resolver and loop shortcuts. Node bindings are built with `--features napi`.

/// Run-level logging (resolver eliminations, shortcuts, run start/end). Prints when
/// `vm_logging` or `trace_logging` is enabled.
#[macro_export]
macro_rules! vm_log {
    ($($t:tt)*) => {
        #[cfg(any(feature = "vm_logging", feature = "trace_logging"))]
        eprintln!($($t)*);
    };
}

/// Per-instruction trace. Prints only when `trace_logging` is enabled.
#[macro_export]
macro_rules! vm_trace {
    ($($t:tt)*) => {
        #[cfg(feature = "trace_logging")]
        eprintln!($($t)*);
    };
}

pub mod config;
pub mod error;
pub mod evaluator;
pub mod instructions;
pub mod operation;
pub mod optimizer;
pub mod parser;
pub mod resolver;
pub mod runner;
pub mod types;
pub mod watch;

#[cfg(feature = "napi")]
mod bindings;

pub use error::{VmError, VmResult};
pub use evaluator::{disassemble, evaluate};
pub use operation::{OperandMode, Operation, OperationSet};
pub use optimizer::{detect_idioms, DivisorCountLoop, DivisorSumLoop, LoopOptimizer};
pub use parser::{ProgramParser, SampleDocument};
pub use resolver::{
    candidates_for_sample, count_ambiguous_samples, resolve, OpcodeConstraintTable,
    OpcodeMapping,
};
pub use runner::{run, RunConfig, RunReport, Runner};
pub use types::{ExecutionState, Instruction, Program, RawInstruction, RegisterFile, Sample};
pub use watch::{find_halting_values, HaltingValues};
