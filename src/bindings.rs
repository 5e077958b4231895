//! NAPI exports. Every entry point takes program or sample text and returns plain values.

use napi::bindgen_prelude::*;
use napi_derive::napi;

use crate::config::{PROGRAM_REGISTER_COUNT, SAMPLE_REGISTER_COUNT};
use crate::error::VmError;
use crate::parser::ProgramParser;
use crate::resolver::{self, resolve};
use crate::runner::Runner;
use crate::types::{ExecutionState, RegisterFile};
use crate::watch;

fn to_napi(err: VmError) -> Error {
    Error::from_reason(err.to_string())
}

/// Run `#ip` program text from the given registers; returns the final registers.
#[napi]
pub fn run_program(source: String, registers: Vec<i64>, optimize: bool) -> Result<Vec<i64>> {
    let program = ProgramParser::new().parse_program(&source).map_err(to_napi)?;
    let mut runner = Runner::new(&program);
    if optimize {
        runner = runner.with_detected_optimizers();
    }
    let report = runner
        .run(ExecutionState::new(0, RegisterFile::from(registers)))
        .map_err(to_napi)?;
    Ok(report.state.registers.into_vec())
}

/// One resolved opcode and the mnemonic of its operation.
#[napi(object)]
pub struct ResolvedOpcode {
    pub opcode: u32,
    pub mnemonic: String,
}

/// Resolve the opcode mapping from sample text, in ascending opcode order.
#[napi]
pub fn resolve_opcodes(source: String) -> Result<Vec<ResolvedOpcode>> {
    let samples = ProgramParser::new().parse_samples(&source).map_err(to_napi)?;
    let mapping = resolve(&samples).map_err(to_napi)?;
    Ok(mapping
        .iter()
        .map(|(opcode, operation)| ResolvedOpcode {
            opcode,
            mnemonic: operation.mnemonic().to_string(),
        })
        .collect())
}

#[napi]
pub fn count_ambiguous_samples(source: String, threshold: u32) -> Result<u32> {
    let samples = ProgramParser::new().parse_samples(&source).map_err(to_napi)?;
    Ok(resolver::count_ambiguous_samples(&samples, threshold as usize) as u32)
}

/// Resolve a sample document and run its trailing program on zeroed registers.
#[napi]
pub fn run_sampled_program(source: String, register_count: Option<u32>) -> Result<Vec<i64>> {
    let document = ProgramParser::new()
        .parse_sample_document(&source)
        .map_err(to_napi)?;
    let mapping = resolve(&document.samples).map_err(to_napi)?;
    let program = mapping.translate(&document.program).map_err(to_napi)?;
    let len = register_count.map_or(SAMPLE_REGISTER_COUNT, |n| n as usize);
    let report = Runner::new(&program)
        .run(ExecutionState::zeroed(len))
        .map_err(to_napi)?;
    Ok(report.state.registers.into_vec())
}

/// HaltingValues returned as object (first, last, distinct).
#[napi(object)]
pub struct HaltingValuesOutput {
    pub first: i64,
    pub last: i64,
    pub distinct: u32,
}

#[napi]
pub fn find_halting_values(
    source: String,
    address: u32,
    register: u32,
) -> Result<HaltingValuesOutput> {
    let program = ProgramParser::new().parse_program(&source).map_err(to_napi)?;
    let runner = Runner::new(&program).with_detected_optimizers();
    let values = watch::find_halting_values(
        &runner,
        ExecutionState::zeroed(PROGRAM_REGISTER_COUNT),
        address as usize,
        register as usize,
    )
    .map_err(to_napi)?;
    Ok(HaltingValuesOutput {
        first: values.first,
        last: values.last,
        distinct: values.distinct as u32,
    })
}
