//! Opcode resolution: deduce which numeric opcode is which operation from before/after samples.
//!
//! Each sample narrows its opcode's candidate set to the operations that reproduce it. As soon
//! as an opcode is down to one candidate, that operation is eliminated from every other opcode,
//! and the elimination cascades on a worklist until no new singletons appear.

use crate::config::NUM_OPCODES;
use crate::error::{VmError, VmResult};
use crate::evaluator::evaluate;
use crate::operation::{Operation, OperationSet};
use crate::types::{Instruction, Program, RawInstruction, Sample};
use std::collections::BTreeMap;

/// Operations that turn `sample.before` into exactly `sample.after` under the sample's operands.
/// Operations that fail with an out-of-bounds register are not candidates.
#[must_use]
pub fn candidates_for_sample(sample: &Sample) -> OperationSet {
    Operation::ALL
        .into_iter()
        .filter(|&operation| {
            evaluate(&sample.before, &sample.instruction.with_operation(operation))
                .map_or(false, |after| after == sample.after)
        })
        .collect()
}

/// Number of samples consistent with at least `threshold` operations.
#[must_use]
pub fn count_ambiguous_samples(samples: &[Sample], threshold: usize) -> usize {
    samples
        .iter()
        .filter(|sample| candidates_for_sample(sample).len() >= threshold)
        .count()
}

/// Remaining candidate operations per opcode. Sets only ever shrink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpcodeConstraintTable {
    candidates: BTreeMap<u32, OperationSet>,
}

impl OpcodeConstraintTable {
    /// Opcodes `0..NUM_OPCODES`, each with every operation as a candidate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            candidates: (0..NUM_OPCODES).map(|op| (op, OperationSet::ALL)).collect(),
        }
    }

    #[must_use]
    pub fn candidates(&self, opcode: u32) -> Option<OperationSet> {
        self.candidates.get(&opcode).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, OperationSet)> + '_ {
        self.candidates.iter().map(|(&opcode, &set)| (opcode, set))
    }

    /// Narrow the sample's opcode to the operations consistent with it, then propagate any
    /// singleton that results. Opcodes outside the seeded range join the table on first sight.
    pub fn apply_sample(&mut self, sample: &Sample) -> VmResult<()> {
        let opcode = sample.instruction.opcode;
        let consistent = candidates_for_sample(sample);
        let entry = self.candidates.entry(opcode).or_insert(OperationSet::ALL);
        let narrowed = entry.intersection(consistent);
        let shrank = narrowed != *entry;
        *entry = narrowed;
        if narrowed.is_empty() {
            return Err(VmError::NoCandidates { opcode });
        }
        if shrank && narrowed.len() == 1 {
            self.eliminate_from(vec![opcode])?;
        }
        Ok(())
    }

    /// Eliminate every singleton from all other opcodes until a fixed point is reached.
    pub fn propagate(&mut self) -> VmResult<()> {
        let singletons = self
            .candidates
            .iter()
            .filter(|(_, set)| set.len() == 1)
            .map(|(&opcode, _)| opcode)
            .collect();
        self.eliminate_from(singletons)
    }

    fn eliminate_from(&mut self, mut worklist: Vec<u32>) -> VmResult<()> {
        while let Some(found_opcode) = worklist.pop() {
            let Some(found) = self.candidates.get(&found_opcode).and_then(|set| set.single())
            else {
                continue;
            };
            for (&opcode, set) in self.candidates.iter_mut() {
                if opcode == found_opcode || !set.remove(found) {
                    continue;
                }
                match set.len() {
                    0 => return Err(VmError::NoCandidates { opcode }),
                    1 => {
                        crate::vm_log!("resolver: opcode {} narrowed to {:?}", opcode, set);
                        worklist.push(opcode);
                    }
                    _ => {}
                }
            }
            crate::vm_log!("resolver: opcode {} = {}", found_opcode, found);
        }
        Ok(())
    }

    /// Extract the bijection. Every opcode must have exactly one candidate left.
    pub fn into_mapping(self) -> VmResult<OpcodeMapping> {
        let mut mapping = BTreeMap::new();
        for (opcode, candidates) in self.candidates {
            match candidates.single() {
                Some(operation) => {
                    mapping.insert(opcode, operation);
                }
                None if candidates.is_empty() => return Err(VmError::NoCandidates { opcode }),
                None => {
                    return Err(VmError::AmbiguousMapping { opcode, candidates });
                }
            }
        }
        Ok(OpcodeMapping(mapping))
    }
}

impl Default for OpcodeConstraintTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolved opcode → operation bijection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpcodeMapping(BTreeMap<u32, Operation>);

impl OpcodeMapping {
    #[must_use]
    pub fn get(&self, opcode: u32) -> Option<Operation> {
        self.0.get(&opcode).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, Operation)> + '_ {
        self.0.iter().map(|(&opcode, &operation)| (opcode, operation))
    }

    pub fn translate_instruction(&self, raw: &RawInstruction) -> VmResult<Instruction> {
        self.get(raw.opcode)
            .map(|operation| raw.with_operation(operation))
            .ok_or(VmError::UnknownOpcode { opcode: raw.opcode })
    }

    /// Rewrite an unresolved program into executable instructions.
    pub fn translate(&self, program: &Program<RawInstruction>) -> VmResult<Program> {
        let instructions = program
            .instructions
            .iter()
            .map(|raw| self.translate_instruction(raw))
            .collect::<VmResult<Vec<_>>>()?;
        Ok(Program::new(program.ip_register, instructions))
    }
}

/// Resolve the opcode bijection from samples: one sweep with eager elimination, then a final
/// fixed-point pass.
pub fn resolve(samples: &[Sample]) -> VmResult<OpcodeMapping> {
    let mut table = OpcodeConstraintTable::new();
    for sample in samples {
        table.apply_sample(sample)?;
    }
    table.propagate()?;
    table.into_mapping()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RegisterFile;

    fn sample(before: [i64; 4], raw: (u32, i64, i64, i64), after: [i64; 4]) -> Sample {
        Sample {
            before: RegisterFile::from(before),
            instruction: RawInstruction::new(raw.0, raw.1, raw.2, raw.3),
            after: RegisterFile::from(after),
        }
    }

    /// Seven samples per operation under opcode `15 - index`; together they leave each
    /// opcode with a single candidate.
    fn synthetic_samples() -> Vec<Sample> {
        let cases: [([i64; 4], (i64, i64, i64)); 7] = [
            ([5, 3, 12, 0], (0, 1, 3)),
            ([5, 3, 12, 0], (2, 1, 3)),
            ([5, 3, 12, 0], (1, 2, 3)),
            ([5, 3, 12, 0], (3, 0, 2)),
            ([2, 2, 7, 1], (2, 1, 0)),
            ([2, 2, 7, 1], (3, 2, 0)),
            ([2, 2, 7, 1], (1, 0, 0)),
        ];
        Operation::ALL
            .iter()
            .flat_map(|&operation| {
                let opcode = 15 - operation.index() as u32;
                cases.into_iter().map(move |(before, (a, b, c))| {
                    let before = RegisterFile::from(before);
                    let after = evaluate(&before, &Instruction::new(operation, a, b, c)).unwrap();
                    Sample {
                        before,
                        instruction: RawInstruction::new(opcode, a, b, c),
                        after,
                    }
                })
            })
            .collect()
    }

    #[test]
    fn three_operation_sample_is_ambiguous() {
        let s = sample([3, 2, 1, 1], (9, 2, 1, 2), [3, 2, 2, 1]);
        let expected: OperationSet = [Operation::Mulr, Operation::Addi, Operation::Seti]
            .into_iter()
            .collect();
        assert_eq!(candidates_for_sample(&s), expected);
        assert_eq!(count_ambiguous_samples(&[s.clone()], 3), 1);
        assert_eq!(count_ambiguous_samples(&[s], 4), 0);
    }

    #[test]
    fn out_of_bounds_operations_are_not_candidates() {
        // b = 7 is only valid as an immediate.
        let s = sample([1, 0, 0, 0], (0, 0, 7, 1), [1, 8, 0, 0]);
        let expected: OperationSet = [Operation::Addi].into_iter().collect();
        assert_eq!(candidates_for_sample(&s), expected);
    }

    #[test]
    fn contradictory_samples_report_no_candidates() {
        let mut table = OpcodeConstraintTable::new();
        table
            .apply_sample(&sample([1, 0, 0, 0], (4, 0, 7, 1), [1, 8, 0, 0]))
            .unwrap();
        let err = table
            .apply_sample(&sample([1, 0, 0, 0], (4, 0, 7, 1), [1, 7, 0, 0]))
            .unwrap_err();
        assert_eq!(err, VmError::NoCandidates { opcode: 4 });
    }

    #[test]
    fn singleton_is_eliminated_from_other_opcodes_eagerly() {
        let mut table = OpcodeConstraintTable::new();
        table
            .apply_sample(&sample([1, 0, 0, 0], (4, 0, 7, 1), [1, 8, 0, 0]))
            .unwrap();
        assert_eq!(table.candidates(4).and_then(OperationSet::single), Some(Operation::Addi));
        for (opcode, set) in table.iter() {
            if opcode != 4 {
                assert!(!set.contains(Operation::Addi), "opcode {opcode} still has addi");
                assert_eq!(set.len(), 15);
            }
        }
    }

    #[test]
    fn insufficient_samples_are_ambiguous() {
        let err = resolve(&[sample([3, 2, 1, 1], (9, 2, 1, 2), [3, 2, 2, 1])]).unwrap_err();
        assert!(matches!(err, VmError::AmbiguousMapping { opcode: 0, .. }));
    }

    #[test]
    fn resolves_synthetic_bijection_in_any_order() {
        let mut samples = synthetic_samples();
        let mapping = resolve(&samples).unwrap();
        assert_eq!(mapping.len(), 16);
        for operation in Operation::ALL {
            assert_eq!(mapping.get(15 - operation.index() as u32), Some(operation));
        }
        samples.reverse();
        assert_eq!(resolve(&samples).unwrap(), mapping);
    }

    #[test]
    fn resolve_is_idempotent() {
        let samples = synthetic_samples();
        assert_eq!(resolve(&samples).unwrap(), resolve(&samples).unwrap());
    }

    #[test]
    fn candidate_sets_never_grow() {
        let mut table = OpcodeConstraintTable::new();
        for s in synthetic_samples() {
            let before = table.clone();
            table.apply_sample(&s).unwrap();
            for (opcode, set) in table.iter() {
                assert!(set.is_subset(before.candidates(opcode).unwrap()));
            }
        }
    }

    #[test]
    fn resolved_mapping_reproduces_every_sample() {
        let samples = synthetic_samples();
        let mapping = resolve(&samples).unwrap();
        for s in &samples {
            let instruction = mapping.translate_instruction(&s.instruction).unwrap();
            assert_eq!(evaluate(&s.before, &instruction).unwrap(), s.after);
        }
    }

    #[test]
    fn mapping_iterates_every_opcode_in_order() {
        let mapping = resolve(&synthetic_samples()).unwrap();
        let opcodes: Vec<u32> = mapping.iter().map(|(opcode, _)| opcode).collect();
        assert_eq!(opcodes, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn out_of_range_opcode_cannot_resolve() {
        let mut samples = synthetic_samples();
        samples.push(sample([1, 0, 0, 0], (20, 0, 7, 1), [1, 8, 0, 0]));
        assert!(matches!(
            resolve(&samples),
            Err(VmError::NoCandidates { .. })
        ));
    }

    #[test]
    fn translate_rejects_unmapped_opcode() {
        let mapping = resolve(&synthetic_samples()).unwrap();
        let program = Program::new(None, vec![RawInstruction::new(16, 0, 0, 0)]);
        assert_eq!(
            mapping.translate(&program),
            Err(VmError::UnknownOpcode { opcode: 16 })
        );
    }
}
