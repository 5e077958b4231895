//! Program and sample text parser.
//!
//! Program text is one instruction per line (`<mnemonic> a b c` or `<opcode> a b c`),
//! optionally preceded by an `#ip <register>` directive. Sample text is a sequence of
//! `Before:` / instruction / `After:` triples; a sample document follows the samples with
//! an unresolved program.

use crate::config::{IP_DIRECTIVE, SAMPLE_AFTER_PREFIX, SAMPLE_BEFORE_PREFIX};
use crate::error::{VmError, VmResult};
use crate::operation::Operation;
use crate::types::{Instruction, Program, RawInstruction, RegisterFile, Sample};

/// Samples plus the unresolved program that follows them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleDocument {
    pub samples: Vec<Sample>,
    pub program: Program<RawInstruction>,
}

/// 1-based line number and trimmed content.
type Line<'a> = (usize, &'a str);

fn numbered_lines(source: &str) -> Vec<Line<'_>> {
    source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .collect()
}

fn parse_operand(token: &str, line: usize) -> VmResult<i64> {
    token
        .parse::<i64>()
        .map_err(|_| VmError::parse(line, format!("invalid operand '{token}'")))
}

/// Split an instruction line into its head token and three integer operands.
fn split_instruction(text: &str, line: usize) -> VmResult<(&str, i64, i64, i64)> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [head, a, b, c] = tokens.as_slice() else {
        return Err(VmError::parse(
            line,
            format!("expected 4 fields, found {}", tokens.len()),
        ));
    };
    Ok((
        *head,
        parse_operand(a, line)?,
        parse_operand(b, line)?,
        parse_operand(c, line)?,
    ))
}

/// Parse `[r0, r1, ...]` after the given prefix.
fn parse_register_list(text: &str, prefix: &str, line: usize) -> VmResult<RegisterFile> {
    let body = text
        .strip_prefix(prefix)
        .ok_or_else(|| VmError::parse(line, format!("expected '{prefix}'")))?
        .trim();
    let inner = body
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| VmError::parse(line, "expected a bracketed register list"))?;
    let values = inner
        .split(',')
        .map(|value| parse_operand(value.trim(), line))
        .collect::<VmResult<Vec<i64>>>()?;
    Ok(RegisterFile::from(values))
}

/// Instruction text parser.
pub struct ProgramParser;

impl ProgramParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parse `<mnemonic> a b c`.
    pub fn parse_instruction(&self, text: &str, line: usize) -> VmResult<Instruction> {
        let (head, a, b, c) = split_instruction(text, line)?;
        let operation = Operation::from_mnemonic(head)
            .ok_or_else(|| VmError::parse(line, format!("unknown operation '{head}'")))?;
        Ok(Instruction::new(operation, a, b, c))
    }

    /// Parse `<opcode> a b c` with a numeric opcode.
    pub fn parse_raw_instruction(&self, text: &str, line: usize) -> VmResult<RawInstruction> {
        let (head, a, b, c) = split_instruction(text, line)?;
        let opcode = head
            .parse::<u32>()
            .map_err(|_| VmError::parse(line, format!("invalid opcode '{head}'")))?;
        Ok(RawInstruction::new(opcode, a, b, c))
    }

    /// Parse a program with symbolic opcodes.
    pub fn parse_program(&self, source: &str) -> VmResult<Program> {
        self.parse_lines(&numbered_lines(source), |text, line| {
            self.parse_instruction(text, line)
        })
    }

    /// Parse a program with numeric (unresolved) opcodes.
    pub fn parse_unresolved_program(&self, source: &str) -> VmResult<Program<RawInstruction>> {
        self.parse_lines(&numbered_lines(source), |text, line| {
            self.parse_raw_instruction(text, line)
        })
    }

    /// Parse the sample section at the start of `source`; anything after it is ignored.
    pub fn parse_samples(&self, source: &str) -> VmResult<Vec<Sample>> {
        let lines = numbered_lines(source);
        let (samples, _) = self.parse_sample_lines(&lines)?;
        Ok(samples)
    }

    /// Parse samples followed by the unresolved program they describe.
    pub fn parse_sample_document(&self, source: &str) -> VmResult<SampleDocument> {
        let lines = numbered_lines(source);
        let (samples, consumed) = self.parse_sample_lines(&lines)?;
        let program = self.parse_lines(&lines[consumed..], |text, line| {
            self.parse_raw_instruction(text, line)
        })?;
        Ok(SampleDocument { samples, program })
    }

    fn parse_lines<I>(
        &self,
        lines: &[Line<'_>],
        decode: impl Fn(&str, usize) -> VmResult<I>,
    ) -> VmResult<Program<I>> {
        let mut ip_register = None;
        let mut instructions = Vec::new();
        for &(line, text) in lines {
            if text.is_empty() {
                continue;
            }
            if let Some(rest) = text.strip_prefix(IP_DIRECTIVE) {
                if ip_register.is_some() || !instructions.is_empty() {
                    return Err(VmError::parse(
                        line,
                        format!("{IP_DIRECTIVE} must appear once, before the first instruction"),
                    ));
                }
                let index = rest.trim().parse::<usize>().map_err(|_| {
                    VmError::parse(line, format!("invalid {IP_DIRECTIVE} register '{}'", rest.trim()))
                })?;
                ip_register = Some(index);
                continue;
            }
            instructions.push(decode(text, line)?);
        }
        Ok(Program::new(ip_register, instructions))
    }

    /// Returns the samples and the number of lines consumed (up to the first non-sample line).
    fn parse_sample_lines(&self, lines: &[Line<'_>]) -> VmResult<(Vec<Sample>, usize)> {
        let mut samples = Vec::new();
        let mut i = 0;
        loop {
            while i < lines.len() && lines[i].1.is_empty() {
                i += 1;
            }
            if i >= lines.len() || !lines[i].1.starts_with(SAMPLE_BEFORE_PREFIX) {
                return Ok((samples, i));
            }
            let (before_line, before_text) = lines[i];
            let Some(&[(op_line, op_text), (after_line, after_text)]) = lines.get(i + 1..i + 3)
            else {
                return Err(VmError::parse(before_line, "truncated sample"));
            };
            let before = parse_register_list(before_text, SAMPLE_BEFORE_PREFIX, before_line)?;
            let instruction = self.parse_raw_instruction(op_text, op_line)?;
            let after = parse_register_list(after_text, SAMPLE_AFTER_PREFIX, after_line)?;
            if before.len() != after.len() {
                return Err(VmError::parse(
                    after_line,
                    format!(
                        "sample has {} registers before but {} after",
                        before.len(),
                        after.len()
                    ),
                ));
            }
            samples.push(Sample {
                before,
                instruction,
                after,
            });
            i += 3;
        }
    }
}

impl Default for ProgramParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ip_directive_and_mnemonics() {
        let program = ProgramParser::new()
            .parse_program("#ip 0\nseti 5 0 1\nseti 6 0 2\naddi 0 1 0\n")
            .unwrap();
        assert_eq!(program.ip_register, Some(0));
        assert_eq!(program.len(), 3);
        assert_eq!(program.instructions[2], Instruction::new(Operation::Addi, 0, 1, 0));
    }

    #[test]
    fn program_without_directive_has_no_binding() {
        let program = ProgramParser::new().parse_program("\nmulr 1 2 3\n\n").unwrap();
        assert_eq!(program.ip_register, None);
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn late_directive_is_rejected() {
        let err = ProgramParser::new()
            .parse_program("seti 5 0 1\n#ip 0\n")
            .unwrap_err();
        assert!(matches!(err, VmError::Parse { line: 2, .. }));
    }

    #[test]
    fn unknown_mnemonic_reports_line() {
        let err = ProgramParser::new()
            .parse_program("#ip 1\nseti 1 2 3\nsubr 1 2 3\n")
            .unwrap_err();
        assert_eq!(
            err,
            VmError::Parse {
                line: 3,
                message: "unknown operation 'subr'".to_string()
            }
        );
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        assert!(ProgramParser::new().parse_program("addr 1 2").is_err());
        assert!(ProgramParser::new().parse_unresolved_program("9 1 x 2").is_err());
    }

    #[test]
    fn parses_samples_with_aligned_after_prefix() {
        let source = "Before: [3, 2, 1, 1]\n9 2 1 2\nAfter:  [3, 2, 2, 1]\n\nBefore: [0, 0, 0, 0]\n1 0 0 0\nAfter:  [0, 0, 0, 0]\n";
        let samples = ProgramParser::new().parse_samples(source).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].before.as_slice(), &[3, 2, 1, 1]);
        assert_eq!(samples[0].instruction, RawInstruction::new(9, 2, 1, 2));
        assert_eq!(samples[0].after.as_slice(), &[3, 2, 2, 1]);
    }

    #[test]
    fn sample_document_splits_samples_from_program() {
        let source = "Before: [3, 2, 1, 1]\n9 2 1 2\nAfter:  [3, 2, 2, 1]\n\n\n\n7 3 2 0\n7 2 1 1\n";
        let document = ProgramParser::new().parse_sample_document(source).unwrap();
        assert_eq!(document.samples.len(), 1);
        assert_eq!(document.program.ip_register, None);
        assert_eq!(
            document.program.instructions,
            vec![RawInstruction::new(7, 3, 2, 0), RawInstruction::new(7, 2, 1, 1)]
        );
    }

    #[test]
    fn truncated_sample_is_rejected() {
        let err = ProgramParser::new()
            .parse_samples("Before: [3, 2, 1, 1]\n9 2 1 2\n")
            .unwrap_err();
        assert!(matches!(err, VmError::Parse { line: 1, .. }));
    }

    #[test]
    fn mismatched_sample_widths_are_rejected() {
        let err = ProgramParser::new()
            .parse_samples("Before: [3, 2, 1, 1]\n9 2 1 2\nAfter: [3, 2, 2]\n")
            .unwrap_err();
        assert!(matches!(err, VmError::Parse { line: 3, .. }));
    }
}
