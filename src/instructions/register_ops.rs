//! Assignment instructions: SETR (r[c] = r[a]) and SETI (r[c] = a). `b` is ignored by both.

use crate::instructions::base::binary_instruction;
use crate::operation::Operation;

fn first(x: i64, _: i64) -> i64 {
    x
}

binary_instruction!(SetRegisterInstruction, Operation::Setr, first);
binary_instruction!(SetImmediateInstruction, Operation::Seti, first);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VmError;
    use crate::instructions::base::{InstructionContext, InstructionHandler};
    use crate::types::RegisterFile;

    #[test]
    fn seti_ignores_b_even_when_out_of_range() {
        let mut registers = RegisterFile::zeroed(4);
        let mut context = InstructionContext {
            registers: &mut registers,
            a: 42,
            b: 1000,
            c: 3,
        };
        SetImmediateInstruction.execute(&mut context).unwrap();
        assert_eq!(registers.as_slice(), &[0, 0, 0, 42]);
    }

    #[test]
    fn setr_requires_a_register() {
        let mut registers = RegisterFile::from([7, 0, 0, 0]);
        let mut context = InstructionContext {
            registers: &mut registers,
            a: 0,
            b: -5,
            c: 2,
        };
        SetRegisterInstruction.execute(&mut context).unwrap();
        context.a = 8;
        assert_eq!(
            SetRegisterInstruction.execute(&mut context),
            Err(VmError::RegisterOutOfBounds { index: 8, len: 4 })
        );
        assert_eq!(registers.as_slice(), &[7, 0, 7, 0]);
    }
}
