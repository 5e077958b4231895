//! Symbolic operations and compact operation sets.

use crate::config::{NUM_OPERATIONS, OPERATION_MNEMONICS};
use std::fmt;
use std::str::FromStr;

/// How an instruction operand is interpreted by a given operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandMode {
    /// Operand is a register index; the register's value is used.
    Register,
    /// Operand is used as a literal value.
    Immediate,
    /// Operand is ignored.
    Unused,
}

/// The sixteen operations of the instruction set. Discriminants index `OPERATION_MNEMONICS`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Addr = 0,
    Addi = 1,
    Mulr = 2,
    Muli = 3,
    Banr = 4,
    Bani = 5,
    Borr = 6,
    Bori = 7,
    Setr = 8,
    Seti = 9,
    Gtir = 10,
    Gtri = 11,
    Gtrr = 12,
    Eqir = 13,
    Eqri = 14,
    Eqrr = 15,
}

impl Operation {
    pub const ALL: [Operation; NUM_OPERATIONS] = [
        Operation::Addr,
        Operation::Addi,
        Operation::Mulr,
        Operation::Muli,
        Operation::Banr,
        Operation::Bani,
        Operation::Borr,
        Operation::Bori,
        Operation::Setr,
        Operation::Seti,
        Operation::Gtir,
        Operation::Gtri,
        Operation::Gtrr,
        Operation::Eqir,
        Operation::Eqri,
        Operation::Eqrr,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        OPERATION_MNEMONICS[self as usize]
    }

    #[must_use]
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        OPERATION_MNEMONICS
            .iter()
            .position(|&m| m == mnemonic)
            .map(|i| Self::ALL[i])
    }

    /// Operand modes of `a` and `b`. `c` is always the destination register.
    #[must_use]
    pub const fn operand_modes(self) -> (OperandMode, OperandMode) {
        use OperandMode::{Immediate, Register, Unused};
        match self {
            Operation::Addr
            | Operation::Mulr
            | Operation::Banr
            | Operation::Borr
            | Operation::Gtrr
            | Operation::Eqrr => (Register, Register),
            Operation::Addi
            | Operation::Muli
            | Operation::Bani
            | Operation::Bori
            | Operation::Gtri
            | Operation::Eqri => (Register, Immediate),
            Operation::Gtir | Operation::Eqir => (Immediate, Register),
            Operation::Setr => (Register, Unused),
            Operation::Seti => (Immediate, Unused),
        }
    }

    /// True for the comparison family, whose result is always 0 or 1.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Operation::Gtir
                | Operation::Gtri
                | Operation::Gtrr
                | Operation::Eqir
                | Operation::Eqri
                | Operation::Eqrr
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_mnemonic(s).ok_or_else(|| format!("unknown operation mnemonic '{s}'"))
    }
}

// ============================================================================
// Operation sets
// ============================================================================

/// Set of operations as a 16-bit mask (bit `i` = `Operation::ALL[i]`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OperationSet(u16);

impl OperationSet {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(u16::MAX);

    #[must_use]
    pub const fn contains(self, operation: Operation) -> bool {
        self.0 & (1 << operation as u16) != 0
    }

    pub fn insert(&mut self, operation: Operation) {
        self.0 |= 1 << operation as u16;
    }

    /// Remove `operation`; returns whether it was present.
    pub fn remove(&mut self, operation: Operation) -> bool {
        let present = self.contains(operation);
        self.0 &= !(1 << operation as u16);
        present
    }

    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[must_use]
    pub const fn is_subset(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The only member, if the set holds exactly one operation.
    #[must_use]
    pub fn single(self) -> Option<Operation> {
        if self.len() == 1 {
            Some(Operation::ALL[self.0.trailing_zeros() as usize])
        } else {
            None
        }
    }

    pub fn iter(self) -> impl Iterator<Item = Operation> {
        Operation::ALL
            .into_iter()
            .filter(move |&operation| self.contains(operation))
    }
}

impl FromIterator<Operation> for OperationSet {
    fn from_iter<T: IntoIterator<Item = Operation>>(iter: T) -> Self {
        let mut set = Self::EMPTY;
        for operation in iter {
            set.insert(operation);
        }
        set
    }
}

impl fmt::Debug for OperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(Operation::mnemonic)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonic_table_round_trips_every_operation() {
        for operation in Operation::ALL {
            assert_eq!(Operation::from_mnemonic(operation.mnemonic()), Some(operation));
            assert_eq!(operation.mnemonic().parse::<Operation>(), Ok(operation));
        }
        assert_eq!(Operation::from_mnemonic("subr"), None);
        assert!("ADDR".parse::<Operation>().is_err());
    }

    #[test]
    fn all_set_has_sixteen_members() {
        assert_eq!(OperationSet::ALL.len(), 16);
        assert_eq!(OperationSet::ALL.iter().count(), 16);
        assert!(OperationSet::EMPTY.is_empty());
    }

    #[test]
    fn set_remove_and_single() {
        let mut set: OperationSet = [Operation::Mulr, Operation::Addi].into_iter().collect();
        assert_eq!(set.single(), None);
        assert!(set.remove(Operation::Mulr));
        assert!(!set.remove(Operation::Mulr));
        assert_eq!(set.single(), Some(Operation::Addi));
        assert!(set.is_subset(OperationSet::ALL));
        assert!(!OperationSet::ALL.is_subset(set));
    }

    #[test]
    fn debug_lists_mnemonics_in_declaration_order() {
        let set: OperationSet = [Operation::Seti, Operation::Mulr, Operation::Addi]
            .into_iter()
            .collect();
        assert_eq!(format!("{set:?}"), r#"{"addi", "mulr", "seti"}"#);
    }
}
