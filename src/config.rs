//! VM configuration constants: instruction-set size, register file shapes, text format markers.

// ============================================================================
// Instruction Set
// ============================================================================
pub const NUM_OPERATIONS: usize = 16;
/// Opcodes the resolver seeds its constraint table with (0..NUM_OPCODES).
pub const NUM_OPCODES: u32 = 16;

/// Mnemonic table, indexed by `Operation as usize`. Order matches the `Operation` declaration.
pub const OPERATION_MNEMONICS: [&str; NUM_OPERATIONS] = [
    "addr", "addi", "mulr", "muli", "banr", "bani", "borr", "bori", "setr", "seti", "gtir",
    "gtri", "gtrr", "eqir", "eqri", "eqrr",
];

// ============================================================================
// Register Files
// ============================================================================
/// Register count of sample snapshots and of sample-document programs.
pub const SAMPLE_REGISTER_COUNT: usize = 4;
/// Register count of `#ip`-bound programs.
pub const PROGRAM_REGISTER_COUNT: usize = 6;

// ============================================================================
// Resolver
// ============================================================================
/// Samples consistent with at least this many operations count as ambiguous.
pub const DEFAULT_AMBIGUITY_THRESHOLD: usize = 3;

// ============================================================================
// Runner
// ============================================================================
/// Step budget for replaying one optimized loop without its shortcut.
pub const VERIFY_STEP_LIMIT: u64 = 10_000_000;

// ============================================================================
// Text Format
// ============================================================================
pub const IP_DIRECTIVE: &str = "#ip";
pub const SAMPLE_BEFORE_PREFIX: &str = "Before:";
pub const SAMPLE_AFTER_PREFIX: &str = "After:";
