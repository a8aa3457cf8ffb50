//! Compile-time structural limits.
//!
//! Matching itself has no step budget; these only bound what the compiler
//! accepts so that parsing and graph walks cannot overflow the stack.

/// Maximum number of nested groups, alternations and negations.
/// The parser, the optimizer and the matcher all recurse per level.
pub const MAX_NESTING_DEPTH: usize = 200;

/// Largest bound accepted inside a `{m,n}` quantifier.
pub const MAX_REPEAT: usize = 100_000;

/// Largest decimal backreference index accepted by `\N`.
pub const MAX_CAPTURES: usize = 10_000;
