//! Error types for `kbtree`.

use alloc::string::String;

use thiserror::Error;

use crate::config::MIN_BRANCHING_FACTOR;

/// Result type alias using [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors surfaced by tree construction, mutation and (de)serialization.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    /// The requested branching factor cannot form a valid B-tree.
    #[error("branching factor must be at least {min}, got {0}", min = MIN_BRANCHING_FACTOR)]
    InvalidBranchingFactor(usize),

    /// A node could not be allocated, either because the allocator refused or because the
    /// configured node limit was reached. The tree is left unchanged.
    #[error("out of memory: unable to allocate tree node")]
    OutOfMemory,

    /// The text form of a tree could not be parsed.
    #[error("deserialization error: {0}")]
    Serialization(#[from] ParseError),

    /// A structural invariant does not hold. Only produced by validation.
    #[error("tree invariant violations:\n{0}")]
    InvariantViolation(String),
}

/// A text-format error with the byte offset where it was detected.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{kind} (at byte {offset})")]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Byte offset into the input.
    pub offset: usize,
}

/// Reasons the text parser rejects its input.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("invalid parentheses: unmatched ')'")]
    UnmatchedClose,
    #[error("invalid parentheses: unclosed '('")]
    UnclosedGroup,
    #[error("invalid token sequence: \")(\"")]
    AdjacentGroups,
    #[error("invalid node: keys and child groups must alternate")]
    MissingChild,
    #[error("invalid node: internal node without keys")]
    EmptyInternal,
    #[error("invalid node: empty group below the root")]
    EmptyGroup,
    #[error("invalid number syntax: lone '-'")]
    LoneMinus,
    #[error("invalid number syntax: '-' after a digit")]
    MinusAfterDigit,
    #[error("invalid number syntax: out of range")]
    NumberOutOfRange,
    #[error("invalid character encountered: {0:?}")]
    InvalidCharacter(char),
    #[error("oversized node")]
    OversizedNode,
    #[error("out of order keys")]
    KeyOrder,
}

impl ParseErrorKind {
    pub(crate) const fn at(self, offset: usize) -> ParseError {
        ParseError {
            kind: self,
            offset,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages_carry_reason_and_offset() {
        let err: Error = ParseErrorKind::AdjacentGroups.at(4).into();
        assert_eq!(err.to_string(), "deserialization error: invalid token sequence: \")(\" (at byte 4)");
        assert_eq!(Error::InvalidBranchingFactor(2).to_string(), "branching factor must be at least 3, got 2");
    }
}
