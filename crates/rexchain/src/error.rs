use std::fmt;

use thiserror::Error;

/// Character range inside the full pattern source (delimiters and flags included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceRange {
    pub start_offset: usize,
    pub length: usize,
}

impl SourceRange {
    pub const EMPTY: SourceRange = SourceRange {
        start_offset: 0,
        length: 0,
    };

    pub fn new(start_offset: usize, length: usize) -> Self {
        SourceRange {
            start_offset,
            length,
        }
    }

    pub fn at(offset: usize) -> Self {
        SourceRange::new(offset, 1)
    }

    pub fn end_offset(&self) -> usize {
        self.start_offset + self.length
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.length <= 1 {
            write!(f, "offset {}", self.start_offset)
        } else {
            write!(f, "offsets {}..{}", self.start_offset, self.end_offset())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionErrorKind {
    UnterminatedGroup,
    UnterminatedClass,
    UnmatchedParen,
    DanglingOperator,
    MalformedQuantifier,
    InvalidQuantifierBounds,
    InvalidBackreference,
    InvalidEscape,
    InvalidRange,
    InvalidFlag,
    InvalidGroup,
    DuplicateGroupName,
    NestingTooDeep,
}

/// The only error the engine produces. Raised by compilation, never by matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid expression at {range}: {message}")]
pub struct InvalidExpression {
    pub kind: ExpressionErrorKind,
    pub message: String,
    pub range: SourceRange,
}

impl InvalidExpression {
    pub fn new(kind: ExpressionErrorKind, message: impl Into<String>, range: SourceRange) -> Self {
        InvalidExpression {
            kind,
            message: message.into(),
            range,
        }
    }
}

pub type RegexResult<T> = Result<T, InvalidExpression>;
