// rexchain
// A backtracking regular-expression engine over a chain-of-nodes graph:
// parser -> optimizer -> recursive matcher with pluggable cursors and
// character classifiers.

#[cfg(test)]
mod test;

pub mod class;
pub mod cursor;
pub mod dump;
pub mod engine;
pub mod error;
pub mod flags;
pub mod limits;
pub mod node;
pub mod optimize;
pub mod parser;
pub mod regex;

#[cfg(feature = "serde")]
pub mod serde;

pub use class::{ClassItem, ClassSet, Classifier, DefaultClassifier, PredefinedClass};
pub use cursor::{CharCursor, Cursor};
pub use error::{ExpressionErrorKind, InvalidExpression, RegexResult, SourceRange};
pub use flags::Flags;
pub use node::{Anchor, Graph, Node, NodeId, NodeKind, Quantifier};
pub use regex::{Captures, Match, Regex, RegexBuilder, Span};

/// Compile `source`, either a bare pattern or `/pattern/flags`.
pub fn compile(source: &str) -> RegexResult<Regex> {
    Regex::new(source)
}
