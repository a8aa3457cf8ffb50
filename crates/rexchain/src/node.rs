// Node graph of a compiled pattern
//
// Nodes live in one arena owned by the graph and refer to each other by
// `NodeId`. Every link (`next`, group head, alternation branch, negation
// operand) is owned by exactly one parent, so the graph is a tree of chains.

use std::fmt;

use ahash::AHashMap;
use smol_str::SmolStr;

use crate::class::{ClassSet, PredefinedClass};
use crate::flags::Flags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline(always)]
    pub fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Repetition bound `{min, max}`; `max == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quantifier {
    pub min: usize,
    pub max: Option<usize>,
}

impl Quantifier {
    pub const ONE: Quantifier = Quantifier::new(1, Some(1));
    pub const OPTIONAL: Quantifier = Quantifier::new(0, Some(1));
    pub const STAR: Quantifier = Quantifier::new(0, None);
    pub const PLUS: Quantifier = Quantifier::new(1, None);

    pub const fn new(min: usize, max: Option<usize>) -> Self {
        Quantifier { min, max }
    }

    #[inline(always)]
    pub fn is_one(&self) -> bool {
        *self == Quantifier::ONE
    }

    #[inline(always)]
    pub fn is_fixed(&self) -> bool {
        self.max == Some(self.min)
    }

    /// Whether another repetition may be attempted after `count` of them.
    #[inline(always)]
    pub fn allows_more(&self, count: usize) -> bool {
        self.max.is_none_or(|max| count < max)
    }

    /// Additive fold used when a non-capturing group is replaced by its only
    /// element. Exact only when one side is `{1,1}`.
    pub fn fold_group(self, group: Quantifier) -> Quantifier {
        let min = (self.min + group.min).saturating_sub(1);
        let max = match (group.max, self.max) {
            (None, _) => None,
            (Some(gmax), Some(max)) if gmax > 1 => Some(max + gmax - 1),
            (Some(_), max) => max,
        };
        Quantifier::new(min, max)
    }
}

impl Default for Quantifier {
    fn default() -> Self {
        Quantifier::ONE
    }
}

/// Zero-width position assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    InputStart,      // \A
    InputEnd,        // \z
    LineStart,       // ^ (input start unless multiline)
    LineEnd,         // $ (input end unless multiline)
    WordStart,       // \<
    WordEnd,         // \>
    WordBoundary,    // \b
    NotWordBoundary, // \B
}

impl Anchor {
    pub fn syntax(&self) -> &'static str {
        match self {
            Anchor::InputStart => "\\A",
            Anchor::InputEnd => "\\z",
            Anchor::LineStart => "^",
            Anchor::LineEnd => "$",
            Anchor::WordStart => "\\<",
            Anchor::WordEnd => "\\>",
            Anchor::WordBoundary => "\\b",
            Anchor::NotWordBoundary => "\\B",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Fixed text, one or more characters
    Literal(Box<[char]>),
    /// Bracketed set
    Set(ClassSet),
    /// Predefined class (`\d`, `.`, ...) or its inversion (`\D`, ...)
    Class { class: PredefinedClass, negated: bool },
    Anchor(Anchor),
    /// `( )`, `(?: )`, `(?<name> )`; `head == None` is an empty group
    Group { head: Option<NodeId>, capturing: bool },
    /// Ordered alternatives; `None` is an empty branch
    Alternation(Vec<Option<NodeId>>),
    /// `~X`: zero-width, succeeds iff the operand chain fails
    Not(NodeId),
    /// `\N` / `\k<name>`, by group index (1-based)
    Backref(usize),
}

impl NodeKind {
    /// Kinds that never consume input themselves.
    pub fn is_zero_width(&self) -> bool {
        matches!(self, NodeKind::Anchor(_) | NodeKind::Not(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Group { .. } | NodeKind::Alternation(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub quant: Quantifier,
    /// Capture slot (1-based group index) committed by each iteration.
    pub capture: Option<usize>,
    /// Pinned to the absolute start of input.
    pub anchored: bool,
    pub next: Option<NodeId>,
    /// Minimum characters this node and its continuations need; filled by
    /// the optimizer.
    pub min_len: usize,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            quant: Quantifier::ONE,
            capture: None,
            anchored: false,
            next: None,
            min_len: 0,
        }
    }

    /// Characters consumed by one repetition, when that is known statically.
    pub fn fixed_width(&self) -> Option<usize> {
        match &self.kind {
            NodeKind::Literal(text) => Some(text.len()),
            NodeKind::Set(_) | NodeKind::Class { .. } => Some(1),
            NodeKind::Anchor(_) | NodeKind::Not(_) => Some(0),
            NodeKind::Group { .. } | NodeKind::Alternation(_) | NodeKind::Backref(_) => None,
        }
    }
}

/// Compiled, immutable pattern.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: Option<NodeId>,
    pub(crate) flags: Flags,
    pub(crate) capture_count: usize,
    pub(crate) names: AHashMap<SmolStr, usize>,
    /// Text the input must end with, set by the fail-fast pass.
    pub(crate) required_suffix: Option<Box<[char]>>,
    pub(crate) source: String,
    pub(crate) pattern_range: (usize, usize),
    pub(crate) flags_range: (usize, usize),
}

impl Graph {
    #[inline(always)]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn capture_count(&self) -> usize {
        self.capture_count
    }

    pub fn required_suffix(&self) -> Option<&[char]> {
        self.required_suffix.as_deref()
    }

    /// Whether every match must start at the absolute start of input.
    pub fn is_anchored(&self) -> bool {
        self.root.is_some_and(|id| {
            let node = self.node(id);
            node.anchored && node.quant.min > 0
        })
    }

    /// Minimum characters any match needs.
    pub fn min_len(&self) -> usize {
        self.root.map_or(0, |id| self.node(id).min_len)
    }

    /// Iterate a chain from `head` along `next` links.
    pub fn chain(&self, head: Option<NodeId>) -> ChainIter<'_> {
        ChainIter {
            nodes: &self.nodes,
            current: head,
        }
    }

    /// Number of nodes reachable from the root.
    pub fn reachable_len(&self) -> usize {
        fn count(graph: &Graph, head: Option<NodeId>) -> usize {
            graph
                .chain(head)
                .map(|id| {
                    1 + match &graph.node(id).kind {
                        NodeKind::Group { head, .. } => count(graph, *head),
                        NodeKind::Alternation(branches) => {
                            branches.iter().map(|b| count(graph, *b)).sum()
                        }
                        NodeKind::Not(operand) => count(graph, Some(*operand)),
                        _ => 0,
                    }
                })
                .sum()
        }
        count(self, self.root)
    }
}

pub struct ChainIter<'a> {
    nodes: &'a [Node],
    current: Option<NodeId>,
}

impl Iterator for ChainIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.nodes[id.index()].next;
        Some(id)
    }
}

/// Follow `next` links without borrowing a whole `Graph`; used while the
/// arena is still being rewritten.
pub(crate) fn chain_ids(nodes: &[Node], head: Option<NodeId>) -> Vec<NodeId> {
    ChainIter {
        nodes,
        current: head,
    }
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantifier_allows_more() {
        assert!(Quantifier::STAR.allows_more(1_000));
        assert!(Quantifier::ONE.allows_more(0));
        assert!(!Quantifier::ONE.allows_more(1));
        assert!(Quantifier::new(2, Some(3)).allows_more(2));
        assert!(!Quantifier::new(2, Some(3)).allows_more(3));
    }

    #[test]
    fn test_fold_group_exact_cases() {
        // inner {1,1} under {2,3}
        assert_eq!(
            Quantifier::ONE.fold_group(Quantifier::new(2, Some(3))),
            Quantifier::new(2, Some(3))
        );
        // inner {1,1} under ?
        assert_eq!(
            Quantifier::ONE.fold_group(Quantifier::OPTIONAL),
            Quantifier::OPTIONAL
        );
        // inner {1,1} under *
        assert_eq!(Quantifier::ONE.fold_group(Quantifier::STAR), Quantifier::STAR);
        // group {1,1} keeps the inner quantifier
        assert_eq!(
            Quantifier::new(2, Some(5)).fold_group(Quantifier::ONE),
            Quantifier::new(2, Some(5))
        );
    }

    #[test]
    fn test_fold_group_additive() {
        // (?:a{2}){2} folds to {3,3}, not the multiplicative {4,4}
        assert_eq!(
            Quantifier::new(2, Some(2)).fold_group(Quantifier::new(2, Some(2))),
            Quantifier::new(3, Some(3))
        );
        // (?:a*)? never underflows
        assert_eq!(Quantifier::STAR.fold_group(Quantifier::OPTIONAL), Quantifier::STAR);
    }

    #[test]
    fn test_fixed_width() {
        let lit = Node::new(NodeKind::Literal("abc".chars().collect()));
        assert_eq!(lit.fixed_width(), Some(3));
        let anchor = Node::new(NodeKind::Anchor(Anchor::LineEnd));
        assert_eq!(anchor.fixed_width(), Some(0));
        let backref = Node::new(NodeKind::Backref(1));
        assert_eq!(backref.fixed_width(), None);
    }
}
