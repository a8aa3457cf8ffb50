// Structural rewrites applied once, right after parsing.
//
// Order matters: collapsing first exposes more identical branches, and
// min-length annotation must see the final shape of every chain.

use log::debug;

use crate::node::{Anchor, Graph, Node, NodeId, NodeKind, chain_ids};

pub fn optimize(graph: &mut Graph) {
    let collapsed = if graph.flags.no_ungroup {
        0
    } else {
        collapse_groups(graph, graph.root)
    };
    let removed = dedup_branches(graph, graph.root);
    graph.required_suffix = fixed_end_suffix(graph);
    annotate_min_len(&mut graph.nodes, graph.root);

    debug!(
        "optimized {:?}: collapsed {} groups, removed {} branches, fail-fast {}, min length {}, {} live nodes",
        graph.source,
        collapsed,
        removed,
        graph.required_suffix.is_some(),
        graph.min_len(),
        graph.reachable_len()
    );
}

/// Children of a node that head their own chains.
fn sub_chains(node: &Node) -> Vec<Option<NodeId>> {
    match &node.kind {
        NodeKind::Group { head, .. } => vec![*head],
        NodeKind::Alternation(branches) => branches.clone(),
        NodeKind::Not(operand) => vec![Some(*operand)],
        _ => Vec::new(),
    }
}

/// Pass 1: replace `(?:X)` by `X` when the group holds exactly one node.
/// Works bottom-up so nested groups collapse in one walk.
fn collapse_groups(graph: &mut Graph, head: Option<NodeId>) -> usize {
    let mut collapsed = 0;
    for id in chain_ids(&graph.nodes, head) {
        for child in sub_chains(&graph.nodes[id.index()]) {
            collapsed += collapse_groups(graph, child);
        }

        let group = &graph.nodes[id.index()];
        let NodeKind::Group {
            head: Some(inner_id),
            capturing: false,
        } = group.kind
        else {
            continue;
        };
        let inner = &graph.nodes[inner_id.index()];
        if inner.next.is_some() || group.quant.max == Some(0) {
            continue;
        }
        let exact = group.quant.is_one() || inner.quant.is_one();
        if !exact && graph.flags.optimize_accuracy {
            continue;
        }

        let mut replacement = inner.clone();
        replacement.quant = inner.quant.fold_group(group.quant);
        replacement.capture = inner.capture.or(group.capture);
        replacement.anchored = inner.anchored || group.anchored;
        replacement.next = group.next;
        // the inner slot is now unreachable; the group's id takes its place
        graph.nodes[id.index()] = replacement;
        collapsed += 1;
    }
    collapsed
}

/// Pass 2: drop alternatives structurally identical to an earlier one.
fn dedup_branches(graph: &mut Graph, head: Option<NodeId>) -> usize {
    let mut removed = 0;
    for id in chain_ids(&graph.nodes, head) {
        for child in sub_chains(&graph.nodes[id.index()]) {
            removed += dedup_branches(graph, child);
        }

        let NodeKind::Alternation(branches) = &graph.nodes[id.index()].kind else {
            continue;
        };
        let mut kept: Vec<Option<NodeId>> = Vec::with_capacity(branches.len());
        for &branch in branches {
            if !kept.iter().any(|&k| same_chain(&graph.nodes, k, branch)) {
                kept.push(branch);
            }
        }
        if kept.len() < branches.len() {
            removed += branches.len() - kept.len();
            graph.nodes[id.index()].kind = NodeKind::Alternation(kept);
        }
    }
    removed
}

fn same_chain(nodes: &[Node], a: Option<NodeId>, b: Option<NodeId>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            let (x, y) = (&nodes[a.index()], &nodes[b.index()]);
            same_node(nodes, x, y) && same_chain(nodes, x.next, y.next)
        }
        _ => false,
    }
}

fn same_node(nodes: &[Node], x: &Node, y: &Node) -> bool {
    if x.quant != y.quant || x.capture != y.capture || x.anchored != y.anchored {
        return false;
    }
    match (&x.kind, &y.kind) {
        (
            NodeKind::Group {
                head: h1,
                capturing: c1,
            },
            NodeKind::Group {
                head: h2,
                capturing: c2,
            },
        ) => c1 == c2 && same_chain(nodes, *h1, *h2),
        (NodeKind::Alternation(b1), NodeKind::Alternation(b2)) => {
            b1.len() == b2.len()
                && b1
                    .iter()
                    .zip(b2)
                    .all(|(&p, &q)| same_chain(nodes, p, q))
        }
        (NodeKind::Not(o1), NodeKind::Not(o2)) => same_chain(nodes, Some(*o1), Some(*o2)),
        (k1, k2) if k1.is_container() || k2.is_container() => false,
        (NodeKind::Not(_), _) | (_, NodeKind::Not(_)) => false,
        (k1, k2) => k1 == k2,
    }
}

/// Pass 3: the text a match must end with when the root chain ends in a
/// fixed-count literal followed by an end-of-input anchor.
fn fixed_end_suffix(graph: &Graph) -> Option<Box<[char]>> {
    if !graph.flags.wants_fail_fast() || graph.flags.multiline {
        return None;
    }
    let chain = chain_ids(&graph.nodes, graph.root);
    let [.., literal, anchor] = chain.as_slice() else {
        return None;
    };
    let (literal, anchor) = (graph.node(*literal), graph.node(*anchor));
    if !matches!(
        anchor.kind,
        NodeKind::Anchor(Anchor::LineEnd | Anchor::InputEnd)
    ) {
        return None;
    }
    let NodeKind::Literal(text) = &literal.kind else {
        return None;
    };
    // an optional anchor or literal does not pin the tail
    if anchor.quant.min == 0
        || literal.quant.min == 0
        || !literal.quant.is_fixed()
        || literal.capture.is_some()
    {
        return None;
    }
    let suffix: Box<[char]> = text
        .iter()
        .copied()
        .cycle()
        .take(text.len() * literal.quant.min)
        .collect();
    if suffix.is_empty() { None } else { Some(suffix) }
}

/// Pass 4: fill `min_len` for every node of the chain at `head`, returning
/// the chain's own minimum.
fn annotate_min_len(nodes: &mut [Node], head: Option<NodeId>) -> usize {
    let chain = chain_ids(nodes, head);
    let mut rest = 0usize;
    for &id in chain.iter().rev() {
        let once = match nodes[id.index()].kind.clone() {
            NodeKind::Literal(text) => text.len(),
            NodeKind::Set(_) | NodeKind::Class { .. } => 1,
            NodeKind::Anchor(_) | NodeKind::Backref(_) => 0,
            NodeKind::Not(operand) => {
                annotate_min_len(nodes, Some(operand));
                0
            }
            NodeKind::Group { head, .. } => annotate_min_len(nodes, head),
            NodeKind::Alternation(branches) => branches
                .iter()
                .map(|&branch| annotate_min_len(nodes, branch))
                .min()
                .unwrap_or(0),
        };
        let node = &mut nodes[id.index()];
        node.min_len = once.saturating_mul(node.quant.min).saturating_add(rest);
        rest = node.min_len;
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::node::Quantifier;
    use crate::parser::parse;

    fn compiled(source: &str) -> Graph {
        let mut graph = parse(source, Flags::default()).unwrap();
        optimize(&mut graph);
        graph
    }

    #[test]
    fn test_collapse_single_element_group() {
        let graph = compiled("(?:a){2,3}");
        let root = graph.root().unwrap();
        let node = graph.node(root);
        assert_eq!(node.kind, NodeKind::Literal(Box::new(['a'])));
        assert_eq!(node.quant, Quantifier::new(2, Some(3)));
        assert_eq!(graph.reachable_len(), 1);
    }

    #[test]
    fn test_collapse_keeps_continuation() {
        let graph = compiled("x(?:ab)*y");
        let chain: Vec<_> = graph.chain(graph.root()).collect();
        assert_eq!(chain.len(), 3);
        let middle = graph.node(chain[1]);
        assert_eq!(middle.kind, NodeKind::Literal("ab".chars().collect()));
        assert_eq!(middle.quant, Quantifier::STAR);
    }

    #[test]
    fn test_collapse_nested_groups() {
        let graph = compiled("(?:(?:a))");
        assert_eq!(graph.reachable_len(), 1);
    }

    #[test]
    fn test_capturing_groups_are_not_collapsed() {
        let graph = compiled("(a)");
        let root = graph.root().unwrap();
        assert!(matches!(graph.node(root).kind, NodeKind::Group { .. }));
    }

    #[test]
    fn test_collapse_suppressed() {
        let graph = compiled("/(?:a)+/u");
        let root = graph.root().unwrap();
        assert!(matches!(graph.node(root).kind, NodeKind::Group { .. }));
    }

    #[test]
    fn test_accuracy_skips_inexact_collapse() {
        let graph = compiled("/(?:a{2}){2}/a");
        let root = graph.root().unwrap();
        assert!(matches!(graph.node(root).kind, NodeKind::Group { .. }));

        let graph = compiled("/(?:a){2}/a");
        let root = graph.root().unwrap();
        assert_eq!(graph.node(root).quant, Quantifier::new(2, Some(2)));
    }

    #[test]
    fn test_dedup_branches() {
        let graph = compiled("a|b|a|(?:b)");
        let root = graph.root().unwrap();
        let NodeKind::Alternation(branches) = &graph.node(root).kind else {
            panic!("expected alternation");
        };
        assert_eq!(branches.len(), 2);
    }

    #[test]
    fn test_dedup_respects_captures() {
        let graph = compiled("(a)|(a)");
        let root = graph.root().unwrap();
        let NodeKind::Alternation(branches) = &graph.node(root).kind else {
            panic!("expected alternation");
        };
        assert_eq!(branches.len(), 2);
    }

    #[test]
    fn test_fixed_end_suffix() {
        assert_eq!(compiled("/a.*end$/e").required_suffix(), Some(&['e', 'n', 'd'][..]));
        assert_eq!(compiled(r"/.*(?:ab){2}\z/e").required_suffix().map(|s| s.len()), Some(4));
        assert_eq!(compiled("/a.*end$/f").required_suffix().map(|s| s.len()), Some(3));
        assert!(compiled("a.*end$").required_suffix().is_none());
        assert!(compiled("/a.*end$/em").required_suffix().is_none());
        assert!(compiled("/a.*end$/fa").required_suffix().is_none());
        assert!(compiled("/a.*en+$/e").required_suffix().is_none());
    }

    #[test]
    fn test_min_len() {
        let graph = compiled("ab[cd]{2,}(?:x|yz)?q");
        assert_eq!(graph.min_len(), 5);
        let graph = compiled("(ab|c)d");
        assert_eq!(graph.min_len(), 2);
        let graph = compiled("a*");
        assert_eq!(graph.min_len(), 0);
    }
}
