// Structural dump of a compiled graph, one node per line.
//
//   pattern "(a|b)\\1" flags ""
//     capture #1 min=1
//       alternation min=1
//         branch
//           literal "a" min=1
//         branch
//           literal "b" min=1
//     backref \1 min=0

use std::fmt::Write;

use crate::node::{Graph, NodeId, NodeKind, Quantifier};

pub fn dump(graph: &Graph) -> String {
    let mut out = String::new();
    let (start, end) = graph.pattern_range;
    let (flags_start, flags_end) = graph.flags_range;
    let _ = write!(
        out,
        "pattern {:?} flags {:?}",
        &graph.source[start..end],
        &graph.source[flags_start..flags_end]
    );
    if let Some(suffix) = graph.required_suffix() {
        let suffix: String = suffix.iter().collect();
        let _ = write!(out, " suffix {:?}", suffix);
    }
    out.push('\n');
    dump_chain(graph, graph.root(), 1, &mut out);
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn push_usize(out: &mut String, n: usize) {
    let mut buf = itoa::Buffer::new();
    out.push_str(buf.format(n));
}

fn dump_chain(graph: &Graph, head: Option<NodeId>, depth: usize, out: &mut String) {
    if head.is_none() {
        indent(out, depth);
        out.push_str("empty\n");
        return;
    }
    for id in graph.chain(head) {
        dump_node(graph, id, depth, out);
    }
}

fn dump_quantifier(quant: Quantifier, out: &mut String) {
    if quant.is_one() {
        return;
    }
    out.push_str(" {");
    push_usize(out, quant.min);
    if quant.max != Some(quant.min) {
        out.push(',');
        if let Some(max) = quant.max {
            push_usize(out, max);
        }
    }
    out.push('}');
}

fn dump_node(graph: &Graph, id: NodeId, depth: usize, out: &mut String) {
    let node = graph.node(id);
    indent(out, depth);
    match &node.kind {
        NodeKind::Literal(text) => {
            let text: String = text.iter().collect();
            let _ = write!(out, "literal {:?}", text);
        }
        NodeKind::Set(set) => {
            let _ = write!(out, "set {}", set);
        }
        NodeKind::Class { class, negated } => {
            out.push_str("class ");
            let letter = class.escape_letter();
            if letter == '.' {
                out.push('.');
            } else {
                out.push('\\');
                out.push(if *negated { letter.to_ascii_uppercase() } else { letter });
            }
        }
        NodeKind::Anchor(anchor) => {
            out.push_str("anchor ");
            out.push_str(anchor.syntax());
        }
        NodeKind::Group { capturing: true, .. } => out.push_str("capture"),
        NodeKind::Group { capturing: false, .. } => out.push_str("group"),
        NodeKind::Alternation(_) => out.push_str("alternation"),
        NodeKind::Not(_) => out.push_str("not"),
        NodeKind::Backref(index) => {
            out.push_str("backref \\");
            push_usize(out, *index);
        }
    }

    dump_quantifier(node.quant, out);
    if let Some(index) = node.capture {
        out.push_str(" #");
        push_usize(out, index);
        if let Some((name, _)) = graph.names.iter().find(|&(_, &i)| i == index) {
            let _ = write!(out, " <{}>", name);
        }
    }
    if node.anchored {
        out.push_str(" anchored");
    }
    out.push_str(" min=");
    push_usize(out, node.min_len);
    out.push('\n');

    match &node.kind {
        NodeKind::Group { head, .. } => dump_chain(graph, *head, depth + 1, out),
        NodeKind::Alternation(branches) => {
            for branch in branches {
                indent(out, depth + 1);
                out.push_str("branch\n");
                dump_chain(graph, *branch, depth + 2, out);
            }
        }
        NodeKind::Not(operand) => dump_chain(graph, Some(*operand), depth + 1, out),
        _ => {}
    }
}
