// Core matching engine: backtracking over the node graph with an explicit
// stack of choice points held on the heap
//
// - MatchState holds the graph, the classifier, captures and the loop-guard
// - Every node tries its repetition counts most first; the untried counts,
//   branches and loop exits are pushed as choice points
// - A container iteration pushes a frame; finishing the inner chain pops
//   back to that frame and decides whether to loop again
// - Frames, capture writes and guard entries are logged, so resuming a
//   choice point truncates them back to what they were when it was pushed
// - Native recursion only happens for `~` operands, bounded by the pattern

use ahash::AHashSet;

use crate::class::Classifier;
use crate::cursor::Cursor;
use crate::node::{Anchor, Graph, Node, NodeId, NodeKind};
use crate::regex::Span;

/// A committed capture: cursor at its start, position of its end.
#[derive(Debug, Clone)]
struct CaptureSlot<C> {
    start: C,
    end: usize,
}

/// Container `node` began iteration `count` at `start`. `outer` is the
/// frame the container itself runs in, `None` for the root chain.
#[derive(Debug, Clone)]
struct Frame<C> {
    node: NodeId,
    count: usize,
    start: C,
    outer: Option<usize>,
}

/// Work that resumes matching. `k` indexes `MatchState::frames`; `None`
/// means the end of the pattern.
#[derive(Debug)]
enum Task<C> {
    /// Match the chain at `head` from `cur`.
    Chain {
        head: Option<NodeId>,
        cur: C,
        k: Option<usize>,
    },
    /// Give back one repetition of a simple node that matched `count` times
    /// up to `pos`.
    Retreat {
        node: NodeId,
        count: usize,
        width: usize,
        pos: C,
        k: Option<usize>,
    },
}

/// Log lengths at the time a choice point was pushed.
#[derive(Debug, Clone, Copy)]
struct Marks {
    frames: usize,
    captures: usize,
    guard: usize,
}

#[derive(Debug)]
struct Choice<C> {
    task: Task<C>,
    marks: Marks,
}

enum Flow<C> {
    Continue(Task<C>),
    Matched(C),
    Fail,
}

/// Per-call matching state. Never shared between calls or threads.
pub struct MatchState<'g, 'c, C, K: ?Sized> {
    graph: &'g Graph,
    classifier: &'c K,
    case_insensitive: bool,
    multiline: bool,
    captures: Vec<Option<CaptureSlot<C>>>,
    /// Iteration frames of the current path.
    frames: Vec<Frame<C>>,
    /// Previous value of every capture slot overwritten on the current path.
    capture_log: Vec<(usize, Option<CaptureSlot<C>>)>,
    /// `(container, position)` pairs with an iteration in progress.
    guard: AHashSet<(NodeId, usize)>,
    guard_log: Vec<(NodeId, usize)>,
}

impl<'g, 'c, C: Cursor, K: Classifier + ?Sized> MatchState<'g, 'c, C, K> {
    pub fn new(graph: &'g Graph, classifier: &'c K) -> Self {
        let flags = graph.flags();
        MatchState {
            graph,
            classifier,
            case_insensitive: flags.case_insensitive,
            multiline: flags.multiline,
            captures: vec![None; graph.capture_count()],
            frames: Vec::new(),
            capture_log: Vec::new(),
            guard: AHashSet::new(),
            guard_log: Vec::new(),
        }
    }

    /// Reset captures, frames and the loop-guard for another attempt.
    #[inline]
    pub fn reset(&mut self) {
        self.captures.iter_mut().for_each(|slot| *slot = None);
        self.frames.clear();
        self.capture_log.clear();
        self.guard.clear();
        self.guard_log.clear();
    }

    /// Try the whole pattern at `start`. Returns the cursor at the end of the match.
    pub fn run(&mut self, start: C) -> Option<C> {
        self.reset();
        self.execute(self.graph.root(), start)
    }

    /// Committed capture spans after a successful `run`, group 1 first.
    pub fn spans(&self) -> Vec<Option<Span>> {
        self.captures
            .iter()
            .map(|slot| {
                slot.as_ref()
                    .map(|s| Span::new(s.start.position(), s.end))
            })
            .collect()
    }

    /// Fail-fast check: whether the input behind `cursor` ends with the
    /// graph's required suffix. Always true when there is none.
    pub fn suffix_matches(&self, cursor: &C) -> bool {
        let Some(suffix) = self.graph.required_suffix() else {
            return true;
        };
        if cursor.remaining() < suffix.len() {
            return false;
        }
        let mut tail = cursor.clone();
        while tail.advance() {}
        for &expected in suffix.iter().rev() {
            if !tail.retreat() {
                return false;
            }
            match tail.current() {
                Some(c) if self.same_char(c, expected) => {}
                _ => return false,
            }
        }
        true
    }

    #[inline]
    fn same_char(&self, c: char, expected: char) -> bool {
        c == expected
            || (self.case_insensitive
                && self.classifier.fold_case(c) == self.classifier.fold_case(expected))
    }

    #[inline]
    fn is_word(&self, c: Option<char>) -> bool {
        c.is_some_and(|c| self.classifier.is_word(c))
    }

    /// Match the chain at `head` through to the end of the pattern. The
    /// choice stack is local, so a nested call for a `~` operand leaves the
    /// caller's choice points alone.
    fn execute(&mut self, head: Option<NodeId>, cur: C) -> Option<C> {
        let mut stack: Vec<Choice<C>> = Vec::new();
        let mut task = Task::Chain { head, cur, k: None };
        loop {
            let flow = match task {
                Task::Chain { head, cur, k } => self.match_chain(head, cur, k, &mut stack),
                Task::Retreat {
                    node,
                    count,
                    width,
                    mut pos,
                    k,
                } => {
                    for _ in 0..width {
                        pos.retreat();
                    }
                    self.retreat_from(node, count - 1, width, pos, k, &mut stack)
                }
            };
            task = match flow {
                Flow::Continue(next) => next,
                Flow::Matched(end) => return Some(end),
                Flow::Fail => {
                    let choice = stack.pop()?;
                    self.rewind(choice.marks);
                    choice.task
                }
            };
        }
    }

    fn marks(&self) -> Marks {
        Marks {
            frames: self.frames.len(),
            captures: self.capture_log.len(),
            guard: self.guard_log.len(),
        }
    }

    fn push(&self, stack: &mut Vec<Choice<C>>, task: Task<C>) {
        stack.push(Choice {
            task,
            marks: self.marks(),
        });
    }

    /// Undo every frame, capture write and guard entry made after `marks`.
    fn rewind(&mut self, marks: Marks) {
        self.frames.truncate(marks.frames);
        while self.capture_log.len() > marks.captures {
            if let Some((slot, previous)) = self.capture_log.pop() {
                self.captures[slot] = previous;
            }
        }
        while self.guard_log.len() > marks.guard {
            if let Some(signature) = self.guard_log.pop() {
                self.guard.remove(&signature);
            }
        }
    }

    fn match_chain(
        &mut self,
        head: Option<NodeId>,
        cur: C,
        k: Option<usize>,
        stack: &mut Vec<Choice<C>>,
    ) -> Flow<C> {
        match head {
            Some(id) => self.match_node(id, cur, k, stack),
            None => self.resume(cur, k, stack),
        }
    }

    /// The current chain ran out of nodes: finish the innermost iteration,
    /// or report the match when there is none.
    fn resume(&mut self, cur: C, k: Option<usize>, stack: &mut Vec<Choice<C>>) -> Flow<C> {
        let Some(frame) = k.and_then(|index| self.frames.get(index)).cloned() else {
            return Flow::Matched(cur);
        };
        self.end_iteration(frame, cur, stack)
    }

    fn match_node(&mut self, id: NodeId, cur: C, k: Option<usize>, stack: &mut Vec<Choice<C>>) -> Flow<C> {
        let graph = self.graph;
        let node = graph.node(id);
        if cur.remaining() < node.min_len
            || (node.anchored && node.quant.min > 0 && !cur.is_at_start())
        {
            return Flow::Fail;
        }

        match &node.kind {
            NodeKind::Group { .. } | NodeKind::Alternation(_) => self.repeat_container(id, 0, cur, k, stack),
            NodeKind::Anchor(anchor) => {
                let holds = self.check_anchor(*anchor, &cur);
                assert_then(node, holds, cur, k)
            }
            NodeKind::Not(operand) => {
                let holds = !self.probe(*operand, &cur);
                assert_then(node, holds, cur, k)
            }
            NodeKind::Literal(_) | NodeKind::Set(_) | NodeKind::Class { .. } | NodeKind::Backref(_) => {
                self.repeat_simple(id, node, cur, k, stack)
            }
        }
    }

    /// Whether the operand chain matches at `cur`; leaves no capture behind.
    fn probe(&mut self, operand: NodeId, cur: &C) -> bool {
        let marks = self.marks();
        let matched = self.execute(Some(operand), cur.clone()).is_some();
        self.rewind(marks);
        matched
    }

    fn check_anchor(&self, anchor: Anchor, cur: &C) -> bool {
        let prev = cur.previous();
        let next = cur.current();
        match anchor {
            Anchor::InputStart => prev.is_none(),
            Anchor::InputEnd => next.is_none(),
            Anchor::LineStart => prev.is_none() || (self.multiline && prev == Some('\n')),
            Anchor::LineEnd => next.is_none() || (self.multiline && next == Some('\n')),
            Anchor::WordBoundary => self.is_word(prev) != self.is_word(next),
            Anchor::NotWordBoundary => self.is_word(prev) == self.is_word(next),
            Anchor::WordStart => !self.is_word(prev) && self.is_word(next),
            Anchor::WordEnd => self.is_word(prev) && !self.is_word(next),
        }
    }

    fn captured(&self, index: usize) -> Option<&CaptureSlot<C>> {
        index
            .checked_sub(1)
            .and_then(|slot| self.captures.get(slot))
            .and_then(Option::as_ref)
    }

    /// One repetition of a consuming node. Returns the cursor past it.
    fn step(&self, node: &Node, pos: &C) -> Option<C> {
        let mut cur = pos.clone();
        match &node.kind {
            NodeKind::Literal(text) => {
                for &expected in text.iter() {
                    let c = cur.current()?;
                    if !self.same_char(c, expected) {
                        return None;
                    }
                    cur.advance();
                }
            }
            NodeKind::Set(set) => {
                let c = cur.current()?;
                if !set.matches(c, self.classifier, self.case_insensitive) {
                    return None;
                }
                cur.advance();
            }
            NodeKind::Class { class, negated } => {
                let c = cur.current()?;
                if class.matches(c, self.classifier, self.multiline) == *negated {
                    return None;
                }
                cur.advance();
            }
            NodeKind::Backref(index) => {
                let slot = self.captured(*index)?;
                let mut src = slot.start.clone();
                while src.position() < slot.end {
                    let expected = src.current()?;
                    let c = cur.current()?;
                    if !self.same_char(c, expected) {
                        return None;
                    }
                    src.advance();
                    cur.advance();
                }
            }
            _ => return None,
        }
        Some(cur)
    }

    /// Greedy repetition of a node with a fixed width per repetition:
    /// consume as many as allowed, then give them back one at a time.
    fn repeat_simple(
        &mut self,
        id: NodeId,
        node: &Node,
        cur: C,
        k: Option<usize>,
        stack: &mut Vec<Choice<C>>,
    ) -> Flow<C> {
        let quant = node.quant;
        let width = match &node.kind {
            NodeKind::Backref(index) => match self.captured(*index) {
                Some(slot) => slot.end - slot.start.position(),
                None if quant.min == 0 => return continue_with(node.next, cur, k),
                None => return Flow::Fail,
            },
            _ => node.fixed_width().unwrap_or(1),
        };
        if width == 0 {
            // empty capture: every count lands on the same position
            return continue_with(node.next, cur, k);
        }

        let mut pos = cur;
        let mut count = 0;
        while quant.allows_more(count) {
            match self.step(node, &pos) {
                Some(after) => {
                    pos = after;
                    count += 1;
                }
                None => break,
            }
        }
        if count < quant.min {
            return Flow::Fail;
        }
        self.retreat_from(id, count, width, pos, k, stack)
    }

    /// Continue after `count` repetitions ending at `pos`, leaving a choice
    /// point for one fewer. Counts whose rest cannot fit are skipped.
    fn retreat_from(
        &mut self,
        id: NodeId,
        mut count: usize,
        width: usize,
        mut pos: C,
        k: Option<usize>,
        stack: &mut Vec<Choice<C>>,
    ) -> Flow<C> {
        let graph = self.graph;
        let node = graph.node(id);
        let next_min = node.next.map_or(0, |next| graph.node(next).min_len);
        loop {
            if pos.remaining() >= next_min {
                if count > node.quant.min {
                    let task = Task::Retreat {
                        node: id,
                        count,
                        width,
                        pos: pos.clone(),
                        k,
                    };
                    self.push(stack, task);
                }
                return continue_with(node.next, pos, k);
            }
            if count == node.quant.min {
                return Flow::Fail;
            }
            count -= 1;
            for _ in 0..width {
                pos.retreat();
            }
        }
    }

    /// Iteration `count` of a group or alternation starting at `cur`.
    /// Leaving the loop is pushed first, so it is tried after every branch.
    fn repeat_container(
        &mut self,
        id: NodeId,
        count: usize,
        cur: C,
        k: Option<usize>,
        stack: &mut Vec<Choice<C>>,
    ) -> Flow<C> {
        let graph = self.graph;
        let node = graph.node(id);
        let can_exit = count >= node.quant.min;
        let signature = (id, cur.position());

        // a signature already in progress means no progress was made
        if !node.quant.allows_more(count) || self.guard.contains(&signature) {
            return if can_exit {
                continue_with(node.next, cur, k)
            } else {
                Flow::Fail
            };
        }

        if can_exit {
            let exit = Task::Chain {
                head: node.next,
                cur: cur.clone(),
                k,
            };
            self.push(stack, exit);
        }
        self.guard.insert(signature);
        self.guard_log.push(signature);
        self.frames.push(Frame {
            node: id,
            count,
            start: cur.clone(),
            outer: k,
        });
        let frame = Some(self.frames.len() - 1);

        match &node.kind {
            NodeKind::Group { head, .. } => continue_with(*head, cur, frame),
            NodeKind::Alternation(branches) => {
                let Some((&first, rest)) = branches.split_first() else {
                    return Flow::Fail;
                };
                for &branch in rest.iter().rev() {
                    let task = Task::Chain {
                        head: branch,
                        cur: cur.clone(),
                        k: frame,
                    };
                    self.push(stack, task);
                }
                continue_with(first, cur, frame)
            }
            _ => Flow::Fail,
        }
    }

    /// The inner chain of an iteration reached `cur`: commit the capture,
    /// then loop again or continue after the container.
    fn end_iteration(&mut self, frame: Frame<C>, cur: C, stack: &mut Vec<Choice<C>>) -> Flow<C> {
        let graph = self.graph;
        let node = graph.node(frame.node);

        if let Some(slot) = node.capture.and_then(|index| index.checked_sub(1))
            && let Some(entry) = self.captures.get_mut(slot)
        {
            let committed = Some(CaptureSlot {
                start: frame.start.clone(),
                end: cur.position(),
            });
            let previous = std::mem::replace(entry, committed);
            self.capture_log.push((slot, previous));
        }

        if cur.position() == frame.start.position() {
            // an empty iteration cannot make progress; leave the loop
            continue_with(node.next, cur, frame.outer)
        } else {
            self.repeat_container(frame.node, frame.count + 1, cur, frame.outer, stack)
        }
    }
}

#[inline]
fn continue_with<C>(head: Option<NodeId>, cur: C, k: Option<usize>) -> Flow<C> {
    Flow::Continue(Task::Chain { head, cur, k })
}

/// Zero-width nodes: a quantifier with min 0 makes the assertion optional.
fn assert_then<C>(node: &Node, holds: bool, cur: C, k: Option<usize>) -> Flow<C> {
    if holds || node.quant.min == 0 {
        continue_with(node.next, cur, k)
    } else {
        Flow::Fail
    }
}
