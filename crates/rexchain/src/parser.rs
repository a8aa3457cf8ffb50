// Pattern parser
// Recursive descent over the pattern characters, producing the node arena.
//
// Grammar (informal):
//   source      := pattern | '/' pattern '/' flags
//   alternation := sequence ('|' sequence)*
//   sequence    := quantified*
//   quantified  := '~' quantified | atom quantifier?
//   atom        := literal | '.' | '[' set ']' | '\' escape | '(' group ')' | '^' | '$'
//   quantifier  := '*' | '+' | '?' | '{' m? (',' n?)? '}'

use ahash::AHashMap;
use log::debug;
use smol_str::SmolStr;

use crate::class::{ClassItem, ClassSet, PredefinedClass};
use crate::error::{ExpressionErrorKind, InvalidExpression, RegexResult, SourceRange};
use crate::flags::Flags;
use crate::limits::{MAX_CAPTURES, MAX_NESTING_DEPTH, MAX_REPEAT};
use crate::node::{Anchor, Graph, Node, NodeId, NodeKind, Quantifier};

/// Parse `source` into an unoptimized graph. `base` flags are merged with
/// any `/.../flags` suffix.
pub fn parse(source: &str, base: Flags) -> RegexResult<Graph> {
    let (pattern_range, flags_range) = split_delimiters(source);
    let chars: Vec<char> = source.chars().collect();
    let char_offset = |byte: usize| source[..byte].chars().count();

    let mut suffix = Flags::default();
    let flags_start = char_offset(flags_range.0);
    for (i, letter) in source[flags_range.0..flags_range.1].chars().enumerate() {
        if !suffix.set_letter(letter) {
            return Err(InvalidExpression::new(
                ExpressionErrorKind::InvalidFlag,
                format!("unknown flag '{}'", letter),
                SourceRange::at(flags_start + i),
            ));
        }
    }
    let flags = base.merge(suffix);

    let mut parser = PatternParser {
        chars: &chars,
        pos: char_offset(pattern_range.0),
        end: char_offset(pattern_range.1),
        depth: 0,
        flags,
        nodes: Vec::new(),
        group_count: 0,
        open_groups: Vec::new(),
        names: AHashMap::new(),
    };
    let root = parser.parse_root()?;

    debug!(
        "parsed pattern {:?}: {} nodes, {} groups, flags '{}'",
        source,
        parser.nodes.len(),
        parser.group_count,
        flags
    );

    Ok(Graph {
        nodes: parser.nodes,
        root,
        flags,
        capture_count: parser.group_count,
        names: parser.names,
        required_suffix: None,
        source: source.to_string(),
        pattern_range,
        flags_range,
    })
}

/// Byte ranges of the pattern body and of the flag suffix inside `source`.
/// The delimited form needs a leading `/`, a later `/`, and only ASCII
/// letters after the last `/`; anything else is a bare pattern.
pub fn split_delimiters(source: &str) -> ((usize, usize), (usize, usize)) {
    if let Some(rest) = source.strip_prefix('/')
        && let Some(last) = rest.rfind('/')
    {
        let close = last + 1;
        if source[close + 1..].chars().all(|c| c.is_ascii_alphabetic()) {
            return ((1, close), (close + 1, source.len()));
        }
    }
    ((0, source.len()), (source.len(), source.len()))
}

fn control_escape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        'f' => Some('\x0C'),
        'v' => Some('\x0B'),
        '0' => Some('\0'),
        _ => None,
    }
}

enum SetEscape {
    Char(char),
    Item(ClassItem),
}

struct PatternParser<'a> {
    chars: &'a [char],
    pos: usize,
    end: usize,
    /// Open groups and negations, bounded by `MAX_NESTING_DEPTH`.
    depth: usize,
    flags: Flags,
    nodes: Vec<Node>,
    group_count: usize,
    open_groups: Vec<usize>,
    names: AHashMap<SmolStr, usize>,
}

impl PatternParser<'_> {
    #[inline]
    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    #[inline]
    fn peek_at(&self, ahead: usize) -> Option<char> {
        let i = self.pos + ahead;
        if i < self.end { Some(self.chars[i]) } else { None }
    }

    #[inline]
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn error(&self, kind: ExpressionErrorKind, message: impl Into<String>, start: usize) -> InvalidExpression {
        let length = self.pos.saturating_sub(start).max(1);
        InvalidExpression::new(kind, message, SourceRange::new(start, length))
    }

    fn enter(&mut self, start: usize) -> RegexResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(InvalidExpression::new(
                ExpressionErrorKind::NestingTooDeep,
                format!("pattern nests deeper than {} levels", MAX_NESTING_DEPTH),
                SourceRange::at(start),
            ));
        }
        Ok(())
    }

    fn parse_root(&mut self) -> RegexResult<Option<NodeId>> {
        let head = self.parse_alternation()?;
        if self.pos < self.end {
            // only an unmatched ')' stops the top-level alternation early
            return Err(InvalidExpression::new(
                ExpressionErrorKind::UnmatchedParen,
                "unmatched ')'",
                SourceRange::at(self.pos),
            ));
        }
        Ok(head)
    }

    fn parse_alternation(&mut self) -> RegexResult<Option<NodeId>> {
        let first = self.parse_sequence()?;
        if self.peek() != Some('|') {
            return Ok(first);
        }
        let mut branches = vec![first];
        while self.peek() == Some('|') {
            self.pos += 1;
            branches.push(self.parse_sequence()?);
        }
        Ok(Some(self.push(Node::new(NodeKind::Alternation(branches)))))
    }

    fn parse_sequence(&mut self) -> RegexResult<Option<NodeId>> {
        let mut seq: Vec<NodeId> = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            let mut node = self.parse_quantified()?;
            if seq.is_empty() && self.is_start_anchor(&node.kind) {
                node.anchored = true;
            }
            self.append(&mut seq, node);
        }
        for pair in seq.windows(2) {
            self.nodes[pair[0].index()].next = Some(pair[1]);
        }
        Ok(seq.first().copied())
    }

    fn is_start_anchor(&self, kind: &NodeKind) -> bool {
        match kind {
            NodeKind::Anchor(Anchor::InputStart) => true,
            NodeKind::Anchor(Anchor::LineStart) => !self.flags.multiline,
            _ => false,
        }
    }

    /// Push `node` onto the sequence, fusing a plain literal into a plain
    /// literal predecessor unless `no_expose` is set.
    fn append(&mut self, seq: &mut Vec<NodeId>, node: Node) {
        if !self.flags.no_expose
            && node.quant.is_one()
            && let NodeKind::Literal(text) = &node.kind
            && let Some(&last) = seq.last()
        {
            let prev = &mut self.nodes[last.index()];
            if prev.quant.is_one()
                && prev.capture.is_none()
                && let NodeKind::Literal(prev_text) = &mut prev.kind
            {
                let mut joined = prev_text.to_vec();
                joined.extend_from_slice(text);
                *prev_text = joined.into_boxed_slice();
                return;
            }
        }
        let id = self.push(node);
        seq.push(id);
    }

    fn at_quantifier(&self) -> bool {
        matches!(self.peek(), Some('*' | '+' | '?' | '{'))
    }

    fn parse_quantified(&mut self) -> RegexResult<Node> {
        let start = self.pos;
        let mut node = self.parse_atom()?;
        if matches!(node.kind, NodeKind::Not(_)) {
            // the operand already took its quantifier
            return Ok(node);
        }
        if let Some(quant) = self.parse_quantifier()? {
            if node.kind.is_zero_width() {
                return Err(self.error(
                    ExpressionErrorKind::DanglingOperator,
                    "quantifier follows a zero-width assertion",
                    start,
                ));
            }
            node.quant = quant;
            if self.at_quantifier() {
                let at = self.pos;
                self.pos += 1;
                return Err(self.error(
                    ExpressionErrorKind::DanglingOperator,
                    "quantifier follows another quantifier",
                    at,
                ));
            }
        }
        Ok(node)
    }

    fn parse_quantifier(&mut self) -> RegexResult<Option<Quantifier>> {
        let quant = match self.peek() {
            Some('*') => Quantifier::STAR,
            Some('+') => Quantifier::PLUS,
            Some('?') => Quantifier::OPTIONAL,
            Some('{') => return self.parse_braces().map(Some),
            _ => return Ok(None),
        };
        self.pos += 1;
        Ok(Some(quant))
    }

    /// `{m}`, `{m,}`, `{m,n}`, `{,n}`
    fn parse_braces(&mut self) -> RegexResult<Quantifier> {
        let open = self.pos;
        self.pos += 1;
        let min = self.parse_bound(open)?;
        let max = if self.peek() == Some(',') {
            self.pos += 1;
            let max = self.parse_bound(open)?;
            if min.is_none() && max.is_none() {
                return Err(self.error(
                    ExpressionErrorKind::MalformedQuantifier,
                    "quantifier needs at least one bound",
                    open,
                ));
            }
            max
        } else if min.is_some() {
            min
        } else {
            return Err(self.error(
                ExpressionErrorKind::MalformedQuantifier,
                "expected a repetition count after '{'",
                open,
            ));
        };
        if self.bump() != Some('}') {
            return Err(self.error(
                ExpressionErrorKind::MalformedQuantifier,
                "missing '}' to close quantifier",
                open,
            ));
        }
        let min = min.unwrap_or(0);
        if let Some(max) = max
            && min > max
        {
            return Err(self.error(
                ExpressionErrorKind::InvalidQuantifierBounds,
                format!("quantifier {{{},{}}} has min greater than max", min, max),
                open,
            ));
        }
        Ok(Quantifier::new(min, max))
    }

    fn parse_bound(&mut self, open: usize) -> RegexResult<Option<usize>> {
        let mut value: Option<usize> = None;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            self.pos += 1;
            let next = value.unwrap_or(0) * 10 + d as usize;
            if next > MAX_REPEAT {
                return Err(self.error(
                    ExpressionErrorKind::InvalidQuantifierBounds,
                    format!("repetition count exceeds {}", MAX_REPEAT),
                    open,
                ));
            }
            value = Some(next);
        }
        Ok(value)
    }

    fn parse_atom(&mut self) -> RegexResult<Node> {
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Err(self.error(
                ExpressionErrorKind::DanglingOperator,
                "expected an expression",
                start,
            ));
        };
        let kind = match c {
            '(' => return self.parse_group(start),
            '[' => NodeKind::Set(self.parse_set(start)?),
            '\\' => return self.parse_escape(start),
            '~' => return self.parse_not(start),
            '.' => NodeKind::Class {
                class: PredefinedClass::Any,
                negated: false,
            },
            '^' => NodeKind::Anchor(Anchor::LineStart),
            '$' => NodeKind::Anchor(Anchor::LineEnd),
            '*' | '+' | '?' | '{' => {
                return Err(self.error(
                    ExpressionErrorKind::DanglingOperator,
                    format!("quantifier '{}' has nothing to repeat", c),
                    start,
                ));
            }
            c => NodeKind::Literal(Box::new([c])),
        };
        Ok(Node::new(kind))
    }

    fn parse_not(&mut self, start: usize) -> RegexResult<Node> {
        if matches!(self.peek(), None | Some('|' | ')')) {
            return Err(self.error(
                ExpressionErrorKind::DanglingOperator,
                "'~' has no operand",
                start,
            ));
        }
        self.enter(start)?;
        let operand = self.parse_quantified()?;
        self.depth -= 1;
        let id = self.push(operand);
        Ok(Node::new(NodeKind::Not(id)))
    }

    fn parse_group(&mut self, start: usize) -> RegexResult<Node> {
        self.enter(start)?;
        let capture = if self.peek() == Some('?') {
            self.pos += 1;
            match self.bump() {
                Some(':') => None,
                Some('<') => Some(self.open_named_group(start)?),
                Some('P') if self.peek() == Some('<') => {
                    self.pos += 1;
                    Some(self.open_named_group(start)?)
                }
                _ => {
                    return Err(self.error(
                        ExpressionErrorKind::InvalidGroup,
                        "unknown group syntax after '(?'",
                        start,
                    ));
                }
            }
        } else {
            Some(self.open_group(None))
        };

        let head = self.parse_alternation()?;
        if self.peek() != Some(')') {
            return Err(InvalidExpression::new(
                ExpressionErrorKind::UnterminatedGroup,
                "missing ')' to close group",
                SourceRange::at(start),
            ));
        }
        self.pos += 1;
        self.depth -= 1;
        if let Some(index) = capture {
            self.open_groups.retain(|&open| open != index);
        }

        let mut node = Node::new(NodeKind::Group {
            head,
            capturing: capture.is_some(),
        });
        node.capture = capture;
        node.anchored = head.is_some_and(|h| self.nodes[h.index()].anchored);
        Ok(node)
    }

    fn open_group(&mut self, name: Option<SmolStr>) -> usize {
        self.group_count += 1;
        let index = self.group_count;
        self.open_groups.push(index);
        if let Some(name) = name {
            self.names.insert(name, index);
        }
        index
    }

    fn parse_name(&mut self, start: usize) -> RegexResult<SmolStr> {
        let name_start = self.pos;
        while let Some(c) = self.peek() {
            if c == '>' {
                break;
            }
            if !(c.is_alphanumeric() || c == '_') {
                self.pos += 1;
                return Err(self.error(
                    ExpressionErrorKind::InvalidGroup,
                    format!("invalid character '{}' in group name", c),
                    start,
                ));
            }
            self.pos += 1;
        }
        if self.peek() != Some('>') {
            return Err(self.error(
                ExpressionErrorKind::InvalidGroup,
                "unterminated group name",
                start,
            ));
        }
        let name: SmolStr = self.chars[name_start..self.pos].iter().copied().collect();
        self.pos += 1;
        if name.is_empty() {
            return Err(self.error(ExpressionErrorKind::InvalidGroup, "empty group name", start));
        }
        Ok(name)
    }

    fn open_named_group(&mut self, start: usize) -> RegexResult<usize> {
        let name = self.parse_name(start)?;
        if self.names.contains_key(&name) {
            return Err(self.error(
                ExpressionErrorKind::DuplicateGroupName,
                format!("group name '{}' is already defined", name),
                start,
            ));
        }
        Ok(self.open_group(Some(name)))
    }

    fn parse_escape(&mut self, start: usize) -> RegexResult<Node> {
        let Some(c) = self.bump() else {
            return Err(self.error(
                ExpressionErrorKind::InvalidEscape,
                "pattern ends with '\\'",
                start,
            ));
        };
        if let Some((class, negated)) = PredefinedClass::from_escape(c) {
            return Ok(Node::new(NodeKind::Class { class, negated }));
        }
        let kind = match c {
            'A' => NodeKind::Anchor(Anchor::InputStart),
            'z' | 'Z' => NodeKind::Anchor(Anchor::InputEnd),
            'b' => NodeKind::Anchor(Anchor::WordBoundary),
            'B' => NodeKind::Anchor(Anchor::NotWordBoundary),
            '<' => NodeKind::Anchor(Anchor::WordStart),
            '>' => NodeKind::Anchor(Anchor::WordEnd),
            '1'..='9' => NodeKind::Backref(self.parse_backref_index(start, c)?),
            'k' => NodeKind::Backref(self.parse_named_backref(start)?),
            c => match control_escape(c) {
                Some(ch) => NodeKind::Literal(Box::new([ch])),
                None if !c.is_alphanumeric() => NodeKind::Literal(Box::new([c])),
                None => {
                    return Err(self.error(
                        ExpressionErrorKind::InvalidEscape,
                        format!("unknown escape '\\{}'", c),
                        start,
                    ));
                }
            },
        };
        Ok(Node::new(kind))
    }

    fn parse_backref_index(&mut self, start: usize, first: char) -> RegexResult<usize> {
        let mut index = first.to_digit(10).unwrap_or(0) as usize;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            self.pos += 1;
            index = index * 10 + d as usize;
            if index > MAX_CAPTURES {
                break;
            }
        }
        self.check_backref(start, index, &format!("\\{}", index))
    }

    fn parse_named_backref(&mut self, start: usize) -> RegexResult<usize> {
        if self.bump() != Some('<') {
            return Err(self.error(
                ExpressionErrorKind::InvalidBackreference,
                "expected '<' after '\\k'",
                start,
            ));
        }
        let name = self.parse_name(start)?;
        let Some(&index) = self.names.get(&name) else {
            return Err(self.error(
                ExpressionErrorKind::InvalidBackreference,
                format!("backreference to undefined group '{}'", name),
                start,
            ));
        };
        self.check_backref(start, index, &name)
    }

    fn check_backref(&self, start: usize, index: usize, label: &str) -> RegexResult<usize> {
        if index == 0 || index > self.group_count {
            return Err(self.error(
                ExpressionErrorKind::InvalidBackreference,
                format!("backreference {} refers to a group that does not exist", label),
                start,
            ));
        }
        if self.open_groups.contains(&index) {
            return Err(self.error(
                ExpressionErrorKind::InvalidBackreference,
                format!("backreference {} refers to a group that is still open", label),
                start,
            ));
        }
        Ok(index)
    }

    fn parse_set(&mut self, start: usize) -> RegexResult<ClassSet> {
        let negated = self.peek() == Some('^');
        if negated {
            self.pos += 1;
        }

        // Handle ']' as first char in set (literal ']')
        let mut items = Vec::new();
        if self.peek() == Some(']') {
            items.push(ClassItem::Char(']'));
            self.pos += 1;
        }

        loop {
            let item_start = self.pos;
            let lo = match self.bump() {
                None => {
                    return Err(InvalidExpression::new(
                        ExpressionErrorKind::UnterminatedClass,
                        "missing ']' to close character class",
                        SourceRange::at(start),
                    ));
                }
                Some(']') => break,
                Some('\\') => match self.parse_set_escape(item_start)? {
                    SetEscape::Char(c) => c,
                    SetEscape::Item(item) => {
                        items.push(item);
                        continue;
                    }
                },
                Some(c) => c,
            };

            // Range: a-z (a '-' before ']' is literal)
            if self.peek() == Some('-') && self.peek_at(1).is_some_and(|c| c != ']') {
                self.pos += 1;
                let hi_start = self.pos;
                let hi = match self.bump() {
                    Some('\\') => match self.parse_set_escape(hi_start)? {
                        SetEscape::Char(c) => c,
                        SetEscape::Item(_) => {
                            return Err(self.error(
                                ExpressionErrorKind::InvalidRange,
                                "a class escape cannot end a range",
                                item_start,
                            ));
                        }
                    },
                    Some(c) => c,
                    None => break,
                };
                if lo > hi {
                    return Err(self.error(
                        ExpressionErrorKind::InvalidRange,
                        format!("range {}-{} is out of order", lo, hi),
                        item_start,
                    ));
                }
                items.push(ClassItem::Range(lo, hi));
            } else {
                items.push(ClassItem::Char(lo));
            }
        }

        Ok(ClassSet { items, negated })
    }

    fn parse_set_escape(&mut self, start: usize) -> RegexResult<SetEscape> {
        let Some(c) = self.bump() else {
            return Err(InvalidExpression::new(
                ExpressionErrorKind::UnterminatedClass,
                "missing ']' to close character class",
                SourceRange::at(start),
            ));
        };
        if let Some((class, negated)) = PredefinedClass::from_escape(c) {
            let item = if negated {
                ClassItem::InvertedClass(class)
            } else {
                ClassItem::Class(class)
            };
            return Ok(SetEscape::Item(item));
        }
        match control_escape(c) {
            Some(ch) => Ok(SetEscape::Char(ch)),
            None if !c.is_alphanumeric() => Ok(SetEscape::Char(c)),
            None => Err(self.error(
                ExpressionErrorKind::InvalidEscape,
                format!("unknown escape '\\{}' in character class", c),
                start,
            )),
        }
    }
}
