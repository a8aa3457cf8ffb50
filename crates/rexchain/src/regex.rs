// Public matching API
// Compiles through parser + optimizer and matches through the engine.
// `match_at` works on any cursor and classifier; the str helpers scan a
// `&str` with `CharCursor` and report byte offsets.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use log::trace;

use crate::class::{Classifier, DefaultClassifier};
use crate::cursor::{CharCursor, Cursor};
use crate::dump;
use crate::engine::MatchState;
use crate::error::RegexResult;
use crate::flags::Flags;
use crate::node::Graph;
use crate::optimize::optimize;
use crate::parser;

/// Half-open range of positions `[start, end)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Capture spans of one match. Index 0 is the whole match, groups start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures {
    spans: Vec<Option<Span>>,
}

impl Captures {
    /// `None` for a group that did not participate or an out-of-range index.
    pub fn get(&self, index: usize) -> Option<Span> {
        self.spans.get(index).copied().flatten()
    }

    /// Number of slots, including the whole match.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Option<Span>> {
        self.spans.iter()
    }
}

impl<'a> IntoIterator for &'a Captures {
    type Item = &'a Option<Span>;
    type IntoIter = std::slice::Iter<'a, Option<Span>>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    captures: Captures,
}

impl Match {
    fn new(span: Span, groups: impl IntoIterator<Item = Option<Span>>) -> Self {
        let mut spans = vec![Some(span)];
        spans.extend(groups);
        Match {
            captures: Captures { spans },
        }
    }

    pub fn span(&self) -> Span {
        self.captures.get(0).unwrap_or_default()
    }

    pub fn start(&self) -> usize {
        self.span().start
    }

    pub fn end(&self) -> usize {
        self.span().end
    }

    pub fn range(&self) -> Range<usize> {
        self.span().range()
    }

    pub fn is_empty(&self) -> bool {
        self.span().is_empty()
    }

    /// Span of group `index` (1-based); 0 is the whole match.
    pub fn group(&self, index: usize) -> Option<Span> {
        self.captures.get(index)
    }

    pub fn captures(&self) -> &Captures {
        &self.captures
    }

    /// Matched text, for matches produced by the str helpers.
    pub fn as_str<'t>(&self, haystack: &'t str) -> &'t str {
        haystack.get(self.range()).unwrap_or_default()
    }

    /// Text of group `index`, for matches produced by the str helpers.
    pub fn group_str<'t>(&self, haystack: &'t str, index: usize) -> Option<&'t str> {
        self.group(index).and_then(|span| haystack.get(span.range()))
    }
}

/// Char index to byte offset: identity for ASCII text, a table otherwise.
enum ByteMap {
    Ascii,
    Map(Vec<usize>),
}

impl ByteMap {
    fn new(text: &str) -> Self {
        if text.is_ascii() {
            return ByteMap::Ascii;
        }
        let mut map: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        map.push(text.len());
        ByteMap::Map(map)
    }

    #[inline(always)]
    fn get(&self, i: usize) -> usize {
        match self {
            ByteMap::Ascii => i,
            ByteMap::Map(m) => m[i],
        }
    }

    /// Char index of the first char starting at or after `byte`.
    fn char_index(&self, byte: usize) -> usize {
        match self {
            ByteMap::Ascii => byte,
            ByteMap::Map(m) => m.partition_point(|&b| b < byte),
        }
    }
}

/// Decoded haystack shared by the str helpers.
struct Haystack {
    chars: Vec<char>,
    bytes: ByteMap,
}

impl Haystack {
    fn new(text: &str) -> Self {
        Haystack {
            chars: text.chars().collect(),
            bytes: ByteMap::new(text),
        }
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.bytes.get(start), self.bytes.get(end))
    }
}

/// Char-level result of one scan.
struct RawMatch {
    start: usize,
    end: usize,
    groups: Vec<Option<Span>>,
}

/// A compiled pattern. Cloning shares the graph.
#[derive(Clone)]
pub struct Regex {
    graph: Arc<Graph>,
}

impl Regex {
    /// Compile `source`, either a bare pattern or `/pattern/flags`.
    pub fn new(source: &str) -> RegexResult<Regex> {
        RegexBuilder::new(source).build()
    }

    pub fn builder(source: &str) -> RegexBuilder {
        RegexBuilder::new(source)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The source text as given, delimiters and flags included.
    pub fn as_str(&self) -> &str {
        &self.graph.source
    }

    /// The pattern body without delimiters.
    pub fn pattern(&self) -> &str {
        let (start, end) = self.graph.pattern_range;
        &self.graph.source[start..end]
    }

    /// The flag suffix as written, empty for a bare pattern.
    pub fn flags_str(&self) -> &str {
        let (start, end) = self.graph.flags_range;
        &self.graph.source[start..end]
    }

    /// Effective flags: the suffix merged with builder settings.
    pub fn flags(&self) -> Flags {
        self.graph.flags()
    }

    pub fn capture_count(&self) -> usize {
        self.graph.capture_count()
    }

    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.graph.names.get(name).copied()
    }

    /// Named groups ordered by group index.
    pub fn capture_names(&self) -> Vec<(&str, usize)> {
        let mut names: Vec<(&str, usize)> = self
            .graph
            .names
            .iter()
            .map(|(name, &index)| (name.as_str(), index))
            .collect();
        names.sort_by_key(|&(_, index)| index);
        names
    }

    pub fn is_anchored(&self) -> bool {
        self.graph.is_anchored()
    }

    /// Indented description of the optimized graph.
    pub fn dump(&self) -> String {
        dump::dump(&self.graph)
    }

    /// Prefix match at the cursor's position only. Spans are cursor positions.
    pub fn match_at<C: Cursor, K: Classifier + ?Sized>(&self, cursor: C, classifier: &K) -> Option<Match> {
        let mut state = MatchState::new(&self.graph, classifier);
        if !state.suffix_matches(&cursor) {
            trace!("fail-fast rejected input for {:?}", self.graph.source);
            return None;
        }
        let start = cursor.position();
        let end = state.run(cursor)?;
        Some(Match::new(Span::new(start, end.position()), state.spans()))
    }

    /// Prefix match at the start of `text`; byte offsets.
    pub fn match_str(&self, text: &str) -> Option<Match> {
        let hay = Haystack::new(text);
        let mut state = MatchState::new(&self.graph, &DefaultClassifier);
        let cursor = CharCursor::new(&hay.chars);
        if !state.suffix_matches(&cursor) {
            trace!("fail-fast rejected input for {:?}", self.graph.source);
            return None;
        }
        let end = state.run(cursor)?;
        Some(self.to_match(&hay, 0, end.position(), state.spans()))
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Leftmost match anywhere in `text`.
    pub fn find(&self, text: &str) -> Option<Match> {
        self.find_at(text, 0)
    }

    /// Leftmost match starting at or after byte offset `start`.
    pub fn find_at(&self, text: &str, start: usize) -> Option<Match> {
        if start > text.len() {
            return None;
        }
        let hay = Haystack::new(text);
        let mut state = MatchState::new(&self.graph, &DefaultClassifier);
        let from = hay.bytes.char_index(start);
        let raw = self.scan(&hay, from, &mut state)?;
        Some(self.to_match(&hay, raw.start, raw.end, raw.groups))
    }

    /// All successive non-overlapping matches, left to right.
    pub fn find_iter(&self, text: &str) -> Vec<Match> {
        let hay = Haystack::new(text);
        let mut state = MatchState::new(&self.graph, &DefaultClassifier);
        let mut matches = Vec::new();
        let mut pos = 0;
        let mut last_was_nonempty = false;

        while pos <= hay.chars.len() {
            let Some(raw) = self.scan(&hay, pos, &mut state) else {
                break;
            };
            let is_empty = raw.start == raw.end;

            // Skip empty match right after non-empty match
            if is_empty && last_was_nonempty && raw.start == pos {
                pos += 1;
                last_was_nonempty = false;
                continue;
            }

            pos = if is_empty { raw.end + 1 } else { raw.end };
            last_was_nonempty = !is_empty;
            matches.push(self.to_match(&hay, raw.start, raw.end, raw.groups));
        }
        matches
    }

    /// Leftmost match at a char index `>= from`.
    fn scan<'h>(
        &self,
        hay: &'h Haystack,
        from: usize,
        state: &mut MatchState<'_, '_, CharCursor<'h>, DefaultClassifier>,
    ) -> Option<RawMatch> {
        let len = hay.chars.len();
        let min_len = self.graph.min_len();
        if from > len || len - from < min_len {
            return None;
        }
        if !state.suffix_matches(&CharCursor::at(&hay.chars, from)) {
            trace!("fail-fast rejected input for {:?}", self.graph.source);
            return None;
        }

        let last = if self.graph.is_anchored() { 0 } else { len - min_len };
        for pos in from..=last {
            if let Some(end) = state.run(CharCursor::at(&hay.chars, pos)) {
                return Some(RawMatch {
                    start: pos,
                    end: end.position(),
                    groups: state.spans(),
                });
            }
        }
        None
    }

    fn to_match(&self, hay: &Haystack, start: usize, end: usize, groups: Vec<Option<Span>>) -> Match {
        let groups = groups
            .into_iter()
            .map(|span| span.map(|s| hay.span(s.start, s.end)));
        Match::new(hay.span(start, end), groups)
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Regex").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Regex {
    type Err = crate::error::InvalidExpression;

    fn from_str(source: &str) -> RegexResult<Regex> {
        Regex::new(source)
    }
}

/// Compiles a pattern with flags set in code. Builder flags are OR-ed with
/// any `/.../flags` suffix, so a setter can only turn a flag on.
#[derive(Debug, Clone)]
pub struct RegexBuilder {
    source: String,
    flags: Flags,
}

impl RegexBuilder {
    pub fn new(source: &str) -> Self {
        RegexBuilder {
            source: source.to_string(),
            flags: Flags::default(),
        }
    }

    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.flags.case_insensitive = yes;
        self
    }

    pub fn multiline(mut self, yes: bool) -> Self {
        self.flags.multiline = yes;
        self
    }

    pub fn optimize_speed(mut self, yes: bool) -> Self {
        self.flags.optimize_speed = yes;
        self
    }

    pub fn optimize_accuracy(mut self, yes: bool) -> Self {
        self.flags.optimize_accuracy = yes;
        self
    }

    pub fn no_ungroup(mut self, yes: bool) -> Self {
        self.flags.no_ungroup = yes;
        self
    }

    pub fn no_expose(mut self, yes: bool) -> Self {
        self.flags.no_expose = yes;
        self
    }

    pub fn fail_fast(mut self, yes: bool) -> Self {
        self.flags.fail_fast = yes;
        self
    }

    pub fn build(&self) -> RegexResult<Regex> {
        let mut graph = parser::parse(&self.source, self.flags)?;
        optimize(&mut graph);
        Ok(Regex {
            graph: Arc::new(graph),
        })
    }
}
