// Input traversal seen by the matcher.
//
// The engine never owns the text; it walks whatever the caller hands it
// through this trait and clones the cursor at every choice point, so
// implementations should be small and cheap to copy.

/// Bidirectional position over a character sequence.
pub trait Cursor: Clone {
    /// Absolute position, comparable between clones of the same cursor.
    fn position(&self) -> usize;

    /// Number of characters between the position and the end of input.
    fn remaining(&self) -> usize;

    /// Character at the position, `None` at the end of input.
    fn current(&self) -> Option<char>;

    /// Character just before the position, `None` at the start of input.
    fn previous(&self) -> Option<char>;

    /// Step forward one character. Returns `false` at the end of input.
    fn advance(&mut self) -> bool;

    /// Step back one character. Returns `false` at the start of input.
    fn retreat(&mut self) -> bool;

    #[inline]
    fn is_at_start(&self) -> bool {
        self.previous().is_none()
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.current().is_none()
    }
}

/// Cursor over a decoded `[char]` slice; positions are char indices.
#[derive(Debug, Clone, Copy)]
pub struct CharCursor<'a> {
    text: &'a [char],
    pos: usize,
}

impl<'a> CharCursor<'a> {
    pub fn new(text: &'a [char]) -> Self {
        CharCursor { text, pos: 0 }
    }

    /// Cursor placed at `pos`, clamped to the end of `text`.
    pub fn at(text: &'a [char], pos: usize) -> Self {
        CharCursor {
            text,
            pos: pos.min(text.len()),
        }
    }

    pub fn text(&self) -> &'a [char] {
        self.text
    }
}

impl Cursor for CharCursor<'_> {
    #[inline(always)]
    fn position(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    fn remaining(&self) -> usize {
        self.text.len() - self.pos
    }

    #[inline(always)]
    fn current(&self) -> Option<char> {
        self.text.get(self.pos).copied()
    }

    #[inline(always)]
    fn previous(&self) -> Option<char> {
        if self.pos == 0 {
            None
        } else {
            self.text.get(self.pos - 1).copied()
        }
    }

    #[inline(always)]
    fn advance(&mut self) -> bool {
        if self.pos < self.text.len() {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn retreat(&mut self) -> bool {
        if self.pos > 0 {
            self.pos -= 1;
            true
        } else {
            false
        }
    }
}
