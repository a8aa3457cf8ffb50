// Character classification for patterns
// Handles \d, \w, \s, \p, \u, \l and their uppercase inverses, `.`
// Also handles [set] matching

use std::fmt;

/// Character classification and case folding supplied by the caller.
///
/// Every method has a default based on the `char` methods of the standard
/// library; a host with its own tables overrides only what differs.
pub trait Classifier {
    #[inline]
    fn is_word(&self, c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    #[inline]
    fn is_digit(&self, c: char) -> bool {
        c.is_ascii_digit()
    }

    #[inline]
    fn is_space(&self, c: char) -> bool {
        c.is_whitespace()
    }

    #[inline]
    fn is_punct(&self, c: char) -> bool {
        c.is_ascii_punctuation()
    }

    #[inline]
    fn is_upper(&self, c: char) -> bool {
        c.is_uppercase()
    }

    #[inline]
    fn is_lower(&self, c: char) -> bool {
        c.is_lowercase()
    }

    /// Canonical case used when comparing under the `i` flag.
    #[inline]
    fn fold_case(&self, c: char) -> char {
        c.to_lowercase().next().unwrap_or(c)
    }

    /// Opposite-case partner, consulted for ranges under the `i` flag.
    #[inline]
    fn upper_case(&self, c: char) -> char {
        c.to_uppercase().next().unwrap_or(c)
    }
}

/// `Classifier` backed entirely by the trait defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl Classifier for DefaultClassifier {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredefinedClass {
    Digit, // \d
    Word,  // \w
    Space, // \s
    Punct, // \p
    Upper, // \u
    Lower, // \l
    Any,   // .
}

impl PredefinedClass {
    /// Class named by an escape letter, with whether the letter inverts it.
    pub fn from_escape(letter: char) -> Option<(PredefinedClass, bool)> {
        let class = match letter.to_ascii_lowercase() {
            'd' => PredefinedClass::Digit,
            'w' => PredefinedClass::Word,
            's' => PredefinedClass::Space,
            'p' => PredefinedClass::Punct,
            'u' => PredefinedClass::Upper,
            'l' => PredefinedClass::Lower,
            _ => return None,
        };
        Some((class, letter.is_ascii_uppercase()))
    }

    pub fn escape_letter(&self) -> char {
        match self {
            PredefinedClass::Digit => 'd',
            PredefinedClass::Word => 'w',
            PredefinedClass::Space => 's',
            PredefinedClass::Punct => 'p',
            PredefinedClass::Upper => 'u',
            PredefinedClass::Lower => 'l',
            PredefinedClass::Any => '.',
        }
    }

    /// `multiline` only affects `Any`, which then refuses `\n`.
    #[inline]
    pub fn matches<K: Classifier + ?Sized>(&self, c: char, classifier: &K, multiline: bool) -> bool {
        match self {
            PredefinedClass::Digit => classifier.is_digit(c),
            PredefinedClass::Word => classifier.is_word(c),
            PredefinedClass::Space => classifier.is_space(c),
            PredefinedClass::Punct => classifier.is_punct(c),
            PredefinedClass::Upper => classifier.is_upper(c),
            PredefinedClass::Lower => classifier.is_lower(c),
            PredefinedClass::Any => !(multiline && c == '\n'),
        }
    }
}

/// An item inside a character set [...]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassItem {
    Char(char),
    Range(char, char),
    Class(PredefinedClass),
    InvertedClass(PredefinedClass),
}

impl ClassItem {
    #[inline]
    fn matches<K: Classifier + ?Sized>(&self, c: char, classifier: &K) -> bool {
        match self {
            ClassItem::Char(ch) => c == *ch,
            ClassItem::Range(start, end) => c >= *start && c <= *end,
            ClassItem::Class(class) => class.matches(c, classifier, false),
            ClassItem::InvertedClass(class) => !class.matches(c, classifier, false),
        }
    }
}

/// A bracketed character set such as `[a-z_]` or `[^\d]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassSet {
    pub items: Vec<ClassItem>,
    pub negated: bool,
}

impl ClassSet {
    pub fn matches<K: Classifier + ?Sized>(&self, c: char, classifier: &K, case_insensitive: bool) -> bool {
        let mut matched = self.items.iter().any(|item| item.matches(c, classifier));
        if !matched && case_insensitive {
            let lower = classifier.fold_case(c);
            let upper = classifier.upper_case(c);
            matched = self
                .items
                .iter()
                .any(|item| item.matches(lower, classifier) || item.matches(upper, classifier));
        }
        if self.negated { !matched } else { matched }
    }
}

impl fmt::Display for ClassSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        if self.negated {
            f.write_str("^")?;
        }
        for item in &self.items {
            match item {
                ClassItem::Char(c) => write!(f, "{}", c.escape_debug())?,
                ClassItem::Range(a, b) => write!(f, "{}-{}", a.escape_debug(), b.escape_debug())?,
                ClassItem::Class(class) => write!(f, "\\{}", class.escape_letter())?,
                ClassItem::InvertedClass(class) => {
                    write!(f, "\\{}", class.escape_letter().to_ascii_uppercase())?
                }
            }
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: Vec<ClassItem>, negated: bool) -> ClassSet {
        ClassSet { items, negated }
    }

    #[test]
    fn test_predefined_classes() {
        let k = DefaultClassifier;
        assert!(PredefinedClass::Digit.matches('5', &k, false));
        assert!(!PredefinedClass::Digit.matches('x', &k, false));
        assert!(PredefinedClass::Word.matches('_', &k, false));
        assert!(PredefinedClass::Word.matches('é', &k, false));
        assert!(!PredefinedClass::Word.matches('-', &k, false));
        assert!(PredefinedClass::Space.matches('\t', &k, false));
        assert!(PredefinedClass::Punct.matches('!', &k, false));
        assert!(PredefinedClass::Upper.matches('Q', &k, false));
        assert!(PredefinedClass::Lower.matches('q', &k, false));
    }

    #[test]
    fn test_any_respects_multiline() {
        let k = DefaultClassifier;
        assert!(PredefinedClass::Any.matches('\n', &k, false));
        assert!(!PredefinedClass::Any.matches('\n', &k, true));
        assert!(PredefinedClass::Any.matches('x', &k, true));
    }

    #[test]
    fn test_from_escape() {
        assert_eq!(
            PredefinedClass::from_escape('d'),
            Some((PredefinedClass::Digit, false))
        );
        assert_eq!(
            PredefinedClass::from_escape('W'),
            Some((PredefinedClass::Word, true))
        );
        assert_eq!(PredefinedClass::from_escape('q'), None);
    }

    #[test]
    fn test_set_range_and_negation() {
        let k = DefaultClassifier;
        let s = set(vec![ClassItem::Range('a', 'z')], false);
        assert!(s.matches('m', &k, false));
        assert!(!s.matches('M', &k, false));
        let n = set(vec![ClassItem::Range('a', 'z')], true);
        assert!(!n.matches('m', &k, false));
        assert!(n.matches('M', &k, false));
    }

    #[test]
    fn test_set_case_insensitive() {
        let k = DefaultClassifier;
        let s = set(vec![ClassItem::Range('A', 'Z')], false);
        assert!(s.matches('q', &k, true));
        let t = set(vec![ClassItem::Char('x')], false);
        assert!(t.matches('X', &k, true));
        assert!(!t.matches('X', &k, false));
    }

    #[test]
    fn test_set_with_class() {
        let k = DefaultClassifier;
        let s = set(
            vec![ClassItem::Class(PredefinedClass::Digit), ClassItem::Char('_')],
            false,
        );
        assert!(s.matches('5', &k, false));
        assert!(s.matches('_', &k, false));
        assert!(!s.matches('a', &k, false));
        assert_eq!(s.to_string(), "[\\d_]");
    }

    #[test]
    fn test_custom_classifier() {
        struct DashWords;
        impl Classifier for DashWords {
            fn is_word(&self, c: char) -> bool {
                c.is_alphanumeric() || c == '-'
            }
        }
        assert!(PredefinedClass::Word.matches('-', &DashWords, false));
        assert!(!PredefinedClass::Word.matches('_', &DashWords, false));
    }
}
