// Tests for anchors: input, line and word boundaries
use crate::*;

fn find(pattern: &str, text: &str) -> Option<(usize, usize)> {
    Regex::new(pattern)
        .unwrap()
        .find(text)
        .map(|m| (m.start(), m.end()))
}

#[test]
fn test_whole_input_anchors() {
    let re = Regex::new("^abc$").unwrap();
    assert!(re.is_match("abc"));
    assert!(!re.is_match("abcd"));
    assert!(!re.is_match("xabc"));
    assert!(!re.is_match("x\nabc\ny"));
}

#[test]
fn test_multiline_anchors() {
    let re = Regex::new("/^abc$/m").unwrap();
    let text = "x\nabc\ny";
    assert_eq!(re.find(text).map(|m| m.range()), Some(2..5));
    assert!(!re.is_match("x\nabcd\ny"));
    assert_eq!(find("/a$/m", "a\nb"), Some((0, 1)));
    assert_eq!(find("/^b/m", "a\nb"), Some((2, 3)));
}

#[test]
fn test_input_anchors_ignore_multiline() {
    let re = Regex::new(r"/\Aab\z/m").unwrap();
    assert!(re.is_match("ab"));
    assert!(!re.is_match("x\nab"));
    assert!(!re.is_match("ab\n"));
    assert!(Regex::new(r"b\Z").unwrap().is_match("ab"));
}

#[test]
fn test_word_boundaries() {
    assert_eq!(find(r"\bcat\b", "concat cat"), Some((7, 10)));
    assert_eq!(find(r"\Bcat", "cat concat"), Some((7, 10)));
    assert_eq!(find(r"\<\w+", "  word"), Some((2, 6)));
    assert_eq!(find(r"\w+\>", "ab cd"), Some((0, 2)));
    // input edges count as non-word
    assert!(Regex::new(r"^\b").unwrap().is_match("a"));
    assert!(!Regex::new(r"\b").unwrap().is_match(""));
    assert!(Regex::new(r"\B").unwrap().is_match(""));
}

#[test]
fn test_anchored_pattern_only_tries_start() {
    let re = Regex::new("^a").unwrap();
    assert!(re.is_anchored());
    assert!(re.find_at("aa", 1).is_none());
    assert_eq!(re.find_iter("aaa").len(), 1);
}

#[test]
fn test_optional_anchor_does_not_pin() {
    let re = Regex::new("(^a)*b").unwrap();
    assert!(!re.is_anchored());
    assert_eq!(re.find("xb").map(|m| m.range()), Some(1..2));
    assert_eq!(find("(?:^)?a", "ba"), Some((1, 2)));
}

#[test]
fn test_multiline_caret_is_not_anchored() {
    let re = Regex::new("/^b/m").unwrap();
    assert!(!re.is_anchored());
    assert_eq!(re.find_iter("b\nb\nab").len(), 2);
}
