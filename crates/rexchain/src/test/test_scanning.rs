// Tests for the str helpers: find, find_at, find_iter, byte offsets
use crate::*;

fn ranges(pattern: &str, text: &str) -> Vec<(usize, usize)> {
    Regex::new(pattern)
        .unwrap()
        .find_iter(text)
        .iter()
        .map(|m| (m.start(), m.end()))
        .collect()
}

#[test]
fn test_find_iter_non_overlapping() {
    assert_eq!(ranges(r"\d+", "a1b22c333"), vec![(1, 2), (3, 5), (6, 9)]);
    assert_eq!(ranges("aa", "aaaaa"), vec![(0, 2), (2, 4)]);
    assert!(ranges("z", "abc").is_empty());
}

#[test]
fn test_find_iter_empty_matches() {
    // an empty match right after a non-empty one is skipped
    assert_eq!(ranges("a*", "baaa"), vec![(0, 0), (1, 4)]);
    assert_eq!(ranges("a*", "aab"), vec![(0, 2), (3, 3)]);
    assert_eq!(ranges("x?", ""), vec![(0, 0)]);
    assert_eq!(ranges("", "ab"), vec![(0, 0), (1, 1), (2, 2)]);
}

#[test]
fn test_find_at() {
    let re = Regex::new("ab").unwrap();
    let text = "ab ab";
    assert_eq!(re.find_at(text, 0).map(|m| m.start()), Some(0));
    assert_eq!(re.find_at(text, 1).map(|m| m.start()), Some(3));
    assert!(re.find_at(text, 4).is_none());
    assert!(re.find_at(text, 99).is_none());
}

#[test]
fn test_match_str_is_prefix_only() {
    let re = Regex::new("b+").unwrap();
    assert!(re.match_str("abb").is_none());
    assert_eq!(re.match_str("bba").map(|m| m.range()), Some(0..2));
}

#[test]
fn test_byte_offsets_with_multibyte_text() {
    let re = Regex::new(r"\w+").unwrap();
    let text = "¡hola señor!";
    let words: Vec<&str> = re.find_iter(text).iter().map(|m| m.as_str(text)).collect();
    assert_eq!(words, vec!["hola", "señor"]);

    let re = Regex::new("ñ").unwrap();
    let m = re.find(text).unwrap();
    assert_eq!(&text[m.range()], "ñ");
    // a byte offset inside a char starts from the next char
    let from = text.find('ñ').unwrap() + 1;
    assert!(re.find_at(text, from).is_none());
}

#[test]
fn test_captures_in_byte_offsets() {
    let re = Regex::new(r"(\w+)@(\w+)").unwrap();
    let text = "→ joe@host";
    let m = re.find(text).unwrap();
    assert_eq!(m.group_str(text, 1), Some("joe"));
    assert_eq!(m.group_str(text, 2), Some("host"));
    let spans: Vec<Option<Span>> = m.captures().iter().copied().collect();
    assert_eq!(spans.len(), 3);
    assert_eq!(spans[0], Some(m.span()));
}
