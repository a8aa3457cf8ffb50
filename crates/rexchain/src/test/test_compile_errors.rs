// Tests for pattern compilation errors
use crate::*;

fn compile_error(source: &str) -> InvalidExpression {
    match Regex::new(source) {
        Ok(re) => panic!("{:?} should not compile", re),
        Err(err) => err,
    }
}

fn kind(source: &str) -> ExpressionErrorKind {
    compile_error(source).kind
}

#[test]
fn test_unterminated_constructs() {
    let err = compile_error("[abc");
    assert_eq!(err.kind, ExpressionErrorKind::UnterminatedClass);
    assert_eq!(err.range.start_offset, 0);

    let err = compile_error("x(abc");
    assert_eq!(err.kind, ExpressionErrorKind::UnterminatedGroup);
    assert_eq!(err.range.start_offset, 1);

    let err = compile_error("abc)");
    assert_eq!(err.kind, ExpressionErrorKind::UnmatchedParen);
    assert_eq!(err.range.start_offset, 3);
}

#[test]
fn test_quantifier_errors() {
    let err = compile_error("a{3,1}");
    assert_eq!(err.kind, ExpressionErrorKind::InvalidQuantifierBounds);
    assert_eq!(err.range.start_offset, 1);

    assert_eq!(kind("*a"), ExpressionErrorKind::DanglingOperator);
    assert_eq!(kind("a|+"), ExpressionErrorKind::DanglingOperator);
    assert_eq!(kind("^*"), ExpressionErrorKind::DanglingOperator);
    assert_eq!(kind(r"\b+"), ExpressionErrorKind::DanglingOperator);
    assert_eq!(kind("a{2"), ExpressionErrorKind::MalformedQuantifier);
    assert_eq!(kind("a{x}"), ExpressionErrorKind::MalformedQuantifier);
    assert_eq!(kind("a{,}"), ExpressionErrorKind::MalformedQuantifier);
    assert_eq!(kind("a{}"), ExpressionErrorKind::MalformedQuantifier);
    assert_eq!(kind("a{100001}"), ExpressionErrorKind::InvalidQuantifierBounds);

    let err = compile_error("a**");
    assert_eq!(err.kind, ExpressionErrorKind::DanglingOperator);
    assert_eq!(err.range.start_offset, 2);
}

#[test]
fn test_backreference_errors() {
    let err = compile_error(r"(a)\2");
    assert_eq!(err.kind, ExpressionErrorKind::InvalidBackreference);
    assert_eq!(err.range.start_offset, 3);

    // the group is still open at the reference
    assert_eq!(kind(r"(a\1)"), ExpressionErrorKind::InvalidBackreference);
    assert_eq!(kind(r"\1(a)"), ExpressionErrorKind::InvalidBackreference);
    assert_eq!(kind(r"(a)\k<nope>"), ExpressionErrorKind::InvalidBackreference);
    assert_eq!(kind(r"(a)\k1"), ExpressionErrorKind::InvalidBackreference);
}

#[test]
fn test_escape_and_set_errors() {
    assert_eq!(kind(r"\q"), ExpressionErrorKind::InvalidEscape);
    assert_eq!(kind("ab\\"), ExpressionErrorKind::InvalidEscape);
    assert_eq!(kind(r"[\q]"), ExpressionErrorKind::InvalidEscape);
    assert_eq!(kind("[z-a]"), ExpressionErrorKind::InvalidRange);
    assert_eq!(kind(r"[a-\d]"), ExpressionErrorKind::InvalidRange);
}

#[test]
fn test_group_errors() {
    assert_eq!(kind("(?x)"), ExpressionErrorKind::InvalidGroup);
    assert_eq!(kind("(?<>a)"), ExpressionErrorKind::InvalidGroup);
    assert_eq!(kind("(?<a-b>x)"), ExpressionErrorKind::InvalidGroup);
    assert_eq!(kind("(?<n>a)(?<n>b)"), ExpressionErrorKind::DuplicateGroupName);
}

#[test]
fn test_negation_without_operand() {
    assert_eq!(kind("~"), ExpressionErrorKind::DanglingOperator);
    assert_eq!(kind("a~|b"), ExpressionErrorKind::DanglingOperator);
    assert_eq!(kind("(~)"), ExpressionErrorKind::DanglingOperator);
}

#[test]
fn test_flag_errors() {
    let err = compile_error("/a/iq");
    assert_eq!(err.kind, ExpressionErrorKind::InvalidFlag);
    assert_eq!(err.range.start_offset, 4);
    // a non-letter suffix makes the whole source a bare pattern
    assert!(Regex::new("/a/1").is_ok());
}

#[test]
fn test_nesting_limit() {
    let depth = limits::MAX_NESTING_DEPTH;
    let ok = format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
    assert!(Regex::new(&ok).is_ok());
    let deep = format!("{}a{}", "(".repeat(depth + 1), ")".repeat(depth + 1));
    assert_eq!(kind(&deep), ExpressionErrorKind::NestingTooDeep);
    let negations = format!("{}a", "~".repeat(depth + 1));
    assert_eq!(kind(&negations), ExpressionErrorKind::NestingTooDeep);
}

#[test]
fn test_error_display() {
    let err = compile_error("a{3,1}");
    assert_eq!(
        err.to_string(),
        "invalid expression at offsets 1..6: quantifier {3,1} has min greater than max"
    );
    let err = compile_error("[abc");
    assert_eq!(
        err.to_string(),
        "invalid expression at offset 0: missing ']' to close character class"
    );
    let as_error: &dyn std::error::Error = &err;
    assert!(as_error.source().is_none());
}
