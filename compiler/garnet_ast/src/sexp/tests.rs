#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use super::*;

#[test]
fn reads_nested_nodes() {
    let node = read("(lvasgn :x\n  (send\n    (int 1) :+\n    (int -2)))").unwrap();
    assert_eq!(node.kind, NodeKind::Lvasgn);
    assert_eq!(node.expect_symbol(0).unwrap(), "x");

    let send = node.expect_node(1).unwrap();
    assert_eq!(send.kind, NodeKind::Send);
    assert_eq!(send.expect_symbol(1).unwrap(), "+");
    assert_eq!(send.expect_node(2).unwrap().expect_int(0).unwrap(), -2);
    assert_eq!(send.span, Span::new(13, 47));
}

#[test]
fn bare_nil_is_an_absent_child() {
    let node = read("(class (const nil :Foo) nil (nil))").unwrap();
    assert!(node.children[1].is_nil());
    assert_eq!(node.expect_node(2).unwrap().kind, NodeKind::Nil);
}

#[test]
fn symbols_in_both_spellings() {
    let node = read(r#"(send nil :result (sym :"self.fib") (sym :[]=) (sym :zero?))"#).unwrap();
    let syms: Vec<&str> = node.nodes().filter_map(SyntaxNode::sym_value).collect();
    assert_eq!(syms, vec!["self.fib", "[]=", "zero?"]);
}

#[test]
fn string_escapes() {
    let node = read(r#"(str "a\"b\\c\n\x01é")"#).unwrap();
    assert_eq!(node.expect_str(0).unwrap(), b"a\"b\\c\n\x01\xc3\xa9");
}

#[test]
fn floats_are_payloads() {
    let node = read("(float 1.5e3)").unwrap();
    assert_eq!(node.children, vec![Child::Float(1500.0)]);
}

#[test]
fn several_forms_are_wrapped() {
    let node = read("(int 1) (int 2)").unwrap();
    assert_eq!(node.kind, NodeKind::Begin);
    assert_eq!(node.len(), 2);
    assert_eq!(node.span, Span::new(0, 15));

    let empty = read("  \n").unwrap();
    assert_eq!(empty.kind, NodeKind::Begin);
    assert!(empty.is_empty());
}

#[test]
fn hyphenated_tags_are_normalized() {
    let node = read("(op-asgn (lvasgn :a) :+ (int 1))").unwrap();
    assert_eq!(node.kind, NodeKind::OpAsgn);
}

#[test]
fn errors_carry_spans() {
    let err = read("(int 1").unwrap_err();
    assert_eq!(err.kind, SexpErrorKind::Unclosed);
    assert_eq!(err.span, Span::new(0, 1));

    let err = read("(int 1))").unwrap_err();
    assert_eq!(err.kind, SexpErrorKind::UnexpectedClose);
    assert_eq!(err.span, Span::new(7, 8));

    let err = read("((int 1))").unwrap_err();
    assert_eq!(err.kind, SexpErrorKind::MissingTag);

    let err = read(":x").unwrap_err();
    assert_eq!(err.kind, SexpErrorKind::TopLevelAtom);

    let err = read("(int 99999999999999999999)").unwrap_err();
    assert_eq!(err.kind, SexpErrorKind::IntOutOfRange);

    let err = read(r#"(str "\q")"#).unwrap_err();
    assert_eq!(err.kind, SexpErrorKind::BadEscape);
}

#[test]
fn error_converts_to_diagnostic() {
    let diag: Diagnostic = read("(send nil foo)").unwrap_err().into();
    assert_eq!(diag.code, ErrorCode::E5003);
    assert_eq!(diag.message, "cannot read AST dump: unexpected bare word `foo`");
}
