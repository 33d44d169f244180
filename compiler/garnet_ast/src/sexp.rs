//! Reader for the s-expression AST dump.
//!
//! The external parser prints its tree as nested lists:
//!
//! ```text
//! (class
//!   (const nil :Foo) nil
//!   (def :bar
//!     (args
//!       (arg :x))
//!     (send
//!       (lvar :x) :+
//!       (int 1))))
//! ```
//!
//! Each list starts with a tag; its remaining items are child nodes, the
//! bare word `nil` (an absent child), symbols, integers, floats or
//! double-quoted strings.

use std::fmt;

use logos::Logos;

use garnet_diagnostic::{Diagnostic, ErrorCode};
use garnet_ir::Span;

use crate::{Child, NodeKind, SyntaxNode};

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum Token<'s> {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("nil")]
    Nil,

    #[regex(r#":[^ \t\r\n()"]+"#, |lex| &lex.slice()[1..])]
    Symbol(&'s str),

    #[regex(r#":"([^"\\]|\\.)*""#, |lex| { let s = lex.slice(); &s[2..s.len() - 1] })]
    QuotedSymbol(&'s str),

    #[regex(r"-?[0-9]+", |lex| lex.slice(), priority = 3)]
    Int(&'s str),

    #[regex(r"-?[0-9]+\.[0-9]+([eE][-+]?[0-9]+)?", |lex| lex.slice())]
    Float(&'s str),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Str(&'s str),

    #[regex(r"[a-z_][a-z0-9_\-]*", |lex| lex.slice())]
    Tag(&'s str),
}

/// What went wrong while reading a dump.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum SexpErrorKind {
    InvalidToken,
    UnexpectedClose,
    Unclosed,
    MissingTag,
    UnexpectedTag(String),
    TopLevelAtom,
    BadEscape,
    IntOutOfRange,
}

/// A read failure with the byte range it occurred at.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct SexpError {
    pub kind: SexpErrorKind,
    pub span: Span,
}

impl fmt::Display for SexpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SexpErrorKind::InvalidToken => write!(f, "invalid token"),
            SexpErrorKind::UnexpectedClose => write!(f, "unexpected `)`"),
            SexpErrorKind::Unclosed => write!(f, "unclosed `(`"),
            SexpErrorKind::MissingTag => write!(f, "list does not start with a tag"),
            SexpErrorKind::UnexpectedTag(tag) => write!(f, "unexpected bare word `{tag}`"),
            SexpErrorKind::TopLevelAtom => write!(f, "value outside of any list"),
            SexpErrorKind::BadEscape => write!(f, "invalid escape sequence"),
            SexpErrorKind::IntOutOfRange => write!(f, "integer literal out of range"),
        }
    }
}

impl std::error::Error for SexpError {}

impl From<SexpError> for Diagnostic {
    fn from(err: SexpError) -> Self {
        Diagnostic::error(ErrorCode::E5003)
            .with_message(format!("cannot read AST dump: {err}"))
            .with_label(err.span, err.to_string())
    }
}

struct Frame {
    kind: Option<NodeKind>,
    start: usize,
    children: Vec<Child>,
}

/// Read a whole dump.
///
/// An empty dump yields an empty `begin`; several top-level forms are
/// wrapped in one.
pub fn read(text: &str) -> Result<SyntaxNode, SexpError> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut top: Vec<SyntaxNode> = Vec::new();

    for (token, range) in Token::lexer(text).spanned() {
        let span = Span::from_range(range.clone());
        let err = |kind| SexpError { kind, span };
        let token = token.map_err(|()| err(SexpErrorKind::InvalidToken))?;

        let atom = match token {
            Token::LParen => {
                stack.push(Frame {
                    kind: None,
                    start: range.start,
                    children: Vec::new(),
                });
                continue;
            }
            Token::RParen => {
                let frame = stack.pop().ok_or_else(|| err(SexpErrorKind::UnexpectedClose))?;
                let kind = frame.kind.ok_or_else(|| err(SexpErrorKind::MissingTag))?;
                let node =
                    SyntaxNode::new(kind, frame.children, Span::from_range(frame.start..range.end));
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Child::Node(node)),
                    None => top.push(node),
                }
                continue;
            }
            Token::Tag(_) | Token::Nil if expects_tag(&stack) => {
                let word = if let Token::Tag(word) = token { word } else { "nil" };
                if let Some(frame) = stack.last_mut() {
                    frame.kind = Some(NodeKind::from_tag(word));
                }
                continue;
            }
            Token::Tag(word) => return Err(err(SexpErrorKind::UnexpectedTag(word.to_string()))),
            Token::Nil => Child::Nil,
            Token::Symbol(name) => Child::Symbol(name.to_string()),
            Token::QuotedSymbol(raw) => {
                let bytes = unescape(raw).ok_or_else(|| err(SexpErrorKind::BadEscape))?;
                Child::Symbol(String::from_utf8_lossy(&bytes).into_owned())
            }
            Token::Int(raw) => Child::Int(
                raw.parse::<i64>()
                    .map_err(|_| err(SexpErrorKind::IntOutOfRange))?,
            ),
            Token::Float(raw) => Child::Float(
                raw.parse::<f64>()
                    .map_err(|_| err(SexpErrorKind::InvalidToken))?,
            ),
            Token::Str(raw) => {
                Child::Str(unescape(raw).ok_or_else(|| err(SexpErrorKind::BadEscape))?)
            }
        };

        let frame = stack.last_mut().ok_or_else(|| err(SexpErrorKind::TopLevelAtom))?;
        if frame.kind.is_none() {
            return Err(err(SexpErrorKind::MissingTag));
        }
        frame.children.push(atom);
    }

    if let Some(open) = stack.last() {
        return Err(SexpError {
            kind: SexpErrorKind::Unclosed,
            span: Span::from_range(open.start..open.start + 1),
        });
    }

    tracing::trace!(forms = top.len(), bytes = text.len(), "read AST dump");
    Ok(match top.len() {
        1 => top.remove(0),
        _ => {
            let span = match (top.first(), top.last()) {
                (Some(first), Some(last)) => first.span.merge(last.span),
                _ => Span::DUMMY,
            };
            SyntaxNode::new(NodeKind::Begin, top.into_iter().map(Child::Node).collect(), span)
        }
    })
}

fn expects_tag(stack: &[Frame]) -> bool {
    stack
        .last()
        .is_some_and(|frame| frame.kind.is_none() && frame.children.is_empty())
}

/// Decode the escapes the parser's string printer produces.
fn unescape(raw: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let byte = match chars.next()? {
            'n' => b'\n',
            't' => b'\t',
            'r' => b'\r',
            '0' => 0,
            'e' => 0x1b,
            'a' => 0x07,
            'b' => 0x08,
            'f' => 0x0c,
            'v' => 0x0b,
            's' => b' ',
            '"' => b'"',
            '\\' => b'\\',
            '#' => b'#',
            '\'' => b'\'',
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                u8::from_str_radix(&hex, 16).ok()?
            }
            'u' => {
                let rest = chars.as_str();
                let (digits, consumed) = if let Some(braced) = rest.strip_prefix('{') {
                    let end = braced.find('}')?;
                    (&braced[..end], end + 2)
                } else {
                    (rest.get(..4)?, 4)
                };
                let ch = char::from_u32(u32::from_str_radix(digits, 16).ok()?)?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                chars = rest.get(consumed..)?.chars();
                continue;
            }
            _ => return None,
        };
        out.push(byte);
    }
    Some(out)
}

#[cfg(test)]
mod tests;
