//! Syntax nodes as delivered by the external parser.

use garnet_diagnostic::{malformed, Diagnostic};
use garnet_ir::Span;

use crate::NodeKind;

/// One child slot of a syntax node.
#[derive(Clone, PartialEq, Debug)]
pub enum Child {
    Node(SyntaxNode),
    /// An absent optional child (`nil` in the dump).
    Nil,
    Symbol(String),
    Int(i64),
    Float(f64),
    /// String payload as raw bytes; escapes are already decoded.
    Str(Vec<u8>),
}

impl Child {
    pub fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            Child::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Child::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Child::Nil)
    }
}

/// A labeled syntax tree node.
#[derive(Clone, PartialEq, Debug)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub children: Vec<Child>,
    pub span: Span,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, children: Vec<Child>, span: Span) -> Self {
        SyntaxNode {
            kind,
            children,
            span,
        }
    }

    #[inline]
    pub fn tag(&self) -> &str {
        self.kind.as_str()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child node at `index`; `None` when absent, `nil`, or a payload.
    pub fn node(&self, index: usize) -> Option<&SyntaxNode> {
        self.children.get(index).and_then(Child::as_node)
    }

    /// All children that are nodes, in order.
    pub fn nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter_map(Child::as_node)
    }

    // ── shape checks ────────────────────────────────────────────
    //
    // Each accessor fails with a malformed-node diagnostic naming the tag
    // and what was expected.

    pub fn expect_node(&self, index: usize) -> Result<&SyntaxNode, Diagnostic> {
        self.node(index)
            .ok_or_else(|| malformed(self.tag(), &format!("a node at position {index}"), self.span))
    }

    pub fn expect_symbol(&self, index: usize) -> Result<&str, Diagnostic> {
        self.children
            .get(index)
            .and_then(Child::as_symbol)
            .ok_or_else(|| {
                malformed(self.tag(), &format!("a symbol at position {index}"), self.span)
            })
    }

    pub fn expect_int(&self, index: usize) -> Result<i64, Diagnostic> {
        match self.children.get(index) {
            Some(Child::Int(v)) => Ok(*v),
            _ => Err(malformed(self.tag(), &format!("an integer at position {index}"), self.span)),
        }
    }

    pub fn expect_str(&self, index: usize) -> Result<&[u8], Diagnostic> {
        match self.children.get(index) {
            Some(Child::Str(s)) => Ok(s),
            _ => Err(malformed(self.tag(), &format!("a string at position {index}"), self.span)),
        }
    }

    /// The symbol of a `(sym :x)` node.
    pub fn sym_value(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Sym => self.children.first().and_then(Child::as_symbol),
            _ => None,
        }
    }

    /// Key/value pairs of a `hash` or `kwargs` node whose keys are symbols.
    pub fn hash_pairs(&self) -> Option<Vec<(&str, &SyntaxNode)>> {
        if !matches!(self.kind, NodeKind::Hash | NodeKind::Kwargs) {
            return None;
        }
        self.nodes()
            .map(|pair| {
                let key = pair.node(0)?.sym_value()?;
                Some((key, pair.node(1)?))
            })
            .collect()
    }

    /// Path of a `const` node (`A::B::C`) and whether it is rooted at `::`.
    ///
    /// Returns `None` when the scope chain contains something other than
    /// constants (e.g. `self::C`).
    pub fn const_path(&self) -> Option<(Vec<&str>, bool)> {
        if self.kind != NodeKind::Const {
            return None;
        }
        let mut segments = Vec::new();
        let mut rooted = false;
        let mut current = self;
        loop {
            segments.push(current.children.get(1)?.as_symbol()?);
            match current.children.first()? {
                Child::Nil => break,
                Child::Node(scope) if scope.kind == NodeKind::Cbase => {
                    rooted = true;
                    break;
                }
                Child::Node(scope) if scope.kind == NodeKind::Const => current = scope,
                _ => return None,
            }
        }
        segments.reverse();
        Some((segments, rooted))
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::sexp::read;

    #[test]
    fn test_const_path() {
        let node = read("(const (const (cbase) :A) :B)").unwrap();
        assert_eq!(node.const_path(), Some((vec!["A", "B"], true)));

        let node = read("(const nil :C)").unwrap();
        assert_eq!(node.const_path(), Some((vec!["C"], false)));

        let node = read("(const (self) :C)").unwrap();
        assert_eq!(node.const_path(), None);
    }

    #[test]
    fn test_hash_pairs() {
        let node = read("(hash (pair (sym :x) (sym :I64)) (pair (sym :y) (int 3)))")
            .unwrap();
        let pairs = node.hash_pairs().unwrap();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["x", "y"]);
        assert_eq!(pairs[0].1.sym_value(), Some("I64"));
    }

    #[test]
    fn test_shape_errors() {
        let node = read("(lvasgn (int 1))").unwrap();
        let err = node.expect_symbol(0).unwrap_err();
        assert_eq!(err.message, "malformed `lvasgn` node: expected a symbol at position 0");
    }
}
