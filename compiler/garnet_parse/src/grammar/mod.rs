//! Grammar modules.
//!
//! Each module extends [`Parser`] with the productions for one family of
//! node kinds:
//!
//! - [`item`]: classes, modules, method definitions and declarations
//! - [`expr`]: literals, variable reads and assignments
//! - [`send`]: calls, operators, casts and the static data registry
//! - [`control`]: conditionals, loops, branches and logical operators
//! - [`directive`]: compile-time directives spelled as calls
//! - [`constant`]: compile-time evaluation of declaration initializers
//!
//! # Design
//!
//! A production appends its IR under a parent node and returns the node
//! that now stands for the construct (`None` when it produced nothing).
//! Compound constructs first append a placeholder node, parse their
//! operands into it, then let the code generator rewrite it in place.
//! Discarding unwanted values is done once, in [`Parser::parse_node`].

mod constant;
mod control;
mod directive;
mod expr;
mod item;
mod send;

use garnet_ast::{NodeKind, SyntaxNode};
use garnet_diagnostic::{unsupported, CompileResult, Diagnostic, ErrorCode};
use garnet_ir::{ensure_sufficient_stack, NodeId};
use garnet_symbols::ClassKind;

use crate::Parser;

impl Parser<'_> {
    /// Parse a statement sequence (or a single statement) under `parent`.
    /// Only the last statement's value may be kept.
    pub(crate) fn parse_statements(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
        keep_eval: bool,
    ) -> CompileResult<Option<NodeId>> {
        match node.kind {
            NodeKind::Begin | NodeKind::Kwbegin => {
                let statements: Vec<&SyntaxNode> = node.nodes().collect();
                let count = statements.len();
                let mut last = None;
                for (i, statement) in statements.into_iter().enumerate() {
                    last = self.parse_node(parent, statement, keep_eval && i + 1 == count)?;
                }
                Ok(last)
            }
            _ => self.parse_node(parent, node, keep_eval),
        }
    }

    /// Parse one node. A value nobody wants is dropped here.
    pub(crate) fn parse_node(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
        keep_eval: bool,
    ) -> CompileResult<Option<NodeId>> {
        ensure_sufficient_stack(|| {
            let produced = self.dispatch(parent, node, keep_eval)?;
            Ok(produced.map(|n| self.ctx.keep_or_drop(n, keep_eval)))
        })
    }

    /// Parse an expression whose value is needed.
    pub(crate) fn parse_value(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
    ) -> CompileResult<NodeId> {
        match self.parse_node(parent, node, true)? {
            Some(value) if !self.ctx.tree.wtype(value).is_blank() => Ok(value),
            _ => Err(Diagnostic::error(ErrorCode::E3001)
                .with_message(format!("`{}` produces no value", node.tag()))
                .with_label(node.span, "a value is needed here")),
        }
    }

    fn dispatch(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
        keep_eval: bool,
    ) -> CompileResult<Option<NodeId>> {
        tracing::trace!(tag = node.tag(), ?parent, keep_eval, "dispatch");
        if is_executable(&node.kind) {
            self.require_method_scope(parent, node)?;
        }
        match &node.kind {
            NodeKind::Begin | NodeKind::Kwbegin => self.parse_statements(parent, node, keep_eval),

            NodeKind::Class => self.parse_class(parent, node, ClassKind::Class).map(|()| None),
            NodeKind::Module => self.parse_class(parent, node, ClassKind::Module).map(|()| None),
            NodeKind::Def => self.parse_def(parent, node, false).map(|()| None),
            NodeKind::Defs => self.parse_def(parent, node, true).map(|()| None),
            NodeKind::Casgn => self.parse_casgn(parent, node).map(|()| None),

            NodeKind::Lvasgn | NodeKind::Ivasgn | NodeKind::Cvasgn | NodeKind::Gvasgn => {
                self.parse_assign(parent, node, keep_eval)
            }
            NodeKind::OpAsgn => self.parse_op_assign(parent, node, keep_eval).map(Some),

            NodeKind::Lvar
            | NodeKind::Ivar
            | NodeKind::Cvar
            | NodeKind::Gvar
            | NodeKind::Const
            | NodeKind::SelfRef
            | NodeKind::Int
            | NodeKind::Str
            | NodeKind::True
            | NodeKind::False => self.parse_operand(parent, node).map(Some),

            NodeKind::Send => self.parse_send(parent, node),

            NodeKind::If => self.parse_if(parent, node, keep_eval).map(Some),
            NodeKind::While | NodeKind::Until => self.parse_loop(parent, node).map(Some),
            NodeKind::WhilePost | NodeKind::UntilPost => {
                self.parse_post_loop(parent, node).map(Some)
            }
            NodeKind::Break | NodeKind::Next => self.parse_branch(parent, node).map(Some),
            NodeKind::Return => self.parse_return(parent, node).map(Some),
            NodeKind::And | NodeKind::Or => self.parse_logical(parent, node).map(Some),
            NodeKind::Not => self.parse_not(parent, node).map(Some),

            NodeKind::Sclass => Err(unsupported("`class << self` blocks", node.span)),
            NodeKind::Float => Err(unsupported("floating point literals", node.span)),
            NodeKind::Nil => Err(unsupported("`nil`", node.span)),
            NodeKind::Dstr => Err(unsupported("interpolated strings", node.span)),
            NodeKind::OrAsgn | NodeKind::AndAsgn => Err(unsupported("`||=` and `&&=`", node.span)),
            NodeKind::Array => Err(unsupported("array literals", node.span)),
            NodeKind::Sym | NodeKind::Hash | NodeKind::Kwargs | NodeKind::Pair => {
                Err(unsupported(&format!("`{}` outside of a directive", node.tag()), node.span))
            }
            NodeKind::Args | NodeKind::Arg | NodeKind::Cbase => {
                Err(unsupported(&format!("`{}` in statement position", node.tag()), node.span))
            }
            NodeKind::Unknown(tag) => Err(unsupported(&format!("`{tag}` nodes"), node.span)),
        }
    }

    /// Executable code is only allowed inside methods.
    fn require_method_scope(&self, parent: NodeId, node: &SyntaxNode) -> CompileResult<()> {
        if self.ctx.method_of(parent).is_some() {
            return Ok(());
        }
        Err(Diagnostic::error(ErrorCode::E2003)
            .with_message(format!(
                "`{}` is not allowed in {}",
                node.tag(),
                self.ctx.describe_scope(parent)
            ))
            .with_label(node.span, "executable statement outside of a method")
            .with_note("only declarations and directives may appear at class or root scope"))
    }
}

/// Node kinds that generate code and so need a method around them.
/// Instance variables report their own, more specific scope error.
fn is_executable(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Lvasgn
            | NodeKind::OpAsgn
            | NodeKind::Lvar
            | NodeKind::Cvar
            | NodeKind::Gvar
            | NodeKind::Const
            | NodeKind::SelfRef
            | NodeKind::Int
            | NodeKind::Str
            | NodeKind::True
            | NodeKind::False
            | NodeKind::If
            | NodeKind::While
            | NodeKind::Until
            | NodeKind::WhilePost
            | NodeKind::UntilPost
            | NodeKind::Break
            | NodeKind::Next
            | NodeKind::Return
            | NodeKind::And
            | NodeKind::Or
            | NodeKind::Not
    )
}

/// Variable names come with their sigil (`@x`, `@@x`, `$x`).
pub(crate) fn strip_sigil(name: &str) -> &str {
    name.trim_start_matches(['@', '$'])
}
