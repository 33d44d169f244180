//! Literals, variable reads and assignments.

use garnet_ast::{Child, NodeKind, SyntaxNode};
use garnet_diagnostic::{internal, malformed, unsupported, CompileResult, Diagnostic, ErrorCode};
use garnet_ir::{NodeId, Span, Template};
use garnet_symbols::{MethodScope, SELF_PARAM};
use garnet_types::WType;

use super::strip_sigil;
use crate::Parser;

impl Parser<'_> {
    /// Literals, variable reads, constants and `self`.
    pub(super) fn parse_operand(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
    ) -> CompileResult<NodeId> {
        let span = node.span;
        match node.kind {
            NodeKind::Int => Ok(self.ctx.int_literal(parent, node.expect_int(0)?, span)),
            NodeKind::Str => Ok(self.ctx.string_literal(parent, node.expect_str(0)?, span)),
            NodeKind::True => Ok(self.ctx.int_literal(parent, 1, span)),
            NodeKind::False => Ok(self.ctx.int_literal(parent, 0, span)),
            NodeKind::Lvar => self.ctx.local_get(parent, node.expect_symbol(0)?, span),
            NodeKind::Ivar => self
                .ctx
                .ivar_get(parent, strip_sigil(node.expect_symbol(0)?), span),
            NodeKind::Cvar => self
                .ctx
                .cvar_get(parent, strip_sigil(node.expect_symbol(0)?), span),
            NodeKind::Gvar => self
                .ctx
                .global_get(parent, strip_sigil(node.expect_symbol(0)?), span),
            NodeKind::Const => {
                let Some((segments, rooted)) = node.const_path() else {
                    return Err(malformed("const", "a constant path", span));
                };
                self.ctx.const_get(parent, &segments, rooted, span)
            }
            NodeKind::SelfRef => self.self_value(parent, span),
            _ => Err(internal(format!("`{}` is not an operand", node.tag()))),
        }
    }

    /// The receiver of the instance method around `parent`.
    pub(super) fn self_value(&mut self, parent: NodeId, span: Span) -> CompileResult<NodeId> {
        let receiver = self
            .ctx
            .method_of(parent)
            .map(|m| self.ctx.symbols.method(m))
            .filter(|m| m.scope == MethodScope::Instance)
            .map(|m| m.klass);
        match receiver {
            Some(klass) => {
                let node = self
                    .ctx
                    .tree
                    .add(parent, Template::LocalGet(SELF_PARAM.to_string()), WType::Class(klass));
                self.ctx.tree.set_span(node, span);
                Ok(node)
            }
            None => Err(Diagnostic::error(ErrorCode::E2003)
                .with_message(format!("`self` has no value in {}", self.ctx.describe_scope(parent)))
                .with_label(span, "only instance methods have a receiver value")),
        }
    }

    /// `(lvasgn name value)` and the other three variable kinds.
    pub(super) fn parse_assign(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
        keep_eval: bool,
    ) -> CompileResult<Option<NodeId>> {
        let in_method = self.ctx.method_of(parent).is_some();
        match node.kind {
            NodeKind::Cvasgn | NodeKind::Gvasgn if !in_method => {
                self.parse_static_declaration(parent, node)?;
                return Ok(None);
            }
            NodeKind::Ivasgn => {
                self.ctx
                    .require_instance_method(
                        parent,
                        strip_sigil(node.expect_symbol(0)?),
                        node.span,
                    )?;
            }
            _ => {}
        }
        let Some(value) = node.node(1) else {
            return Err(unsupported("assignment without a value", node.span));
        };
        let slot = self.placeholder(parent, node.span);
        self.parse_value(slot, value)?;
        self.finish_assign(slot, node, keep_eval).map(Some)
    }

    /// `(op_asgn target op value)`: `a += 1` reads the target, applies the
    /// operator and stores the result back.
    pub(super) fn parse_op_assign(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
        keep_eval: bool,
    ) -> CompileResult<NodeId> {
        let span = node.span;
        let target = node.expect_node(0)?;
        let operator = node.expect_symbol(1)?;
        let rhs = node.expect_node(2)?;
        let read_kind = match target.kind {
            NodeKind::Lvasgn => NodeKind::Lvar,
            NodeKind::Ivasgn => NodeKind::Ivar,
            NodeKind::Cvasgn => NodeKind::Cvar,
            NodeKind::Gvasgn => NodeKind::Gvar,
            _ => {
                return Err(unsupported(
                    &format!("`{}` as an operator-assignment target", target.tag()),
                    target.span,
                ))
            }
        };
        let name = target.expect_symbol(0)?;
        let read = SyntaxNode::new(read_kind, vec![Child::Symbol(name.to_string())], target.span);

        let slot = self.placeholder(parent, span);
        let apply = self.placeholder(slot, span);
        self.parse_operand(apply, &read)?;
        self.parse_value(apply, rhs)?;
        self.apply_method(apply, operator, span)?;
        self.finish_assign(slot, target, keep_eval)
    }

    /// `slot` holds the value; turn it into the store for `target`.
    fn finish_assign(
        &mut self,
        slot: NodeId,
        target: &SyntaxNode,
        keep_eval: bool,
    ) -> CompileResult<NodeId> {
        let span = target.span;
        let name = strip_sigil(target.expect_symbol(0)?);
        match target.kind {
            NodeKind::Lvasgn => self.ctx.local_assign(slot, name, keep_eval, span),
            NodeKind::Ivasgn => self.ctx.ivar_assign(slot, name, keep_eval, span),
            NodeKind::Cvasgn => self.ctx.cvar_assign(slot, name, keep_eval, span),
            NodeKind::Gvasgn => self.ctx.global_assign(slot, name, keep_eval, span),
            _ => Err(internal(format!("`{}` is not an assignment", target.tag()))),
        }
    }

    /// An empty node the code generator will rewrite.
    pub(super) fn placeholder(&mut self, parent: NodeId, span: Span) -> NodeId {
        let node = self.ctx.tree.add(parent, Template::Nop, WType::Blank);
        self.ctx.tree.set_span(node, span);
        node
    }
}
