//! Conditionals, loops, branches and logical operators.

use garnet_ast::{NodeKind, SyntaxNode};
use garnet_diagnostic::{unsupported, CompileResult};
use garnet_ir::{NodeId, Template};
use garnet_types::WType;

use crate::Parser;

impl Parser<'_> {
    /// `(if cond then else)`; either arm may be `nil`. `unless` arrives
    /// with the arms swapped.
    pub(super) fn parse_if(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
        keep_eval: bool,
    ) -> CompileResult<NodeId> {
        let span = node.span;
        let condition = node.expect_node(0)?;
        let branch = self.ctx.tree.add(parent, Template::If, WType::Blank);
        self.ctx.tree.set_span(branch, span);

        let value = self.parse_value(branch, condition)?;
        self.ctx.condition(value)?;
        let then_arm = self.ctx.tree.add(branch, Template::Then, WType::Blank);
        if let Some(body) = node.node(1) {
            self.parse_statements(then_arm, body, keep_eval)?;
        }
        if let Some(body) = node.node(2) {
            let else_arm = self.ctx.tree.add(branch, Template::Else, WType::Blank);
            self.parse_statements(else_arm, body, keep_eval)?;
        }
        self.ctx.finish_if(branch, keep_eval, span)
    }

    /// `(while cond body)` / `(until cond body)`: test at the top.
    pub(super) fn parse_loop(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
    ) -> CompileResult<NodeId> {
        let (block, body) = self.ctx.loop_shell(parent, node.span);
        let exit = self.ctx.tree.add(body, Template::BrIf(block), WType::Blank);
        self.parse_value(exit, node.expect_node(0)?)?;
        self.ctx
            .branch_if(exit, node.kind == NodeKind::While)?;
        if let Some(statements) = node.node(1) {
            self.parse_statements(body, statements, false)?;
        }
        self.ctx.loop_back(body);
        Ok(block)
    }

    /// `begin ... end while cond`: the body runs once before the test.
    /// `next` restarts the body without testing.
    pub(super) fn parse_post_loop(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
    ) -> CompileResult<NodeId> {
        let (block, body) = self.ctx.loop_shell(parent, node.span);
        self.parse_statements(body, node.expect_node(1)?, false)?;
        let again = self.ctx.tree.add(body, Template::BrIf(body), WType::Blank);
        self.parse_value(again, node.expect_node(0)?)?;
        self.ctx
            .branch_if(again, node.kind == NodeKind::UntilPost)?;
        Ok(block)
    }

    pub(super) fn parse_branch(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
    ) -> CompileResult<NodeId> {
        if node.nodes().next().is_some() {
            return Err(unsupported(&format!("`{}` with a value", node.tag()), node.span));
        }
        match node.kind {
            NodeKind::Break => self.ctx.break_loop(parent, node.span),
            _ => self.ctx.next_loop(parent, node.span),
        }
    }

    pub(super) fn parse_return(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
    ) -> CompileResult<NodeId> {
        let values: Vec<&SyntaxNode> = node.nodes().collect();
        let ret = self.placeholder(parent, node.span);
        match values.as_slice() {
            [] => {}
            [value] => {
                self.parse_value(ret, value)?;
            }
            _ => return Err(unsupported("returning several values", node.span)),
        }
        self.ctx.return_value(ret, node.span)
    }

    /// `a && b`, `a || b`: both operands are evaluated lazily into an I32
    /// boolean.
    pub(super) fn parse_logical(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
    ) -> CompileResult<NodeId> {
        let branch = self.ctx.tree.add(parent, Template::If, WType::Blank);
        self.parse_value(branch, node.expect_node(0)?)?;
        self.parse_value(branch, node.expect_node(1)?)?;
        self.ctx
            .short_circuit(branch, node.kind == NodeKind::And, node.span)
    }

    pub(super) fn parse_not(&mut self, parent: NodeId, node: &SyntaxNode) -> CompileResult<NodeId> {
        let apply = self.placeholder(parent, node.span);
        self.parse_value(apply, node.expect_node(0)?)?;
        self.apply_method(apply, "!", node.span)
    }
}
