//! Classes, modules, method definitions and static declarations.

use garnet_ast::{NodeKind, SyntaxNode};
use garnet_codegen::Scope;
use garnet_diagnostic::{malformed, unsupported, CompileResult, Diagnostic, ErrorCode};
use garnet_ir::{MethodId, NodeId};
use garnet_symbols::{ClassKind, ConstValue, ExportTarget, MethodScope, OBJECT};
use garnet_types::{ClassId, WType};

use super::strip_sigil;
use crate::Parser;

impl Parser<'_> {
    /// `(class name superclass body)` / `(module name body)`.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = ?kind))]
    pub(super) fn parse_class(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
        kind: ClassKind,
    ) -> CompileResult<()> {
        let span = node.span;
        let name_node = node.expect_node(0)?;
        let Some((segments, rooted)) = name_node.const_path() else {
            return Err(malformed(node.tag(), "a constant name", name_node.span));
        };
        let Some((name, prefix)) = segments.split_last() else {
            return Err(malformed(node.tag(), "a constant name", name_node.span));
        };

        let here = self.ctx.class_of(parent);
        let lexical = match (prefix.is_empty(), rooted) {
            (true, false) => here,
            (true, true) => OBJECT,
            (false, _) => self.class_path(prefix, rooted, here, name_node)?,
        };
        let (superclass, body_index) = match kind {
            ClassKind::Class => {
                let superclass = match node.node(1) {
                    Some(sup) => Some(self.class_reference(parent, sup)?),
                    None => None,
                };
                (superclass, 2)
            }
            ClassKind::Module => (None, 1),
        };

        let (class, body) = self
            .ctx
            .begin_class_in(parent, lexical, name, kind, superclass, span)?;
        if let Some(statements) = node.node(body_index) {
            self.parse_statements(body, statements, false)?;
        }
        self.ctx.finish_class(class, body)
    }

    /// A constant naming a class or module, as seen from `parent`.
    pub(super) fn class_reference(
        &self,
        parent: NodeId,
        node: &SyntaxNode,
    ) -> CompileResult<ClassId> {
        let Some((segments, rooted)) = node.const_path() else {
            return Err(Diagnostic::error(ErrorCode::E1004)
                .with_message(format!("expected a class or module name, found `{}`", node.tag()))
                .with_label(node.span, "not a constant"));
        };
        self.class_path(&segments, rooted, self.ctx.class_of(parent), node)
    }

    fn class_path(
        &self,
        segments: &[&str],
        rooted: bool,
        lexical: ClassId,
        node: &SyntaxNode,
    ) -> CompileResult<ClassId> {
        self.ctx
            .symbols
            .resolve_class(segments, rooted, lexical)
            .ok_or_else(|| {
                Diagnostic::error(ErrorCode::E1004)
                    .with_message(format!("unknown class or module `{}`", segments.join("::")))
                    .with_label(node.span, "not defined at this point")
            })
    }

    /// `(def name args body)` / `(defs (self) name args body)`.
    ///
    /// A `def` at root scope defines a class method of `Object`, callable
    /// from anywhere without a receiver.
    pub(super) fn parse_def(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
        singleton: bool,
    ) -> CompileResult<()> {
        let span = node.span;
        let (name, args, body) = if singleton {
            let target = node.expect_node(0)?;
            if target.kind != NodeKind::SelfRef {
                return Err(unsupported("singleton methods on anything but `self`", target.span));
            }
            (node.expect_symbol(1)?, node.expect_node(2)?, node.node(3))
        } else {
            (node.expect_symbol(0)?, node.expect_node(1)?, node.node(2))
        };

        let class = self.ctx.class_of(parent);
        let scope = if singleton || self.ctx.scope_of(parent) == Scope::Root {
            MethodScope::Class
        } else {
            MethodScope::Instance
        };
        let (method, function) = self.ctx.begin_method(parent, class, name, scope, span)?;
        if let Some(pending) = self.pending_export.take() {
            self.export(ExportTarget::Method(method), pending.name, pending.span)?;
        }

        for arg in args.nodes() {
            match arg.kind {
                NodeKind::Arg => self.ctx.method_param(method, arg.expect_symbol(0)?, arg.span)?,
                _ => return Err(unsupported(&format!("`{}` parameters", arg.tag()), arg.span)),
            }
        }
        if let Some(body) = body {
            self.parse_body(method, function, body)?;
        }

        if self.ctx.symbols.method(method).is_imported()
            && !self.ctx.tree.children(function).is_empty()
        {
            return Err(Diagnostic::error(ErrorCode::E4006)
                .with_message(format!(
                    "imported method `{}` has a body",
                    self.ctx.symbols.describe_method(method)
                ))
                .with_label(span, "only directives may appear in an imported method"));
        }
        self.ctx.finish_method(method, function)
    }

    /// Method body statements. The last one keeps its value unless the
    /// method returns nothing; a `result` directive earlier in the body can
    /// change that.
    fn parse_body(
        &mut self,
        method: MethodId,
        function: NodeId,
        body: &SyntaxNode,
    ) -> CompileResult<()> {
        let statements: Vec<&SyntaxNode> = match body.kind {
            NodeKind::Begin => body.nodes().collect(),
            _ => vec![body],
        };
        let count = statements.len();
        for (i, statement) in statements.into_iter().enumerate() {
            let keep = i + 1 == count && !self.ctx.symbols.method(method).wtype.is_blank();
            self.parse_node(function, statement, keep)?;
        }
        Ok(())
    }

    /// `(casgn scope name value)`.
    pub(super) fn parse_casgn(&mut self, parent: NodeId, node: &SyntaxNode) -> CompileResult<()> {
        if !node.children.first().is_some_and(garnet_ast::Child::is_nil) {
            return Err(unsupported("assigning a constant of another namespace", node.span));
        }
        let name = node.expect_symbol(1)?;
        let value = self.evaluate(parent, node.expect_node(2)?)?;
        self.ctx.const_declare(parent, name, value, node.span)
    }

    /// `@@x = v` / `$x = v` at class or root scope: a declaration with a
    /// compile-time initializer.
    pub(super) fn parse_static_declaration(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
    ) -> CompileResult<()> {
        let span = node.span;
        let name = strip_sigil(node.expect_symbol(0)?);
        let value_node = node.expect_node(1)?;
        let (value, ty) = match self.evaluate(parent, value_node)? {
            ConstValue::Int(value, ty) => (value, ty),
            ConstValue::Class(_) => {
                return Err(Diagnostic::error(ErrorCode::E3001)
                    .with_message(format!("a class cannot initialize `{}`", node.expect_symbol(0)?))
                    .with_label(value_node.span, "this is a class, not a value"));
            }
        };
        match node.kind {
            NodeKind::Cvasgn => self.ctx.cvar_declare(parent, name, value, ty, span),
            _ => {
                let ty = if ty.is_class() { WType::DEFAULT } else { ty };
                let global = self.ctx.global_declare(name, value, ty, span)?;
                if let Some(pending) = self.pending_export.take() {
                    self.export(ExportTarget::Global(global), pending.name, pending.span)?;
                }
                Ok(())
            }
        }
    }
}
