//! Compile-time directives.
//!
//! Directives look like receiver-less calls but act on the symbol table:
//!
//! | Directive | Scope | Effect |
//! |---|---|---|
//! | `arg x: :I64` | method | parameter types |
//! | `local x: :I64` | method | local types |
//! | `result :I64` | method | result type |
//! | `result :m, :I64` / `result :"self.m", :I64` | class, root | forward result type |
//! | `export` / `export :name` | any | export the current or next method or global |
//! | `import :module, :function` | method | bind to a host function |
//! | `attr_reader` / `attr_writer` / `attr_accessor` | class | accessors |
//! | `attr_type x: :I64` | class | accessor slot type |
//! | `inline wat: "...", wtype: :I32` | method | raw instruction text |
//! | `include` / `prepend` / `extend` | class, root | mixins |
//! | `require` / `require_relative` | class, root | parse another unit |

use garnet_ast::{NodeKind, SyntaxNode};
use garnet_codegen::Scope;
use garnet_diagnostic::{CompileResult, Diagnostic, ErrorCode};
use garnet_ir::{MethodId, NodeId, Span, Template};
use garnet_symbols::{ExportTarget, MethodFlags, MethodScope, Mixin};
use garnet_types::{ClassId, WType};

use crate::{Parser, PendingExport};

impl Parser<'_> {
    pub(super) fn is_directive(name: &str) -> bool {
        matches!(
            name,
            "arg"
                | "local"
                | "result"
                | "export"
                | "import"
                | "attr_reader"
                | "attr_writer"
                | "attr_accessor"
                | "attr_type"
                | "inline"
                | "include"
                | "prepend"
                | "extend"
                | "require"
                | "require_relative"
        )
    }

    /// Run the directive `name`. Only `inline` produces a node.
    #[tracing::instrument(level = "trace", skip(self, node, args))]
    pub(super) fn parse_directive(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
        name: &str,
        args: &[&SyntaxNode],
    ) -> CompileResult<Option<NodeId>> {
        let span = node.span;
        match name {
            "arg" | "local" => {
                let method = self.directive_in_method(parent, name, span)?;
                self.declare_slots(parent, method, name == "arg", args, span)?;
                Ok(None)
            }
            "result" => {
                self.result_directive(parent, args, span)?;
                Ok(None)
            }
            "export" => {
                self.export_directive(parent, args, span)?;
                Ok(None)
            }
            "import" => {
                let method = self.directive_in_method(parent, name, span)?;
                let [module, function] = args else {
                    return Err(Self::bad_arguments(name, "a module and a function name", span));
                };
                let (module, function) = (
                    Self::name_argument(name, module)?,
                    Self::name_argument(name, function)?,
                );
                let m = self.ctx.symbols.method_mut(method);
                m.flags |= MethodFlags::IMPORTED;
                m.import = Some((module, function));
                Ok(None)
            }
            "attr_reader" | "attr_writer" | "attr_accessor" => {
                let class = self.directive_in_class(parent, name, span)?;
                let reader = name != "attr_writer";
                let writer = name != "attr_reader";
                if args.is_empty() {
                    return Err(Self::bad_arguments(name, "at least one attribute name", span));
                }
                for arg in args {
                    let attr = Self::name_argument(name, arg)?;
                    self.ctx.declare_attr(class, &attr, reader, writer, arg.span)?;
                }
                Ok(None)
            }
            "attr_type" => {
                let class = self.directive_in_class(parent, name, span)?;
                for (attr, ty, pair_span) in self.typed_names(parent, name, args, span)? {
                    self.ctx.attr_type(class, &attr, ty, pair_span)?;
                }
                Ok(None)
            }
            "inline" => self.inline_directive(parent, args, span).map(Some),
            "include" | "prepend" | "extend" => {
                self.mixin_directive(parent, name, args, span)?;
                Ok(None)
            }
            _ => {
                self.require_directive(parent, name, args, span)?;
                Ok(None)
            }
        }
    }

    // ── Scope checks ────────────────────────────────────────────

    fn directive_in_method(
        &self,
        parent: NodeId,
        name: &str,
        span: Span,
    ) -> CompileResult<MethodId> {
        self.ctx
            .method_of(parent)
            .ok_or_else(|| self.wrong_scope(parent, name, "inside a method", span))
    }

    fn directive_in_class(&self, parent: NodeId, name: &str, span: Span) -> CompileResult<ClassId> {
        match self.ctx.scope_of(parent) {
            Scope::Class(class) => Ok(class),
            _ => Err(self.wrong_scope(parent, name, "in a class body", span)),
        }
    }

    fn directive_outside_method(
        &self,
        parent: NodeId,
        name: &str,
        span: Span,
    ) -> CompileResult<()> {
        match self.ctx.scope_of(parent) {
            Scope::Method(_) => Err(self.wrong_scope(parent, name, "at class or root scope", span)),
            _ => Ok(()),
        }
    }

    #[cold]
    fn wrong_scope(&self, parent: NodeId, name: &str, expected: &str, span: Span) -> Diagnostic {
        Diagnostic::error(ErrorCode::E2006)
            .with_message(format!("`{name}` used in {}", self.ctx.describe_scope(parent)))
            .with_label(span, format!("`{name}` is only allowed {expected}"))
    }

    #[cold]
    pub(super) fn bad_arguments(directive: &str, expected: &str, span: Span) -> Diagnostic {
        Diagnostic::error(ErrorCode::E5004)
            .with_message(format!("invalid arguments to `{directive}`: expected {expected}"))
            .with_label(span, "in this directive")
    }

    // ── Arguments ───────────────────────────────────────────────

    /// A symbol or string argument.
    fn name_argument(directive: &str, node: &SyntaxNode) -> CompileResult<String> {
        match node.kind {
            NodeKind::Sym => Ok(node.expect_symbol(0)?.to_string()),
            NodeKind::Str => Ok(String::from_utf8_lossy(node.expect_str(0)?).into_owned()),
            _ => Err(Self::bad_arguments(directive, "a symbol or string", node.span)),
        }
    }

    /// A type written as a symbol (`:I64`, `:"Outer::Cell"`) or a constant
    /// path.
    pub(super) fn type_argument(&self, parent: NodeId, node: &SyntaxNode) -> CompileResult<WType> {
        let lexical = self.ctx.class_of(parent);
        let name = match (&node.kind, node.const_path()) {
            (NodeKind::Const, Some((segments, rooted))) => {
                let path = segments.join("::");
                if rooted {
                    format!("::{path}")
                } else {
                    path
                }
            }
            (NodeKind::Sym, _) => node.expect_symbol(0)?.to_string(),
            _ => return Err(Self::bad_arguments("type", "a type name", node.span)),
        };
        self.ctx
            .symbols
            .type_from_name(&name, lexical)
            .ok_or_else(|| {
                Diagnostic::error(ErrorCode::E1004)
                    .with_message(format!("unknown type `{name}`"))
                    .with_label(node.span, "expected I32, I64, F32, F64, none or a class")
            })
    }

    /// `name: :Type, ...` keyword arguments.
    fn typed_names(
        &self,
        parent: NodeId,
        directive: &str,
        args: &[&SyntaxNode],
        span: Span,
    ) -> CompileResult<Vec<(String, WType, Span)>> {
        let [hash] = args else {
            return Err(Self::bad_arguments(directive, "`name: :Type` pairs", span));
        };
        let Some(pairs) = hash.hash_pairs() else {
            return Err(Self::bad_arguments(directive, "`name: :Type` pairs", hash.span));
        };
        pairs
            .into_iter()
            .map(|(name, ty)| Ok((name.to_string(), self.type_argument(parent, ty)?, ty.span)))
            .collect()
    }

    // ── Directives ──────────────────────────────────────────────

    fn declare_slots(
        &mut self,
        parent: NodeId,
        method: MethodId,
        params: bool,
        args: &[&SyntaxNode],
        span: Span,
    ) -> CompileResult<()> {
        let directive = if params { "arg" } else { "local" };
        for (name, ty, slot_span) in self.typed_names(parent, directive, args, span)? {
            let m = self.ctx.symbols.method_mut(method);
            if params {
                if !m.set_param_type(&name, ty) {
                    return Err(Diagnostic::error(ErrorCode::E1002)
                        .with_message(format!(
                            "`{}` has no parameter `{name}`",
                            self.ctx.symbols.describe_method(method)
                        ))
                        .with_label(slot_span, "not a parameter"));
                }
                continue;
            }
            match m.slot_type(&name) {
                Some(existing) if existing != ty => {
                    return Err(Diagnostic::error(ErrorCode::E4005)
                        .with_message(format!(
                            "`{name}` already has type {}",
                            self.ctx.symbols.describe(existing)
                        ))
                        .with_label(
                            slot_span,
                            format!("declared as {}", self.ctx.symbols.describe(ty)),
                        ));
                }
                _ => {
                    m.declare_local(&name, ty);
                }
            }
        }
        Ok(())
    }

    /// `result :T` inside a method; `result :m, :T` ahead of a definition.
    fn result_directive(
        &mut self,
        parent: NodeId,
        args: &[&SyntaxNode],
        span: Span,
    ) -> CompileResult<()> {
        let (method, ty) = match (self.ctx.scope_of(parent), args) {
            (Scope::Method(method), [ty]) => (method, self.type_argument(parent, ty)?),
            (Scope::Method(_), _) => return Err(Self::bad_arguments("result", "a type", span)),
            (scope, [name, ty]) => {
                let name = Self::name_argument("result", name)?;
                let ty = self.type_argument(parent, ty)?;
                let class = self.ctx.class_of(parent);
                let (name, method_scope) = match name.strip_prefix("self.") {
                    Some(stripped) => (stripped.to_string(), MethodScope::Class),
                    None if scope == Scope::Root => (name, MethodScope::Class),
                    None => (name, MethodScope::Instance),
                };
                let method = self
                    .ctx
                    .symbols
                    .declare_method(class, &name, method_scope, span);
                (method, ty)
            }
            _ => return Err(Self::bad_arguments("result", "a method name and a type", span)),
        };
        tracing::trace!(method = %self.ctx.symbols.describe_method(method), %ty, "result type");
        let m = self.ctx.symbols.method_mut(method);
        m.wtype = ty;
        m.flags |= MethodFlags::DECLARED_RESULT;
        Ok(())
    }

    fn export_directive(
        &mut self,
        parent: NodeId,
        args: &[&SyntaxNode],
        span: Span,
    ) -> CompileResult<()> {
        let name = match args {
            [] => None,
            [name] => Some(Self::name_argument("export", name)?),
            _ => return Err(Self::bad_arguments("export", "at most one export name", span)),
        };
        if let Some(method) = self.ctx.method_of(parent) {
            return self.export(ExportTarget::Method(method), name, span);
        }
        if self.pending_export.is_some() {
            return Err(Self::bad_arguments(
                "export",
                "a definition between two `export` directives",
                span,
            ));
        }
        self.pending_export = Some(PendingExport { name, span });
        Ok(())
    }

    /// Add `target` to the export list, under its default name unless one
    /// is given.
    pub(super) fn export(
        &mut self,
        target: ExportTarget,
        name: Option<String>,
        span: Span,
    ) -> CompileResult<()> {
        let symbols = &mut self.ctx.symbols;
        let name = name.unwrap_or_else(|| match target {
            ExportTarget::Method(m) => symbols.default_export_name(m),
            ExportTarget::Global(g) => symbols.global(g).name.clone(),
        });
        symbols.exports.add(target, &name, span)?;
        if let ExportTarget::Method(m) = target {
            symbols.method_mut(m).flags |= MethodFlags::EXPORTED;
        }
        Ok(())
    }

    /// `inline wat: "(i32.const 1)", wtype: :I32`.
    fn inline_directive(
        &mut self,
        parent: NodeId,
        args: &[&SyntaxNode],
        span: Span,
    ) -> CompileResult<NodeId> {
        self.directive_in_method(parent, "inline", span)?;
        let pairs = match args {
            [hash] => hash.hash_pairs(),
            _ => None,
        };
        let Some(pairs) = pairs else {
            return Err(Self::bad_arguments("inline", "`wat:` and `wtype:` keywords", span));
        };
        let mut text = None;
        let mut ty = WType::Blank;
        for (key, value) in pairs {
            match key {
                "wat" => text = Some(String::from_utf8_lossy(value.expect_str(0)?).into_owned()),
                "wtype" => ty = self.type_argument(parent, value)?,
                "ruby" => {}
                _ => {
                    return Err(Self::bad_arguments(
                        "inline",
                        "`wat:` and `wtype:` keywords",
                        value.span,
                    ))
                }
            }
        }
        let Some(text) = text else {
            return Err(Self::bad_arguments("inline", "a `wat:` string", span));
        };
        let node = self.ctx.tree.add(parent, Template::Inline(text), ty);
        self.ctx.tree.set_span(node, span);
        Ok(node)
    }

    fn mixin_directive(
        &mut self,
        parent: NodeId,
        name: &str,
        args: &[&SyntaxNode],
        span: Span,
    ) -> CompileResult<()> {
        self.directive_outside_method(parent, name, span)?;
        let how = match name {
            "include" => Mixin::Include,
            "prepend" => Mixin::Prepend,
            _ => Mixin::Extend,
        };
        if args.is_empty() {
            return Err(Self::bad_arguments(name, "a module", span));
        }
        let class = self.ctx.class_of(parent);
        for arg in args {
            let module = self.class_reference(parent, arg)?;
            self.ctx.symbols.mix_in(class, module, how, arg.span)?;
        }
        Ok(())
    }

    /// Parse a required unit to completion before going on. Units already
    /// loaded are skipped.
    fn require_directive(
        &mut self,
        parent: NodeId,
        name: &str,
        args: &[&SyntaxNode],
        span: Span,
    ) -> CompileResult<()> {
        self.directive_outside_method(parent, name, span)?;
        let [unit_name] = args else {
            return Err(Self::bad_arguments(name, "a unit name", span));
        };
        let unit_name = Self::name_argument(name, unit_name)?;
        let from = self.units.last().and_then(|(_, path)| path.clone());
        let relative = name == "require_relative";
        let Some(unit) = self
            .loader
            .require(&unit_name, from.as_deref(), relative, span)?
        else {
            return Ok(());
        };
        tracing::debug!(unit = %unit.name, "require");
        self.parse_unit(&unit)
    }
}
