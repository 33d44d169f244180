//! Literals and the four variable scopes, plus constants and globals.

use garnet_diagnostic::{unknown_name, unsupported, CompileResult, Diagnostic, ErrorCode};
use garnet_ir::{GlobalId, Lazy, MethodId, NodeId, Offset, Span, Template};
use garnet_symbols::{ConstValue, DataValue, Declared, MethodScope, SELF_PARAM};
use garnet_types::WType;

use crate::context::Scope;
use crate::CompilationContext;

impl CompilationContext {
    /// Wrap a value-producing node in `drop` when its value is not wanted.
    /// Returns the node standing in `node`'s place.
    pub fn keep_or_drop(&mut self, node: NodeId, keep_eval: bool) -> NodeId {
        if keep_eval || self.tree.wtype(node).is_blank() {
            node
        } else {
            self.tree.insert_above(node, Template::Drop, WType::Blank)
        }
    }

    /// Integer literal: I32 when it fits, I64 otherwise.
    pub fn int_literal(&mut self, parent: NodeId, value: i64, span: Span) -> NodeId {
        let ty = if i32::try_from(value).is_ok() { WType::I32 } else { WType::I64 };
        let node = self.tree.add(parent, Template::Const(value), ty);
        self.tree.set_span(node, span);
        node
    }

    /// String literal: stored NUL-terminated in static data; the value is
    /// its address.
    pub fn string_literal(&mut self, parent: NodeId, bytes: &[u8], span: Span) -> NodeId {
        let address = self.string_address(bytes);
        let node = self
            .tree
            .add(parent, Template::Const(i64::from(address)), WType::DEFAULT);
        self.tree.set_span(node, span);
        node
    }

    /// Place a NUL-terminated string in static data.
    pub fn string_address(&mut self, bytes: &[u8]) -> u32 {
        let label = self.next_string_label();
        let mut data = bytes.to_vec();
        data.push(0);
        self.symbols.data.append(&label, DataValue::Bytes(data))
    }

    fn require_method(&self, node: NodeId, what: &str, span: Span) -> CompileResult<MethodId> {
        self.method_of(node).ok_or_else(|| {
            Diagnostic::error(ErrorCode::E2003)
                .with_message(format!(
                    "{what} can only be used inside a method, not in {}",
                    self.describe_scope(node)
                ))
                .with_label(span, "outside of any method")
        })
    }

    /// The instance method enclosing `node`, or E2001 naming the ivar.
    pub fn require_instance_method(
        &self,
        node: NodeId,
        name: &str,
        span: Span,
    ) -> CompileResult<MethodId> {
        match self.method_of(node) {
            Some(m) if self.symbols.method(m).scope == MethodScope::Instance => Ok(m),
            _ => Err(Diagnostic::error(ErrorCode::E2001)
                .with_message(format!(
                    "instance variable `@{name}` used in {}",
                    self.describe_scope(node)
                ))
                .with_label(span, "instance variables need an instance method")),
        }
    }

    /// Store that also leaves the stored value on the stack.
    fn keep_stored(
        &mut self,
        store: NodeId,
        reload: Template,
        address: Option<Template>,
        ty: WType,
    ) -> NodeId {
        let block = self.tree.insert_above(store, Template::Block, ty);
        let load = self.tree.add(block, reload, ty);
        if let Some(address) = address {
            self.tree.add(load, address, WType::DEFAULT);
        }
        block
    }

    // ── Locals and arguments ────────────────────────────────────

    pub fn local_get(&mut self, parent: NodeId, name: &str, span: Span) -> CompileResult<NodeId> {
        let method = self.require_method(parent, "a local variable", span)?;
        let Some(ty) = self.symbols.method(method).slot_type(name) else {
            return Err(unknown_name(
                ErrorCode::E1002,
                "local variable",
                name,
                &self.describe_scope(parent),
                span,
            ));
        };
        let node = self.tree.add(parent, Template::LocalGet(name.to_string()), ty);
        self.tree.set_span(node, span);
        Ok(node)
    }

    /// `node` is a `LocalSet` whose only child is the value. The local is
    /// created with the value's type on first assignment.
    pub fn local_assign(
        &mut self,
        node: NodeId,
        name: &str,
        keep_eval: bool,
        span: Span,
    ) -> CompileResult<NodeId> {
        let method = self.require_method(node, "a local variable", span)?;
        let value = self.value_child(node, span)?;
        let ty = self
            .symbols
            .method_mut(method)
            .declare_local(name, self.tree.wtype(value));
        self.cast(value, ty, true, span)?;
        if keep_eval {
            self.tree.set_template(node, Template::LocalTee(name.to_string()));
            self.tree.set_wtype(node, ty);
        } else {
            self.tree.set_template(node, Template::LocalSet(name.to_string()));
            self.tree.set_wtype(node, WType::Blank);
        }
        Ok(node)
    }

    fn value_child(&self, node: NodeId, span: Span) -> CompileResult<NodeId> {
        let value = self
            .tree
            .last_child(node)
            .ok_or_else(|| unsupported("assignment without a value", span))?;
        if self.tree.wtype(value).is_blank() {
            return Err(Diagnostic::error(ErrorCode::E3001)
                .with_message("cannot assign an expression that produces no value")
                .with_label(self.tree.span(value), "this produces nothing"));
        }
        Ok(value)
    }

    // ── Instance variables ──────────────────────────────────────

    pub fn ivar_get(&mut self, parent: NodeId, name: &str, span: Span) -> CompileResult<NodeId> {
        let method = self.require_instance_method(parent, name, span)?;
        let class = self.symbols.method(method).klass;
        let k = self.symbols.class(class);
        let (Some(slot), Some(ivar)) = (k.ivar_slot(name), k.ivar(name)) else {
            return Err(unknown_name(
                ErrorCode::E1002,
                "instance variable",
                &format!("@{name}"),
                &self.describe_scope(parent),
                span,
            ));
        };
        let ty = ivar.wtype;
        let load = self.tree.add(
            parent,
            Template::Load {
                offset: Offset::Lazy(Lazy::IvarOffset { class, slot }),
            },
            ty,
        );
        self.tree.set_span(load, span);
        self.tree
            .add(load, Template::LocalGet(SELF_PARAM.to_string()), WType::Class(class));
        Ok(load)
    }

    /// `node` holds the value as its only child. The first assignment fixes
    /// the variable's type.
    pub fn ivar_assign(
        &mut self,
        node: NodeId,
        name: &str,
        keep_eval: bool,
        span: Span,
    ) -> CompileResult<NodeId> {
        let method = self.require_instance_method(node, name, span)?;
        let class = self.symbols.method(method).klass;
        let value = self.value_child(node, span)?;
        let slot = self
            .symbols
            .declare_ivar(class, name, self.tree.wtype(value), true);
        let ty = self.symbols.class(class).ivars[slot as usize].wtype;
        self.cast(value, ty, true, span)?;

        let receiver = self
            .tree
            .create(Template::LocalGet(SELF_PARAM.to_string()), WType::Class(class));
        self.tree.prepend(node, receiver);
        let offset = Offset::Lazy(Lazy::IvarOffset { class, slot });
        let native = ty.machine_type().unwrap_or(WType::POINTER);
        self.tree
            .set_template(node, Template::Store { ty: native, offset });
        self.tree.set_wtype(node, WType::Blank);
        if !keep_eval {
            return Ok(node);
        }
        Ok(self.keep_stored(
            node,
            Template::Load { offset },
            Some(Template::LocalGet(SELF_PARAM.to_string())),
            ty,
        ))
    }

    // ── Class variables ─────────────────────────────────────────

    /// `@@name = value` in class or root scope.
    pub fn cvar_declare(
        &mut self,
        scope: NodeId,
        name: &str,
        value: i64,
        ty: WType,
        span: Span,
    ) -> CompileResult<()> {
        let class = self.class_of(scope);
        if self.symbols.declare_cvar(class, name, value, ty, span)? == Declared::Unchanged {
            self.warn(redeclared_same("class variable", &format!("@@{name}"), span));
        }
        Ok(())
    }

    pub fn cvar_get(&mut self, parent: NodeId, name: &str, span: Span) -> CompileResult<NodeId> {
        self.require_method(parent, "reading a class variable", span)?;
        let (address, ty) = self.find_cvar(parent, name, span)?;
        let load = self.tree.add(
            parent,
            Template::Load {
                offset: Offset::Fixed(address),
            },
            ty,
        );
        self.tree.set_span(load, span);
        self.tree.add(load, Template::Const(0), WType::DEFAULT);
        Ok(load)
    }

    /// Store into an existing class variable from inside a method.
    pub fn cvar_assign(
        &mut self,
        node: NodeId,
        name: &str,
        keep_eval: bool,
        span: Span,
    ) -> CompileResult<NodeId> {
        self.require_method(node, "assigning a class variable", span)?;
        let (address, ty) = self.find_cvar(node, name, span)?;
        let value = self.value_child(node, span)?;
        self.cast(value, ty, true, span)?;
        let base = self.tree.create(Template::Const(0), WType::DEFAULT);
        self.tree.prepend(node, base);
        let offset = Offset::Fixed(address);
        let native = ty.machine_type().unwrap_or(WType::POINTER);
        self.tree
            .set_template(node, Template::Store { ty: native, offset });
        self.tree.set_wtype(node, WType::Blank);
        if !keep_eval {
            return Ok(node);
        }
        Ok(self.keep_stored(node, Template::Load { offset }, Some(Template::Const(0)), ty))
    }

    fn find_cvar(&self, node: NodeId, name: &str, span: Span) -> CompileResult<(u32, WType)> {
        let class = self.class_of(node);
        self.symbols
            .find_cvar(class, name)
            .map(|cv| (cv.address, cv.wtype))
            .ok_or_else(|| {
                unknown_name(
                    ErrorCode::E1002,
                    "class variable",
                    &format!("@@{name}"),
                    &self.describe_scope(node),
                    span,
                )
            })
    }

    // ── Globals ─────────────────────────────────────────────────

    /// `$name = value` in class or root scope.
    pub fn global_declare(
        &mut self,
        name: &str,
        value: i64,
        ty: WType,
        span: Span,
    ) -> CompileResult<GlobalId> {
        self.symbols.declare_global(name, ty, value, span)
    }

    pub fn global_get(&mut self, parent: NodeId, name: &str, span: Span) -> CompileResult<NodeId> {
        let ty = self.find_global(parent, name, span)?;
        let node = self
            .tree
            .add(parent, Template::GlobalGet(name.to_string()), ty);
        self.tree.set_span(node, span);
        Ok(node)
    }

    pub fn global_assign(
        &mut self,
        node: NodeId,
        name: &str,
        keep_eval: bool,
        span: Span,
    ) -> CompileResult<NodeId> {
        self.require_method(node, "assigning a declared global", span)?;
        let ty = self.find_global(node, name, span)?;
        let value = self.value_child(node, span)?;
        self.cast(value, ty, true, span)?;
        self.tree
            .set_template(node, Template::GlobalSet(name.to_string()));
        self.tree.set_wtype(node, WType::Blank);
        if !keep_eval {
            return Ok(node);
        }
        Ok(self.keep_stored(node, Template::GlobalGet(name.to_string()), None, ty))
    }

    fn find_global(&self, node: NodeId, name: &str, span: Span) -> CompileResult<WType> {
        self.symbols
            .find_global(name)
            .map(|g| self.symbols.global(g).wtype)
            .ok_or_else(|| {
                unknown_name(
                    ErrorCode::E1002,
                    "global",
                    &format!("${name}"),
                    &self.describe_scope(node),
                    span,
                )
            })
    }

    // ── Constants ───────────────────────────────────────────────

    /// `NAME = value` in class or root scope.
    pub fn const_declare(
        &mut self,
        scope: NodeId,
        name: &str,
        value: ConstValue,
        span: Span,
    ) -> CompileResult<()> {
        if let Scope::Method(_) = self.scope_of(scope) {
            return Err(Diagnostic::error(ErrorCode::E2002)
                .with_message(format!(
                    "constant `{name}` cannot be declared in {}",
                    self.describe_scope(scope)
                ))
                .with_label(span, "dynamic constant assignment"));
        }
        let class = self.class_of(scope);
        if self.symbols.declare_const(class, name, value, span)? == Declared::Unchanged {
            self.warn(redeclared_same("constant", name, span));
        }
        Ok(())
    }

    /// Resolve a constant path as seen from `node`.
    pub fn const_value(
        &self,
        node: NodeId,
        segments: &[&str],
        rooted: bool,
        span: Span,
    ) -> CompileResult<ConstValue> {
        let class = self.class_of(node);
        self.symbols
            .lookup_const(segments, rooted, class)
            .ok_or_else(|| {
                unknown_name(
                    ErrorCode::E1001,
                    "constant",
                    &segments.join("::"),
                    &self.describe_scope(node),
                    span,
                )
            })
    }

    /// A constant read in value position.
    pub fn const_get(
        &mut self,
        parent: NodeId,
        segments: &[&str],
        rooted: bool,
        span: Span,
    ) -> CompileResult<NodeId> {
        match self.const_value(parent, segments, rooted, span)? {
            ConstValue::Int(value, ty) => {
                let node = self.tree.add(parent, Template::Const(value), ty);
                self.tree.set_span(node, span);
                Ok(node)
            }
            ConstValue::Class(_) => Err(unsupported("a class used as a value", span)),
        }
    }
}

#[cold]
fn redeclared_same(kind: &str, name: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(ErrorCode::W4001)
        .with_message(format!("{kind} `{name}` is declared again with the same value"))
        .with_label(span, "redundant declaration")
}
