//! Class bodies, method definitions and synthesized methods.
//!
//! Closing a class generates the methods every class has unless the user
//! wrote them: `_size_` (instance size), an empty `initialize`, `new`
//! (allocate, initialize, return the object) and the accessor methods
//! declared by `attr_*` directives. Reopening a class regenerates them so
//! they see the final layout.

use garnet_diagnostic::{CompileResult, Diagnostic, ErrorCode};
use garnet_ir::{Lazy, MethodId, NodeId, Offset, Span, Template};
use garnet_symbols::{Attr, ClassKind, MethodFlags, MethodScope, Slot, OBJECT, SELF_PARAM};
use garnet_types::{ClassId, WType};

use crate::calls::CallReceiver;
use crate::CompilationContext;

/// Local holding the fresh object inside a synthesized `new`.
const NEW_OBJECT: &str = "_obj_";

impl CompilationContext {
    /// Open a class or module body under `parent`, nested in the class
    /// enclosing `parent`.
    pub fn begin_class(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: ClassKind,
        superclass: Option<ClassId>,
        span: Span,
    ) -> CompileResult<(ClassId, NodeId)> {
        let lexical = self.class_of(parent);
        self.begin_class_in(parent, lexical, name, kind, superclass, span)
    }

    /// Like [`begin_class`](Self::begin_class) with an explicit namespace,
    /// for `class A::B` definitions.
    pub fn begin_class_in(
        &mut self,
        parent: NodeId,
        lexical: ClassId,
        name: &str,
        kind: ClassKind,
        superclass: Option<ClassId>,
        span: Span,
    ) -> CompileResult<(ClassId, NodeId)> {
        if let Some(method) = self.method_of(parent) {
            return Err(Diagnostic::error(ErrorCode::E2002)
                .with_message(format!("{} definition inside a method", kind.keyword()))
                .with_label(span, format!("inside `{}`", self.symbols.describe_method(method))));
        }
        let class = self
            .symbols
            .define_class(name, lexical, kind, superclass, span)?;
        let body = self.tree.add(parent, Template::ClassBody(class), WType::Blank);
        self.tree.set_span(body, span);
        Ok((class, body))
    }

    /// Close a class body: fix its resolution order and generate the
    /// synthesized methods.
    #[tracing::instrument(
        level = "debug",
        skip(self),
        fields(class = %self.symbols.class_path(class))
    )]
    pub fn finish_class(&mut self, class: ClassId, body: NodeId) -> CompileResult<()> {
        self.symbols.finalize(class);
        let attrs = self.symbols.class(class).attrs.clone();
        for attr in &attrs {
            self.synthesize_accessors(class, body, attr)?;
        }
        if self.symbols.class(class).kind == ClassKind::Module {
            return Ok(());
        }
        self.synthesize_size(class, body);
        self.synthesize_initialize(class, body);
        self.synthesize_new(class, body)
    }

    /// Start the definition of `name` on `class` under `parent`.
    ///
    /// Methods that were only declared so far (forward references,
    /// directives) keep their declared types. Redefining a method the user
    /// already wrote is an error; redefining a synthesized one replaces it.
    pub fn begin_method(
        &mut self,
        parent: NodeId,
        class: ClassId,
        name: &str,
        scope: MethodScope,
        span: Span,
    ) -> CompileResult<(MethodId, NodeId)> {
        if let Some(outer) = self.method_of(parent) {
            return Err(Diagnostic::error(ErrorCode::E2002)
                .with_message(format!("method `{name}` defined inside another method"))
                .with_label(span, format!("inside `{}`", self.symbols.describe_method(outer))));
        }
        let id = self.symbols.declare_method(class, name, scope, span);
        let m = self.symbols.method(id);
        if m.is_implemented() && !m.is_synthesized() {
            return Err(Diagnostic::error(ErrorCode::E4001)
                .with_message(format!(
                    "method `{}` is already defined",
                    self.symbols.describe_method(id)
                ))
                .with_label(span, "redefined here")
                .with_secondary_label(m.span, "first defined here"));
        }
        if m.is_synthesized() {
            self.discard_body(id);
            let m = self.symbols.method_mut(id);
            m.flags = MethodFlags::empty();
            m.wtype = WType::DEFAULT;
        }
        // Parameters assumed by forward calls are replaced by the real ones;
        // the link check compares the two.
        let m = self.symbols.method_mut(id);
        m.params.clear();
        m.locals.clear();

        let node = self.tree.add(parent, Template::Method(id), WType::Blank);
        self.tree.set_span(node, span);
        let m = self.symbols.method_mut(id);
        m.body = Some(node);
        m.flags |= MethodFlags::IMPLEMENTED;
        m.span = span;
        if name == "initialize"
            && scope == MethodScope::Instance
            && !m.flags.contains(MethodFlags::DECLARED_RESULT)
        {
            m.wtype = WType::Blank;
        }
        tracing::debug!(method = %self.symbols.describe_method(id), "begin method");
        Ok((id, node))
    }

    /// Declare a parameter of the method being defined.
    pub fn method_param(&mut self, method: MethodId, name: &str, span: Span) -> CompileResult<()> {
        let m = self.symbols.method_mut(method);
        if m.param(name).is_some() || name == SELF_PARAM {
            return Err(Diagnostic::error(ErrorCode::E4001)
                .with_message(format!("duplicate parameter `{name}`"))
                .with_label(span, "declared twice"));
        }
        m.add_param(name, WType::DEFAULT);
        Ok(())
    }

    /// Check the body's last statement against the declared result and
    /// insert the needed cast or drop.
    pub fn finish_method(&mut self, method: MethodId, node: NodeId) -> CompileResult<()> {
        let m = self.symbols.method(method);
        let expected = m.wtype;
        if m.is_imported() {
            tracing::debug!(
                method = %self.symbols.describe_method(method),
                "imported, body dropped"
            );
            self.tree.detach(node);
            let m = self.symbols.method_mut(method);
            m.body = None;
            m.flags.remove(MethodFlags::IMPLEMENTED);
            return Ok(());
        }
        let Some(last) = self.tree.last_child(node) else {
            if expected.is_blank() {
                return Ok(());
            }
            return Err(self.result_mismatch(method, WType::Blank, self.tree.span(node)));
        };
        if self.tree.template(last).is_terminator() {
            return Ok(());
        }
        let found = self.tree.wtype(last);
        let span = self.tree.span(last);
        match (expected.is_blank(), found.is_blank()) {
            (true, true) => {}
            (true, false) => {
                self.tree.insert_above(last, Template::Drop, WType::Blank);
            }
            (false, true) => return Err(self.result_mismatch(method, found, span)),
            (false, false) => {
                self.cast(last, expected, true, span)
                    .map_err(|_| self.result_mismatch(method, found, span))?;
            }
        }
        Ok(())
    }

    /// Declare accessors for the ivar `name` of `class`.
    pub fn declare_attr(
        &mut self,
        class: ClassId,
        name: &str,
        reader: bool,
        writer: bool,
        span: Span,
    ) -> CompileResult<()> {
        if self.symbols.class(class).is_module() {
            return Err(Diagnostic::error(ErrorCode::E2006)
                .with_message("accessors can only be declared in a class")
                .with_label(span, format!("`{}` is a module", self.symbols.class_path(class))));
        }
        self.symbols.declare_ivar(class, name, WType::DEFAULT, false);
        let k = self.symbols.class_mut(class);
        match k.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => {
                attr.reader |= reader;
                attr.writer |= writer;
            }
            None => k.attrs.push(Attr {
                name: name.to_string(),
                reader,
                writer,
                span,
            }),
        }
        if reader {
            self.declare_synthesized(class, name, MethodScope::Instance, span);
        }
        if writer {
            self.declare_synthesized(class, &format!("{name}="), MethodScope::Instance, span);
        }
        self.refresh_accessor_types(class, name);
        Ok(())
    }

    /// `attr_type`: fix the type of an accessor-backed ivar.
    pub fn attr_type(
        &mut self,
        class: ClassId,
        name: &str,
        wtype: WType,
        span: Span,
    ) -> CompileResult<()> {
        if let Some(existing) = self.symbols.class(class).ivar(name) {
            if existing.fixed && existing.wtype != wtype {
                return Err(Diagnostic::error(ErrorCode::E4005)
                    .with_message(format!(
                        "`@{name}` already has type {}",
                        self.symbols.describe(existing.wtype)
                    ))
                    .with_label(span, format!("declared as {}", self.symbols.describe(wtype))));
            }
        }
        self.symbols.declare_ivar(class, name, wtype, true);
        self.refresh_accessor_types(class, name);
        Ok(())
    }

    fn refresh_accessor_types(&mut self, class: ClassId, name: &str) {
        let Some(ty) = self.symbols.class(class).ivar(name).map(|i| i.wtype) else {
            return;
        };
        let k = self.symbols.class(class);
        let reader = k.method(name, MethodScope::Instance);
        let writer = k.method(&format!("{name}="), MethodScope::Instance);
        if let Some(id) = reader.filter(|&id| self.symbols.method(id).is_synthesized()) {
            self.symbols.method_mut(id).wtype = ty;
        }
        if let Some(id) = writer.filter(|&id| self.symbols.method(id).is_synthesized()) {
            let m = self.symbols.method_mut(id);
            m.wtype = WType::Blank;
            m.params = vec![Slot {
                name: "value".to_string(),
                wtype: ty,
            }];
        }
    }

    /// Declare a compiler-provided method unless the user defined one.
    fn declare_synthesized(
        &mut self,
        class: ClassId,
        name: &str,
        scope: MethodScope,
        span: Span,
    ) -> Option<MethodId> {
        let existing = self.symbols.class(class).method(name, scope);
        let id = self.symbols.declare_method(class, name, scope, span);
        let m = self.symbols.method_mut(id);
        if existing.is_some() && !m.is_synthesized() && (m.is_implemented() || m.is_imported()) {
            return None;
        }
        m.flags |= MethodFlags::SYNTHESIZED;
        Some(id)
    }

    /// Drop the previously generated body of `method`, if any.
    fn discard_body(&mut self, method: MethodId) {
        if let Some(old) = self.symbols.method_mut(method).body.take() {
            self.tree.detach(old);
        }
    }

    /// Replace the body of a synthesized method with a fresh function
    /// node under `class_body`.
    fn regenerate(&mut self, method: MethodId, class_body: NodeId) -> NodeId {
        self.discard_body(method);
        let node = self.tree.add(class_body, Template::Method(method), WType::Blank);
        let m = self.symbols.method_mut(method);
        m.body = Some(node);
        m.flags |= MethodFlags::IMPLEMENTED | MethodFlags::SYNTHESIZED;
        node
    }

    fn synthesize_accessors(
        &mut self,
        class: ClassId,
        body: NodeId,
        attr: &Attr,
    ) -> CompileResult<()> {
        let Some(slot) = self.symbols.class(class).ivar_slot(&attr.name) else {
            return Ok(());
        };
        let ty = self.symbols.class(class).ivars[slot as usize].wtype;
        let offset = Offset::Lazy(Lazy::IvarOffset { class, slot });
        let k = self.symbols.class(class);
        let reader = k.method(&attr.name, MethodScope::Instance);
        let writer = k.method(&format!("{}=", attr.name), MethodScope::Instance);

        if let Some(id) =
            reader.filter(|&id| attr.reader && self.symbols.method(id).is_synthesized())
        {
            self.symbols.method_mut(id).wtype = ty;
            let node = self.regenerate(id, body);
            let load = self.tree.add(node, Template::Load { offset }, ty);
            self.tree
                .add(load, Template::LocalGet(SELF_PARAM.to_string()), WType::Class(class));
        }
        if let Some(id) =
            writer.filter(|&id| attr.writer && self.symbols.method(id).is_synthesized())
        {
            let Some(stored) = ty.machine_type() else {
                return Err(garnet_diagnostic::internal("accessor without a machine type"));
            };
            let m = self.symbols.method_mut(id);
            m.wtype = WType::Blank;
            m.params = vec![Slot {
                name: "value".to_string(),
                wtype: ty,
            }];
            let node = self.regenerate(id, body);
            let store = self.tree.add(node, Template::Store { ty: stored, offset }, WType::Blank);
            self.tree
                .add(store, Template::LocalGet(SELF_PARAM.to_string()), WType::Class(class));
            self.tree
                .add(store, Template::LocalGet("value".to_string()), ty);
        }
        Ok(())
    }

    fn synthesize_size(&mut self, class: ClassId, body: NodeId) {
        let id = self.size_method(class);
        if !self.symbols.method(id).is_synthesized() {
            return;
        }
        self.symbols.method_mut(id).wtype = WType::DEFAULT;
        let node = self.regenerate(id, body);
        self.tree
            .add(node, Template::ConstLazy(Lazy::ClassSize(class)), WType::DEFAULT);
    }

    /// An empty `initialize`, unless one is inherited.
    fn synthesize_initialize(&mut self, class: ClassId, body: NodeId) {
        let inherited = self
            .symbols
            .lookup_instance_method(class, "initialize")
            .is_some_and(|m| self.symbols.method(m).klass != class);
        if inherited {
            return;
        }
        let Some(id) =
            self.declare_synthesized(class, "initialize", MethodScope::Instance, Span::DUMMY)
        else {
            return;
        };
        if self.symbols.method(id).is_implemented() {
            return;
        }
        self.symbols.method_mut(id).wtype = WType::Blank;
        self.regenerate(id, body);
    }

    /// The `new` class method of `class`, declared with the parameters of
    /// `initialize` as they are known now. Returns `None` when the user
    /// wrote their own.
    pub fn new_method(&mut self, class: ClassId) -> Option<MethodId> {
        let id = self.declare_synthesized(class, "new", MethodScope::Class, Span::DUMMY)?;
        let params = self
            .symbols
            .lookup_instance_method(class, "initialize")
            .map(|init| self.symbols.method(init).params.clone())
            .unwrap_or_default();
        let m = self.symbols.method_mut(id);
        m.params = params;
        m.wtype = WType::Class(class);
        Some(id)
    }

    /// `new`: `_obj_ = allocate(_size_)` (or a static address for classes
    /// without fields), `_obj_.initialize(args)`, then `_obj_`.
    fn synthesize_new(&mut self, class: ClassId, body: NodeId) -> CompileResult<()> {
        let Some(id) = self.new_method(class) else {
            return Ok(());
        };
        let this = WType::Class(class);
        self.symbols.method_mut(id).locals = vec![Slot {
            name: NEW_OBJECT.to_string(),
            wtype: this,
        }];
        let node = self.regenerate(id, body);

        let assign = self
            .tree
            .add(node, Template::LocalSet(NEW_OBJECT.to_string()), WType::Blank);
        if self.symbols.class_size(class) == 0 {
            let address = self.symbols.data.align(4);
            self.tree.add(assign, Template::Const(i64::from(address)), this);
        } else {
            let allocator = self.allocator();
            let alloc = self.tree.add(assign, Template::Nop, WType::Blank);
            let size = self.size_method(class);
            self.tree.add(alloc, Template::Call(size), WType::DEFAULT);
            self.call(alloc, allocator, CallReceiver::Absent, Span::DUMMY)?;
            self.cast(alloc, this, false, Span::DUMMY)?;
        }

        let Some(init) = self
            .symbols
            .lookup_instance_method(class, "initialize")
        else {
            return Err(garnet_diagnostic::internal("class without `initialize`"));
        };
        let init_call = self.tree.add(node, Template::Nop, WType::Blank);
        self.tree
            .add(init_call, Template::LocalGet(NEW_OBJECT.to_string()), this);
        let params = self.symbols.method(id).params.clone();
        for p in &params {
            self.tree
                .add(init_call, Template::LocalGet(p.name.clone()), p.wtype);
        }
        self.call(init_call, init, CallReceiver::InNode, Span::DUMMY)?;
        self.keep_or_drop(init_call, false);
        self.tree
            .add(node, Template::LocalGet(NEW_OBJECT.to_string()), this);
        tracing::debug!(class = %self.symbols.class_path(class), "synthesized new");
        Ok(())
    }

    /// The class method objects are allocated with, declared on `Object`
    /// when the configured class does not exist.
    fn allocator(&mut self) -> MethodId {
        let (path, name) = self.options.allocator.clone();
        let class = self.symbols.find_class(&path).unwrap_or(OBJECT);
        if let Some((id, _)) = self.symbols.lookup_class_method(class, &name) {
            return id;
        }
        let id = self
            .symbols
            .declare_method(class, &name, MethodScope::Class, Span::DUMMY);
        self.symbols.method_mut(id).add_param("nbytes", WType::DEFAULT);
        id
    }
}
