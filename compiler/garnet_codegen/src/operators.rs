//! Native operators, pointer arithmetic and constant folding.

use garnet_diagnostic::{internal, CompileResult, Diagnostic, ErrorCode};
use garnet_ir::{BinOp, MethodId, NodeId, RelOp, Span, Template, UnOp};
use garnet_symbols::{MethodFlags, MethodScope};
use garnet_types::{leading_type, ClassId, NativeType, WType};

use crate::CompilationContext;

impl CompilationContext {
    /// Turn a send node whose children are `[receiver, args...]` into a
    /// native operator application.
    ///
    /// Operands are promoted to their leading type first. A class-typed
    /// receiver switches to pointer arithmetic. Returns the node standing
    /// in the send's place.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn operator(&mut self, node: NodeId, name: &str, span: Span) -> CompileResult<NodeId> {
        let children = self.tree.children(node).to_vec();
        let Some((&receiver, args)) = children.split_first() else {
            return Err(internal(format!("operator `{name}` without a receiver")));
        };
        let receiver_ty = self.tree.wtype(receiver);
        if let WType::Class(class) = receiver_ty {
            return self.pointer_operator(node, class, name, args, span);
        }
        match args {
            [] => self.unary_operator(node, receiver, name, span),
            [arg] => self.binary_operator(node, receiver, *arg, name, span),
            _ => Err(arity_error(name, 1, args.len(), span)),
        }
    }

    fn binary_operator(
        &mut self,
        node: NodeId,
        lhs: NodeId,
        rhs: NodeId,
        name: &str,
        span: Span,
    ) -> CompileResult<NodeId> {
        let (binop, relop) = (BinOp::from_method(name), RelOp::from_method(name));
        let lhs_ty = self.tree.wtype(lhs);
        if binop.is_none() && relop.is_none() {
            return Err(self.unknown_operator(lhs_ty, name, span));
        }
        let rhs_ty = self.tree.wtype(rhs);
        let Some(leading) = leading_type([lhs_ty, rhs_ty]) else {
            return Err(self.not_applicable(lhs_ty, name, span));
        };
        let Some(native) = leading.native() else {
            return Err(internal("leading type is not native"));
        };
        if native.is_float() {
            return Err(float_arithmetic(name, span));
        }
        self.promote(lhs, leading)?;
        self.promote(rhs, leading)?;

        if let Some(op) = binop {
            self.tree.set_template(node, Template::Binary(op));
            self.tree.set_wtype(node, leading);
        } else if let Some(op) = relop {
            self.tree
                .set_template(node, Template::Compare { op, operand: native });
            self.tree.set_wtype(node, WType::DEFAULT);
        }
        Ok(self.fold(node))
    }

    fn unary_operator(
        &mut self,
        node: NodeId,
        operand: NodeId,
        name: &str,
        span: Span,
    ) -> CompileResult<NodeId> {
        let ty = self.tree.wtype(operand);
        let Some(native) = ty.native() else {
            return Err(self.not_applicable(ty, name, span));
        };
        if native.is_float() {
            return Err(float_arithmetic(name, span));
        }
        match name {
            "-@" => {
                let zero = self.tree.create(Template::Const(0), ty);
                self.tree.prepend(node, zero);
                self.tree.set_template(node, Template::Binary(BinOp::Sub));
                self.tree.set_wtype(node, ty);
            }
            "~" => {
                self.tree.add(node, Template::Const(-1), ty);
                self.tree.set_template(node, Template::Binary(BinOp::Xor));
                self.tree.set_wtype(node, ty);
            }
            "!" => {
                self.tree.set_template(node, Template::Unary(UnOp::Eqz));
                self.tree.set_wtype(node, WType::DEFAULT);
            }
            _ => {
                let Some(op) = UnOp::from_method(name) else {
                    return Err(self.unknown_operator(ty, name, span));
                };
                self.tree.set_template(node, Template::Unary(op));
                self.tree
                    .set_wtype(node, WType::Native(op.result_type(native)));
            }
        }
        Ok(self.fold(node))
    }

    /// Arithmetic on class references.
    ///
    /// `ptr + n` and `ptr - n` move by `n` instances; `ptr - other` is the
    /// distance in instances; comparisons yield an I32 boolean.
    fn pointer_operator(
        &mut self,
        node: NodeId,
        class: ClassId,
        name: &str,
        args: &[NodeId],
        span: Span,
    ) -> CompileResult<NodeId> {
        let receiver = self.tree.children(node)[0];
        let pointer = WType::Native(WType::POINTER);
        if args.is_empty() {
            if !matches!(name, "!" | "zero?") {
                return Err(self.not_applicable(WType::Class(class), name, span));
            }
            self.tree.set_wtype(receiver, pointer);
            self.tree.set_template(node, Template::Unary(UnOp::Eqz));
            self.tree.set_wtype(node, WType::DEFAULT);
            return Ok(node);
        }
        let [arg] = args else {
            return Err(arity_error(name, 1, args.len(), span));
        };
        let arg = *arg;
        let arg_ty = self.tree.wtype(arg);

        if let Some(op) = RelOp::from_method(name) {
            self.cast(receiver, pointer, false, span)?;
            self.cast(arg, pointer, false, span)?;
            self.tree
                .set_template(node, Template::Compare { op, operand: WType::POINTER });
            self.tree.set_wtype(node, WType::DEFAULT);
            return Ok(node);
        }

        let op = match name {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            _ => return Err(self.not_applicable(WType::Class(class), name, span)),
        };
        let size = self.size_method(class);

        if op == BinOp::Sub && arg_ty.is_class() {
            if arg_ty != WType::Class(class) {
                return Err(Diagnostic::error(ErrorCode::E3003)
                    .with_message(format!(
                        "cannot subtract {} from {}",
                        self.symbols.describe(arg_ty),
                        self.symbols.describe(WType::Class(class))
                    ))
                    .with_label(span, "pointer difference needs two references of the same class"));
            }
            tracing::trace!(?node, class = %self.symbols.class_path(class), "pointer difference");
            self.tree.set_wtype(receiver, pointer);
            self.tree.set_wtype(arg, pointer);
            self.tree.set_template(node, Template::Binary(BinOp::Sub));
            self.tree.set_wtype(node, pointer);
            let quotient = self.tree.insert_above(node, Template::Binary(BinOp::Div), pointer);
            self.tree.add(quotient, Template::Call(size), pointer);
            return Ok(quotient);
        }

        if !arg_ty.is_integer() {
            return Err(self.not_applicable(arg_ty, name, span));
        }
        let arg = self.cast(arg, pointer, true, span)?;
        let scaled = self.tree.insert_above(arg, Template::Binary(BinOp::Mul), pointer);
        self.tree.add(scaled, Template::Call(size), pointer);
        self.tree.set_template(node, Template::Binary(op));
        self.tree.set_wtype(node, WType::Class(class));
        Ok(node)
    }

    /// The `_size_` class method of `class`, declared on first use. Its body
    /// is generated when the class is finalized. A forward-called `_size_`
    /// without a user definition is claimed here too.
    pub fn size_method(&mut self, class: ClassId) -> MethodId {
        let id = self
            .symbols
            .declare_method(class, "_size_", MethodScope::Class, Span::DUMMY);
        let m = self.symbols.method(id);
        if !m.is_synthesized() && !m.is_implemented() && !m.is_imported() {
            let m = self.symbols.method_mut(id);
            m.flags |= MethodFlags::SYNTHESIZED;
            m.wtype = WType::DEFAULT;
        }
        id
    }

    /// Reduce the value at `node` to an I32 truth value.
    pub fn condition(&mut self, node: NodeId) -> CompileResult<NodeId> {
        let ty = self.tree.wtype(node);
        match ty {
            WType::Native(NativeType::I32) => Ok(node),
            WType::Class(_) => {
                self.tree.set_wtype(node, WType::DEFAULT);
                Ok(node)
            }
            WType::Native(NativeType::I64) => {
                let test = self.tree.insert_above(
                    node,
                    Template::Compare {
                        op: RelOp::Ne,
                        operand: NativeType::I64,
                    },
                    WType::DEFAULT,
                );
                self.tree.add(test, Template::Const(0), WType::I64);
                Ok(self.fold(test))
            }
            WType::Native(_) => Err(float_arithmetic("condition", self.tree.span(node))),
            WType::Blank => Err(Diagnostic::error(ErrorCode::E3001)
                .with_message("condition has no value")
                .with_label(self.tree.span(node), "this expression produces nothing")),
        }
    }

    /// Replace an operator applied to literals by its value.
    pub fn fold(&mut self, node: NodeId) -> NodeId {
        if !self.options.fold_constants {
            return node;
        }
        let literals: Vec<i64> = self
            .tree
            .children(node)
            .iter()
            .map_while(|&c| match self.tree.template(c) {
                Template::Const(v) => Some(*v),
                _ => None,
            })
            .collect();
        if literals.len() != self.tree.children(node).len() {
            return node;
        }
        let ty = self.tree.wtype(node);
        let value = match (self.tree.template(node), literals.as_slice()) {
            (Template::Binary(op), [a, b]) => ty.native().and_then(|n| op.apply(n, *a, *b)),
            (Template::Compare { op, .. }, [a, b]) => Some(i64::from(op.apply(*a, *b))),
            (Template::Unary(op), [a]) => {
                let operand = self.tree.wtype(self.tree.children(node)[0]);
                operand.native().and_then(|n| op.apply(n, *a))
            }
            _ => None,
        };
        if let Some(value) = value {
            tracing::trace!(?node, value, "folded");
            self.tree.clear_children(node);
            self.tree.set_template(node, Template::Const(value));
        }
        node
    }

    #[cold]
    fn not_applicable(&self, ty: WType, name: &str, span: Span) -> Diagnostic {
        let ty = self.symbols.describe(ty);
        Diagnostic::error(ErrorCode::E3003)
            .with_message(format!("operator `{name}` is not applicable to {ty}"))
            .with_label(span, format!("receiver is {ty}"))
    }

    #[cold]
    fn unknown_operator(&self, ty: WType, name: &str, span: Span) -> Diagnostic {
        let ty = self.symbols.describe(ty);
        Diagnostic::error(ErrorCode::E1003)
            .with_message(format!("unknown method `{name}` for {ty}"))
            .with_label(span, "not a native operator")
    }
}

#[cold]
pub(crate) fn arity_error(name: &str, expected: usize, found: usize, span: Span) -> Diagnostic {
    Diagnostic::error(ErrorCode::E3006)
        .with_message(format!(
            "`{name}` takes {expected} argument{}, {found} given",
            if expected == 1 { "" } else { "s" }
        ))
        .with_label(span, "wrong number of arguments")
}

#[cold]
fn float_arithmetic(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(ErrorCode::E3002)
        .with_message(format!("`{name}` on floating point values is not supported"))
        .with_label(span, "floating point operand")
}
