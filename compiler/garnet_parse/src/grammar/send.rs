//! Method calls, operators, casts and the static data registry.
//!
//! A send is resolved by what its receiver is:
//!
//! - no receiver: a directive, else a method of the enclosing class
//! - the `DAta` constant: a static data operation
//! - a class path (or `self` in a class method): a class method call
//! - any other expression: an instance method call on a class-typed
//!   value, or a native operator

use garnet_ast::{Child, NodeKind, SyntaxNode};
use garnet_codegen::CallReceiver;
use garnet_diagnostic::{internal, malformed, CompileResult, Diagnostic, ErrorCode};
use garnet_ir::{BinOp, MethodId, NodeId, RelOp, Span, UnOp};
use garnet_symbols::{ClassKind, ConstValue, DataValue, MethodScope};
use garnet_types::{ClassId, WType};

use crate::Parser;

/// Name of the static data registry constant.
pub(crate) const DATA_REGISTRY: &str = "DAta";

impl Parser<'_> {
    /// `(send receiver name args...)`.
    pub(super) fn parse_send(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
    ) -> CompileResult<Option<NodeId>> {
        let name = node.expect_symbol(1)?;
        let args: Vec<&SyntaxNode> =
            node.children.iter().skip(2).filter_map(Child::as_node).collect();
        match node.children.first() {
            Some(Child::Nil) => {
                if Self::is_directive(name) {
                    return self.parse_directive(parent, node, name, &args);
                }
                self.parse_self_call(parent, node, name, &args).map(Some)
            }
            Some(Child::Node(receiver)) => {
                if is_data_registry(receiver) {
                    return self.parse_data(parent, node, name, &args);
                }
                self.require_method_scope(parent, node)?;
                if name == "cast_to" {
                    return self.parse_cast(parent, node, receiver, &args).map(Some);
                }
                if let Some(class) = self.class_receiver(parent, receiver)? {
                    return self.parse_class_call(parent, node, class, name, &args).map(Some);
                }
                let call = self.placeholder(parent, node.span);
                self.parse_value(call, receiver)?;
                for arg in &args {
                    self.parse_value(call, arg)?;
                }
                self.apply_method(call, name, node.span).map(Some)
            }
            _ => Err(malformed("send", "a receiver or nil", node.span)),
        }
    }

    /// A call without receiver, resolved in the enclosing class.
    ///
    /// Inside an instance method the class's instance methods come first,
    /// then class methods (including `Object`'s, where root-level `def`s
    /// live). A name not found yet is declared on the enclosing class and
    /// must be defined before the unit ends.
    fn parse_self_call(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
        name: &str,
        args: &[&SyntaxNode],
    ) -> CompileResult<NodeId> {
        let span = node.span;
        let Some(current) = self.ctx.method_of(parent) else {
            return Err(Diagnostic::error(ErrorCode::E2003)
                .with_message(format!("call to `{name}` in {}", self.ctx.describe_scope(parent)))
                .with_label(span, "calls are only allowed inside a method")
                .with_note("only declarations and directives may appear at class or root scope"));
        };
        let (klass, scope) = {
            let m = self.ctx.symbols.method(current);
            (m.klass, m.scope)
        };
        let (target, receiver) = self.resolve_self_call(klass, scope, name, span);

        let call = self.placeholder(parent, span);
        for arg in args {
            self.parse_value(call, arg)?;
        }
        self.ctx.call(call, target, receiver, span)
    }

    fn resolve_self_call(
        &mut self,
        klass: ClassId,
        scope: MethodScope,
        name: &str,
        span: Span) -> (MethodId, CallReceiver,
    ) {
        if scope == MethodScope::Instance {
            if let Some(m) = self.ctx.symbols.lookup_instance_method(klass, name) {
                return (m, CallReceiver::SelfRef);
            }
        }
        if let Some((m, via_extend)) = self.ctx.symbols.lookup_class_method(klass, name) {
            return (m, class_receiver_kind(via_extend));
        }
        tracing::debug!(name, class = %self.ctx.symbols.class_path(klass), "forward call");
        let m = self.ctx.symbols.declare_method(klass, name, scope, span);
        let receiver = match scope {
            MethodScope::Instance => CallReceiver::SelfRef,
            MethodScope::Class => CallReceiver::Absent,
        };
        (m, receiver)
    }

    /// The class a receiver names, if it names one.
    fn class_receiver(
        &self,
        parent: NodeId,
        receiver: &SyntaxNode,
    ) -> CompileResult<Option<ClassId>> {
        match receiver.kind {
            NodeKind::Const => {
                let Some((segments, rooted)) = receiver.const_path() else {
                    return Err(malformed("const", "a constant path", receiver.span));
                };
                match self.ctx.const_value(parent, &segments, rooted, receiver.span)? {
                    ConstValue::Class(class) => Ok(Some(class)),
                    ConstValue::Int(..) => Ok(None),
                }
            }
            NodeKind::SelfRef => Ok(self
                .ctx
                .method_of(parent)
                .map(|m| self.ctx.symbols.method(m))
                .filter(|m| m.scope == MethodScope::Class)
                .map(|m| m.klass)),
            _ => Ok(None),
        }
    }

    /// `Klass.name(args)`. `new` gets the synthesized constructor unless
    /// the class defines its own.
    fn parse_class_call(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
        class: ClassId,
        name: &str,
        args: &[&SyntaxNode],
    ) -> CompileResult<NodeId> {
        let span = node.span;
        let (target, receiver) = if name == "new" {
            (self.constructor(class, span)?, CallReceiver::Absent)
        } else {
            match self.ctx.symbols.lookup_class_method(class, name) {
                Some((m, via_extend)) => (m, class_receiver_kind(via_extend)),
                None => {
                    tracing::debug!(
                        name,
                        class = %self.ctx.symbols.class_path(class),
                        "forward call"
                    );
                    let m = self
                        .ctx
                        .symbols
                        .declare_method(class, name, MethodScope::Class, span);
                    (m, CallReceiver::Absent)
                }
            }
        };

        let call = self.placeholder(parent, span);
        for arg in args {
            self.parse_value(call, arg)?;
        }
        self.ctx.call(call, target, receiver, span)
    }

    fn constructor(&mut self, class: ClassId, span: Span) -> CompileResult<MethodId> {
        if self.ctx.symbols.class(class).kind == ClassKind::Module {
            return Err(Diagnostic::error(ErrorCode::E1003)
                .with_message(format!(
                    "module `{}` cannot be instantiated",
                    self.ctx.symbols.class_path(class)
                ))
                .with_label(span, "`new` called on a module"));
        }
        if let Some(m) = self.ctx.new_method(class) {
            return Ok(m);
        }
        self.ctx
            .symbols
            .class(class)
            .method("new", MethodScope::Class)
            .ok_or_else(|| internal("class without a `new` method"))
    }

    /// Finish a call node whose first child is the receiver value. Methods
    /// a class defines win over the built-in operators.
    pub(super) fn apply_method(
        &mut self,
        call: NodeId,
        name: &str,
        span: Span,
    ) -> CompileResult<NodeId> {
        let Some(receiver) = self.ctx.tree.first_child(call) else {
            return Err(internal(format!("call to `{name}` without a receiver")));
        };
        let WType::Class(class) = self.ctx.tree.wtype(receiver) else {
            return self.ctx.operator(call, name, span);
        };
        if let Some(m) = self.ctx.symbols.lookup_instance_method(class, name) {
            return self.ctx.call(call, m, CallReceiver::InNode, span);
        }
        if is_operator(name) {
            return self.ctx.operator(call, name, span);
        }
        tracing::debug!(name, class = %self.ctx.symbols.class_path(class), "forward call");
        let m = self
            .ctx
            .symbols
            .declare_method(class, name, MethodScope::Instance, span);
        self.ctx.call(call, m, CallReceiver::InNode, span)
    }

    /// `value.cast_to(:Type)` / `value.cast_to(:Type, :signed)`.
    fn parse_cast(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
        receiver: &SyntaxNode,
        args: &[&SyntaxNode],
    ) -> CompileResult<NodeId> {
        let (ty, signed) = match args {
            [ty] => (*ty, false),
            [ty, flag] if flag.sym_value() == Some("signed") => (*ty, true),
            _ => {
                return Err(Self::bad_arguments(
                    "cast_to",
                    "a type and optionally `:signed`",
                    node.span,
                ))
            }
        };
        let ty = self.type_argument(parent, ty)?;
        let value = self.parse_value(parent, receiver)?;
        self.ctx.cast(value, ty, signed, node.span)
    }

    // ── Static data ─────────────────────────────────────────────

    /// `DAta[:label] = v`, `DAta.append(:label, v)`, `DAta[:label]`,
    /// `DAta.address = n`, `DAta.address`, `DAta.align(n)`.
    fn parse_data(
        &mut self,
        parent: NodeId,
        node: &SyntaxNode,
        name: &str,
        args: &[&SyntaxNode],
    ) -> CompileResult<Option<NodeId>> {
        let span = node.span;
        match (name, args) {
            ("[]=", [label, value]) => {
                let label = Self::data_label(label)?;
                let value = self.data_value(parent, value)?;
                let address = self.ctx.symbols.data.declare(&label, value, span)?;
                tracing::debug!(%label, address, "data declared");
                Ok(None)
            }
            ("append", [label, value]) => {
                let label = Self::data_label(label)?;
                let value = self.data_value(parent, value)?;
                self.ctx.symbols.data.append(&label, value);
                Ok(None)
            }
            ("align", [n]) => {
                let n = self.data_int(parent, n, "align")?;
                self.ctx.symbols.data.align(n);
                Ok(None)
            }
            ("address=", [value]) => {
                let address = self.data_int(parent, value, "address=")?;
                self.ctx.symbols.data.set_address(address, span)?;
                Ok(None)
            }
            ("[]", [label]) => {
                self.require_method_scope(parent, node)?;
                let label = Self::data_label(label)?;
                let Some(address) = self.ctx.symbols.data.label_address(&label) else {
                    return Err(Diagnostic::error(ErrorCode::E1002)
                        .with_message(format!("unknown data label `{label}`"))
                        .with_label(span, "no data declared under this label"));
                };
                Ok(Some(self.ctx.int_literal(parent, i64::from(address), span)))
            }
            ("address", []) => {
                self.require_method_scope(parent, node)?;
                let address = self.ctx.symbols.data.address();
                Ok(Some(self.ctx.int_literal(parent, i64::from(address), span)))
            }
            _ => Err(Self::bad_arguments(
                &format!("{DATA_REGISTRY}.{name}"),
                "one of `[]=`, `append`, `[]`, `address=`, `address` or `align`",
                span,
            )),
        }
    }

    pub(crate) fn data_label(node: &SyntaxNode) -> CompileResult<String> {
        match (&node.kind, node.children.first()) {
            (NodeKind::Sym, Some(Child::Symbol(s))) => Ok(s.clone()),
            (NodeKind::Str, Some(Child::Str(bytes))) => {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
            _ => Err(Self::bad_arguments(DATA_REGISTRY, "a symbol or string label", node.span)),
        }
    }

    /// A value placed in static data: strings are stored as written,
    /// everything else must be a constant integer.
    fn data_value(&mut self, parent: NodeId, node: &SyntaxNode) -> CompileResult<DataValue> {
        if node.kind == NodeKind::Str {
            return Ok(DataValue::Bytes(node.expect_str(0)?.to_vec()));
        }
        match self.evaluate(parent, node)? {
            ConstValue::Int(value, ty) => Ok(DataValue::Int {
                ty: ty.machine_type().unwrap_or(WType::POINTER),
                value,
            }),
            ConstValue::Class(_) => Err(Self::bad_arguments(
                DATA_REGISTRY,
                "an integer or string value",
                node.span,
            )),
        }
    }

    fn data_int(&mut self, parent: NodeId, node: &SyntaxNode, what: &str) -> CompileResult<u32> {
        match self.evaluate(parent, node)? {
            ConstValue::Int(value, _) => u32::try_from(value)
                .map_err(|_| {
                    Self::bad_arguments(
                        &format!("{DATA_REGISTRY}.{what}"),
                        "a non-negative address",
                        node.span,
                    )
                }),
            ConstValue::Class(_) => Err(Self::bad_arguments(
                &format!("{DATA_REGISTRY}.{what}"),
                "an integer",
                node.span,
            )),
        }
    }
}

fn class_receiver_kind(via_extend: bool) -> CallReceiver {
    if via_extend {
        CallReceiver::Null
    } else {
        CallReceiver::Absent
    }
}

pub(crate) fn is_data_registry(node: &SyntaxNode) -> bool {
    node.const_path()
        .is_some_and(|(segments, _)| segments == [DATA_REGISTRY])
}

/// Names the native operator table understands.
fn is_operator(name: &str) -> bool {
    BinOp::from_method(name).is_some()
        || RelOp::from_method(name).is_some()
        || UnOp::from_method(name).is_some()
        || matches!(name, "-@" | "!" | "~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_names() {
        assert!(is_operator("+"));
        assert!(is_operator(">="));
        assert!(is_operator("popcnt"));
        assert!(is_operator("-@"));
        assert!(!is_operator("length"));
    }

    #[test]
    fn test_data_registry_receiver() {
        let data = SyntaxNode::new(
            NodeKind::Const,
            vec![Child::Nil, Child::Symbol("DAta".into())],
            Span::DUMMY,
        );
        assert!(is_data_registry(&data));
        let other = SyntaxNode::new(
            NodeKind::Const,
            vec![Child::Nil, Child::Symbol("Data".into())],
            Span::DUMMY,
        );
        assert!(!is_data_registry(&other));
    }
}
