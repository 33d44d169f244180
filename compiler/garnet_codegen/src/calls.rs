//! Method calls and the link check.

use garnet_diagnostic::{CompileResult, Diagnostic, ErrorCode};
use garnet_ir::{MethodId, NodeId, Span, Template};
use garnet_symbols::SELF_PARAM;
use garnet_types::WType;

use crate::operators::arity_error;
use crate::CompilationContext;

/// Where the receiver of an instance-method call comes from.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CallReceiver {
    /// Already the first child of the call node.
    InNode,
    /// The current method's own receiver.
    SelfRef,
    /// A null receiver, for module methods reached through `extend`.
    Null,
    /// Class methods take no receiver.
    Absent,
}

impl CompilationContext {
    /// Turn a send node into a call of `method`. The node's children are
    /// the receiver (for [`CallReceiver::InNode`]) followed by the
    /// arguments, each cast to the declared parameter type.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn call(
        &mut self,
        node: NodeId,
        method: MethodId,
        receiver: CallReceiver,
        span: Span,
    ) -> CompileResult<NodeId> {
        let m = self.symbols.method(method);
        let (klass, is_instance, declared) = (m.klass, m.is_instance(), m.params.len());
        match receiver {
            CallReceiver::SelfRef => {
                let this = self
                    .tree
                    .create(Template::LocalGet(SELF_PARAM.to_string()), WType::Class(klass));
                self.tree.prepend(node, this);
            }
            CallReceiver::Null => {
                let null = self.tree.create(Template::Const(0), WType::Class(klass));
                self.tree.prepend(node, null);
            }
            CallReceiver::InNode | CallReceiver::Absent => {}
        }

        let children = self.tree.children(node).to_vec();
        let args = if is_instance {
            let Some((&this, args)) = children.split_first() else {
                return Err(arity_error(&self.symbols.describe_method(method), declared, 0, span));
            };
            self.cast(this, WType::Class(klass), false, span)?;
            args.to_vec()
        } else {
            children
        };
        if self.is_forward(method) {
            self.assume_params(method, &args);
        }
        let m = self.symbols.method(method);
        let result = m.wtype;
        let params: Vec<WType> = m.params.iter().map(|p| p.wtype).collect();
        if args.len() != params.len() {
            return Err(arity_error(
                &self.symbols.describe_method(method),
                params.len(),
                args.len(),
                span,
            ));
        }
        for (arg, ty) in args.into_iter().zip(params) {
            let arg_span = self.tree.span(arg);
            self.cast(arg, ty, true, if arg_span.is_dummy() { span } else { arg_span })?;
        }

        self.tree.set_template(node, Template::Call(method));
        self.tree.set_wtype(node, result);
        self.tree.set_span(node, span);
        Ok(node)
    }

    /// A method only known from calls so far: no body, no import, no
    /// parameters.
    fn is_forward(&self, method: MethodId) -> bool {
        let m = self.symbols.method(method);
        !m.is_implemented() && !m.is_imported() && !m.is_synthesized() && m.params.is_empty()
    }

    /// Give a forward-called method parameters shaped like the call's
    /// arguments.
    fn assume_params(&mut self, method: MethodId, args: &[NodeId]) {
        let types: Vec<WType> = args.iter().map(|&a| self.tree.wtype(a)).collect();
        tracing::trace!(method = %self.symbols.describe_method(method), ?types, "forward call");
        let m = self.symbols.method_mut(method);
        for (i, ty) in types.into_iter().enumerate() {
            m.add_param(&format!("arg{i}"), if ty.is_blank() { WType::DEFAULT } else { ty });
        }
    }

    /// Every call must target a method that has a body or is imported, and
    /// calls emitted before the target was defined must match its final
    /// signature.
    pub fn link_check(&self) -> CompileResult<()> {
        let mut stack = vec![self.tree.root()];
        while let Some(node) = stack.pop() {
            if let Template::Call(method) = self.tree.template(node) {
                self.check_call(node, *method)?;
            }
            stack.extend(self.tree.children(node).iter().rev());
        }
        Ok(())
    }

    fn check_call(&self, node: NodeId, method: MethodId) -> CompileResult<()> {
        let m = self.symbols.method(method);
        let span = self.tree.span(node);
        if !m.is_implemented() && !m.is_imported() {
            return Err(Diagnostic::error(ErrorCode::E1003)
                .with_message(format!(
                    "method `{}` is called but never defined",
                    self.symbols.describe_method(method)
                ))
                .with_label(span, "called here")
                .with_secondary_label(m.span, "declared here"));
        }
        let mut expected: Vec<WType> = Vec::with_capacity(m.arity());
        if m.is_instance() {
            expected.push(WType::Class(m.klass));
        }
        expected.extend(m.params.iter().map(|p| p.wtype));
        let found: Vec<WType> = self
            .tree
            .children(node)
            .iter()
            .map(|&c| self.tree.wtype(c))
            .collect();
        let same_shape = expected.len() == found.len()
            && expected
                .iter()
                .zip(&found)
                .all(|(e, f)| e.machine_type() == f.machine_type());
        if same_shape && self.tree.wtype(node).machine_type() == m.wtype.machine_type() {
            return Ok(());
        }
        Err(Diagnostic::error(ErrorCode::E3006)
            .with_message(format!(
                "call does not match the definition of `{}`",
                self.symbols.describe_method(method)
            ))
            .with_label(span, "called before the definition with different arguments")
            .with_secondary_label(m.span, "defined here")
            .with_suggestion(
                "declare the method before calling it, or declare its types with `result` and `arg`",
            ))
    }
}
