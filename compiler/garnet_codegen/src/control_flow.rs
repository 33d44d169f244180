//! Conditionals, loops, branches and short-circuit logic.
//!
//! Loop shape:
//!
//! ```text
//! (block $blockN
//!   (loop $loopM
//!     (br_if $blockN (i32.eqz cond))
//!     body...
//!     (br $loopM)))
//! ```
//!
//! `break` branches to the block, `next` to the loop. Both are found by
//! walking up the IR tree from where they appear.

use garnet_diagnostic::{internal, CompileResult, Diagnostic, ErrorCode};
use garnet_ir::{MethodId, NodeId, RelOp, Span, Template, UnOp};
use garnet_types::{leading_type, NativeType, WType};

use crate::CompilationContext;

impl CompilationContext {
    /// Settle the type of an `if` node (`[cond, then, else?]`).
    ///
    /// In value position both arms must produce the same type: an arm that
    /// ends without a value gets a zero constant of the other arm's type,
    /// and native arms of different widths are promoted.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn finish_if(
        &mut self,
        node: NodeId,
        keep_eval: bool,
        span: Span,
    ) -> CompileResult<NodeId> {
        let arms: Vec<NodeId> = self.tree.children(node).iter().skip(1).copied().collect();
        let (then_arm, else_arm) = match arms.as_slice() {
            [t] => (*t, None),
            [t, e] => (*t, Some(*e)),
            _ => return Err(internal("`if` node without arms")),
        };
        if let Some(e) = else_arm {
            if self.tree.children(e).is_empty() && !keep_eval {
                self.tree.detach(e);
            }
        }
        if !keep_eval {
            self.tree.set_wtype(node, WType::Blank);
            return Ok(node);
        }

        let else_arm = match else_arm {
            Some(e) => e,
            None => self.tree.add(node, Template::Else, WType::Blank),
        };
        let then_ty = self.arm_type(then_arm);
        let else_ty = self.arm_type(else_arm);
        let result = match (then_ty, else_ty) {
            (None, None) => WType::Blank,
            (Some(t), None) | (None, Some(t)) => t,
            (Some(t), Some(e)) if t == e => t,
            (Some(t), Some(e)) => match (t.native(), e.native()) {
                (Some(_), Some(_)) => leading_type([t, e]).unwrap_or(t),
                _ => return Err(self.arm_mismatch(t, e, span)),
            },
        };

        for arm in [then_arm, else_arm] {
            match self.arm_type(arm) {
                Some(ty) if ty != result => {
                    if let Some(last) = self.tree.last_child(arm) {
                        self.promote(last, result)?;
                    }
                }
                None if !result.is_blank() && !self.arm_terminates(arm) => {
                    tracing::trace!(?arm, %result, "synthesized arm value");
                    self.tree.add(arm, Template::Const(0), result);
                }
                _ => {}
            }
        }
        if result.is_blank() && self.tree.children(else_arm).is_empty() {
            self.tree.detach(else_arm);
        }
        self.tree.set_wtype(node, result);
        Ok(node)
    }

    /// Type an arm leaves on the stack, `None` for nothing.
    fn arm_type(&self, arm: NodeId) -> Option<WType> {
        self.tree
            .last_child(arm)
            .map(|last| self.tree.wtype(last))
            .filter(|ty| !ty.is_blank())
    }

    fn arm_terminates(&self, arm: NodeId) -> bool {
        self.tree
            .last_child(arm)
            .is_some_and(|last| self.tree.template(last).is_terminator())
    }

    #[cold]
    fn arm_mismatch(&self, then_ty: WType, else_ty: WType, span: Span) -> Diagnostic {
        Diagnostic::error(ErrorCode::E3005)
            .with_message(format!(
                "`if` arms have different types: {} and {}",
                self.symbols.describe(then_ty),
                self.symbols.describe(else_ty)
            ))
            .with_label(span, "both arms must produce the same type")
    }

    /// Append the block/loop pair of a loop under `parent`.
    pub fn loop_shell(&mut self, parent: NodeId, span: Span) -> (NodeId, NodeId) {
        let block = self.tree.add(parent, Template::Block, WType::Blank);
        let body = self.tree.add(block, Template::Loop, WType::Blank);
        self.tree.set_span(block, span);
        tracing::trace!(?block, ?body, "loop");
        (block, body)
    }

    /// Finish a conditional branch whose only child is the condition.
    /// With `negate` the branch is taken when the condition is false.
    pub fn branch_if(&mut self, node: NodeId, negate: bool) -> CompileResult<NodeId> {
        let Some(cond) = self.tree.first_child(node) else {
            return Err(internal("conditional branch without a condition"));
        };
        let cond = self.condition(cond)?;
        if negate {
            let inverted = self
                .tree
                .insert_above(cond, Template::Unary(UnOp::Eqz), WType::DEFAULT);
            self.fold(inverted);
        }
        Ok(node)
    }

    /// Unconditional branch back to the head of `body`.
    pub fn loop_back(&mut self, body: NodeId) -> NodeId {
        self.tree.add(body, Template::Br(body), WType::Blank)
    }

    /// `break`: leave the innermost loop around `parent`.
    pub fn break_loop(&mut self, parent: NodeId, span: Span) -> CompileResult<NodeId> {
        let body = self.enclosing_loop(parent, "break", span)?;
        let Some(block) = self.tree.parent(body) else {
            return Err(internal("loop without its block"));
        };
        let node = self.tree.add(parent, Template::Br(block), WType::Blank);
        self.tree.set_span(node, span);
        Ok(node)
    }

    /// `next`: restart the innermost loop around `parent`.
    pub fn next_loop(&mut self, parent: NodeId, span: Span) -> CompileResult<NodeId> {
        let body = self.enclosing_loop(parent, "next", span)?;
        let node = self.tree.add(parent, Template::Br(body), WType::Blank);
        self.tree.set_span(node, span);
        Ok(node)
    }

    fn enclosing_loop(&self, node: NodeId, keyword: &str, span: Span) -> CompileResult<NodeId> {
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .take_while(|&n| !matches!(self.tree.template(n), Template::Method(_)))
            .find(|&n| matches!(self.tree.template(n), Template::Loop))
            .ok_or_else(|| {
                Diagnostic::error(ErrorCode::E2004)
                    .with_message(format!("`{keyword}` outside of a loop"))
                    .with_label(span, "not inside `while` or `until`")
            })
    }

    /// `a && b` / `a || b` as an I32 boolean. `node` is an `if` whose
    /// children are the two operands.
    pub fn short_circuit(
        &mut self,
        node: NodeId,
        is_and: bool,
        span: Span,
    ) -> CompileResult<NodeId> {
        let [lhs, rhs] = self.tree.children(node) else {
            return Err(internal("logical operator without two operands"));
        };
        let (lhs, rhs) = (*lhs, *rhs);
        self.condition(lhs)?;
        self.tree.detach(rhs);
        let then_arm = self.tree.add(node, Template::Then, WType::Blank);
        let else_arm = self.tree.add(node, Template::Else, WType::Blank);
        let (value_arm, constant_arm, constant) = if is_and {
            (then_arm, else_arm, 0)
        } else {
            (else_arm, then_arm, 1)
        };
        self.tree.reparent(rhs, value_arm);
        self.boolean(rhs)?;
        self.tree.add(constant_arm, Template::Const(constant), WType::DEFAULT);
        self.tree.set_wtype(node, WType::DEFAULT);
        self.tree.set_span(node, span);
        Ok(node)
    }

    /// Normalize a truth value to 0 or 1.
    fn boolean(&mut self, node: NodeId) -> CompileResult<NodeId> {
        let node = self.condition(node)?;
        let normalized = matches!(
            self.tree.template(node),
            Template::Compare { .. } | Template::Unary(UnOp::Eqz) | Template::Const(0 | 1)
        );
        if normalized {
            return Ok(node);
        }
        let test = self.tree.insert_above(
            node,
            Template::Compare {
                op: RelOp::Ne,
                operand: NativeType::I32,
            },
            WType::DEFAULT,
        );
        self.tree.add(test, Template::Const(0), WType::DEFAULT);
        Ok(self.fold(test))
    }

    /// `return` with an optional value child, checked against the method's
    /// result type.
    pub fn return_value(&mut self, node: NodeId, span: Span) -> CompileResult<NodeId> {
        let Some(method) = self.method_of(node) else {
            return Err(Diagnostic::error(ErrorCode::E2003)
                .with_message("`return` outside of a method")
                .with_label(span, "not inside a method"));
        };
        let expected = self.symbols.method(method).wtype;
        let value = self.tree.first_child(node);
        let found = value.map_or(WType::Blank, |v| self.tree.wtype(v));
        match value {
            Some(v) if !expected.is_blank() && !found.is_blank() => {
                self.cast(v, expected, true, span)?;
            }
            _ if expected.is_blank() && found.is_blank() => {}
            _ => return Err(self.result_mismatch(method, found, span)),
        }
        self.tree.set_template(node, Template::Return);
        self.tree.set_wtype(node, WType::Blank);
        self.tree.set_span(node, span);
        Ok(node)
    }

    #[cold]
    pub(crate) fn result_mismatch(&self, method: MethodId, found: WType, span: Span) -> Diagnostic {
        let expected = self.symbols.method(method).wtype;
        Diagnostic::error(ErrorCode::E3004)
            .with_message(format!(
                "method `{}` returns {} but its body produces {}",
                self.symbols.describe_method(method),
                self.symbols.describe(expected),
                self.symbols.describe(found)
            ))
            .with_label(span, format!("this produces {}", self.symbols.describe(found)))
            .with_suggestion(format!(
                "declare the result type with `result :{}`",
                self.symbols.describe(found)
            ))
    }
}
