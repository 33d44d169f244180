//! Cast insertion.

use garnet_diagnostic::{CompileResult, Diagnostic, ErrorCode};
use garnet_ir::{NodeId, Span, Template};
use garnet_types::{cast_kind, CastKind, WType};

use crate::CompilationContext;

impl CompilationContext {
    /// Make the value at `node` have type `to`.
    ///
    /// Returns the node now standing in `node`'s place: `node` itself when
    /// the type could be changed in place, otherwise the inserted cast.
    /// Integer literals are retyped instead of wrapped.
    pub fn cast(
        &mut self,
        node: NodeId,
        to: WType,
        signed: bool,
        span: Span,
    ) -> CompileResult<NodeId> {
        let from = self.tree.wtype(node);
        let kind = cast_kind(from, to);
        if !kind.is_allowed() {
            return Err(self.cast_error(from, to, kind, span));
        }
        if kind == CastKind::Noop {
            return Ok(node);
        }

        if let Template::Const(value) = *self.tree.template(node) {
            if to.is_integer() || to.is_class() {
                let value = match kind {
                    CastKind::Wrap | CastKind::WrapRetag => i64::from(truncate_i32(value)),
                    #[expect(clippy::cast_sign_loss, reason = "zero extension")]
                    CastKind::Extend if !signed => i64::from(truncate_i32(value) as u32),
                    _ => value,
                };
                self.tree.set_template(node, Template::Const(value));
                self.tree.set_wtype(node, to);
                return Ok(node);
            }
        }

        tracing::trace!(?node, %from, %to, ?kind, "cast");
        Ok(match kind {
            CastKind::Retag => {
                self.tree.set_wtype(node, to);
                node
            }
            CastKind::Extend => self.tree.insert_above(node, Template::Extend { signed }, to),
            CastKind::Wrap | CastKind::WrapRetag => {
                self.tree.insert_above(node, Template::Wrap, to)
            }
            CastKind::Noop | CastKind::NotSupported | CastKind::Invalid => node,
        })
    }

    /// Implicit promotion to a wider operand type (always signed).
    #[inline]
    pub fn promote(&mut self, node: NodeId, to: WType) -> CompileResult<NodeId> {
        let span = self.tree.span(node);
        self.cast(node, to, true, span)
    }

    #[cold]
    fn cast_error(&self, from: WType, to: WType, kind: CastKind, span: Span) -> Diagnostic {
        let (from, to) = (self.symbols.describe(from), self.symbols.describe(to));
        match kind {
            CastKind::NotSupported => Diagnostic::error(ErrorCode::E3002)
                .with_message(format!("cast from {from} to {to} is not supported"))
                .with_label(span, format!("{from} value here"))
                .with_note("floating point conversions are not implemented"),
            _ => Diagnostic::error(ErrorCode::E3001)
                .with_message(format!("cannot cast {from} to {to}"))
                .with_label(span, format!("this is {from}")),
        }
    }
}

#[expect(clippy::cast_possible_truncation, reason = "i32 wrap-around semantics")]
fn truncate_i32(value: i64) -> i32 {
    value as i32
}
