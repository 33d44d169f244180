//! Compile-time evaluation of declaration initializers.
//!
//! Constants, class variables, globals and static data take values known
//! at compile time: integer, string and boolean literals, constants and
//! classes declared earlier, native operators and `cast_to` applied to
//! those, and `DAta[:label]` addresses.

use garnet_ast::{Child, NodeKind, SyntaxNode};
use garnet_diagnostic::{malformed, CompileResult, Diagnostic, ErrorCode};
use garnet_ir::{BinOp, NodeId, RelOp, Span, UnOp};
use garnet_symbols::ConstValue;
use garnet_types::{leading_type, WType};

use super::send::is_data_registry;
use crate::Parser;

impl Parser<'_> {
    /// Evaluate `node` as seen from `scope`.
    pub(super) fn evaluate(
        &mut self,
        scope: NodeId,
        node: &SyntaxNode,
    ) -> CompileResult<ConstValue> {
        let span = node.span;
        match node.kind {
            NodeKind::Int => {
                let value = node.expect_int(0)?;
                let ty = if i32::try_from(value).is_ok() { WType::I32 } else { WType::I64 };
                Ok(ConstValue::Int(value, ty))
            }
            NodeKind::Str => {
                let address = self.ctx.string_address(node.expect_str(0)?);
                Ok(ConstValue::Int(i64::from(address), WType::DEFAULT))
            }
            NodeKind::True => Ok(ConstValue::Int(1, WType::DEFAULT)),
            NodeKind::False => Ok(ConstValue::Int(0, WType::DEFAULT)),
            NodeKind::Const => {
                let Some((segments, rooted)) = node.const_path() else {
                    return Err(malformed("const", "a constant path", span));
                };
                self.ctx.const_value(scope, &segments, rooted, span)
            }
            NodeKind::Begin => match node.nodes().collect::<Vec<_>>().as_slice() {
                [inner] => self.evaluate(scope, inner),
                _ => Err(not_constant(node)),
            },
            NodeKind::Send => self.evaluate_send(scope, node),
            _ => Err(not_constant(node)),
        }
    }

    fn evaluate_send(&mut self, scope: NodeId, node: &SyntaxNode) -> CompileResult<ConstValue> {
        let span = node.span;
        let name = node.expect_symbol(1)?;
        let Some(Child::Node(receiver)) = node.children.first() else {
            return Err(not_constant(node));
        };
        let args: Vec<&SyntaxNode> =
            node.children.iter().skip(2).filter_map(Child::as_node).collect();

        if is_data_registry(receiver) {
            let [label] = args.as_slice() else {
                return Err(not_constant(node));
            };
            if name != "[]" {
                return Err(not_constant(node));
            }
            let label = Self::data_label(label)?;
            return self
                .ctx
                .symbols
                .data
                .label_address(&label)
                .map(|address| ConstValue::Int(i64::from(address), WType::DEFAULT))
                .ok_or_else(|| {
                    Diagnostic::error(ErrorCode::E1002)
                        .with_message(format!("unknown data label `{label}`"))
                        .with_label(span, "no data declared under this label")
                });
        }

        let (value, ty) = self.evaluate_int(scope, receiver)?;
        if name == "cast_to" {
            let (target, signed) = match args.as_slice() {
                [target] => (*target, false),
                [target, flag] if flag.sym_value() == Some("signed") => (*target, true),
                _ => {
                    return Err(Self::bad_arguments(
                        "cast_to",
                        "a type and optionally `:signed`",
                        span,
                    ))
                }
            };
            let to = self.type_argument(scope, target)?;
            return cast_constant(value, ty, to, signed, span);
        }

        match args.as_slice() {
            [] => {
                let native = ty.native().ok_or_else(|| not_constant(node))?;
                let result = match name {
                    "-@" => BinOp::Sub.apply(native, 0, value),
                    "~" => BinOp::Xor.apply(native, value, -1),
                    "!" => Some(i64::from(value == 0)),
                    _ => UnOp::from_method(name).and_then(|op| op.apply(native, value)),
                };
                let result_ty = match name {
                    "!" | "zero?" => WType::DEFAULT,
                    _ => ty,
                };
                result
                    .map(|v| ConstValue::Int(v, result_ty))
                    .ok_or_else(|| not_constant(node))
            }
            [rhs] => {
                let (rhs, rhs_ty) = self.evaluate_int(scope, rhs)?;
                let leading = leading_type([ty, rhs_ty]).unwrap_or(ty);
                let native = leading.native().ok_or_else(|| not_constant(node))?;
                if let Some(op) = RelOp::from_method(name) {
                    return Ok(ConstValue::Int(i64::from(op.apply(value, rhs)), WType::DEFAULT));
                }
                let Some(op) = BinOp::from_method(name) else {
                    return Err(not_constant(node));
                };
                if matches!(op, BinOp::Div | BinOp::Rem) && rhs == 0 {
                    return Err(Diagnostic::error(ErrorCode::E6001)
                        .with_message("division by zero in a constant expression")
                        .with_label(span, "divisor is zero"));
                }
                op.apply(native, value, rhs)
                    .map(|v| ConstValue::Int(v, leading))
                    .ok_or_else(|| not_constant(node))
            }
            _ => Err(not_constant(node)),
        }
    }

    fn evaluate_int(&mut self, scope: NodeId, node: &SyntaxNode) -> CompileResult<(i64, WType)> {
        match self.evaluate(scope, node)? {
            ConstValue::Int(value, ty) => Ok((value, ty)),
            ConstValue::Class(_) => Err(Diagnostic::error(ErrorCode::E3003)
                .with_message("a class cannot be used in arithmetic")
                .with_label(node.span, "this is a class")),
        }
    }
}

/// Retype a constant the way a runtime cast would convert it.
fn cast_constant(
    value: i64,
    from: WType,
    to: WType,
    signed: bool,
    span: Span,
) -> CompileResult<ConstValue> {
    #[expect(clippy::cast_possible_truncation, reason = "i32 wrap-around semantics")]
    let low = value as i32;
    let converted = match to {
        WType::Native(native) if native.is_float() => {
            return Err(Diagnostic::error(ErrorCode::E3002)
                .with_message("floating point constants are not supported")
                .with_label(span, "cast to a floating point type"));
        }
        WType::Blank => {
            return Err(Diagnostic::error(ErrorCode::E3001)
                .with_message("cannot cast a constant to `none`")
                .with_label(span, "a constant always has a value"));
        }
        WType::Native(_) if to == WType::I64 && from != WType::I64 && !signed => {
            #[expect(clippy::cast_sign_loss, reason = "zero extension")]
            let unsigned = low as u32;
            i64::from(unsigned)
        }
        WType::Native(_) if to == WType::I64 => value,
        _ => i64::from(low),
    };
    Ok(ConstValue::Int(converted, to))
}

#[cold]
fn not_constant(node: &SyntaxNode) -> Diagnostic {
    Diagnostic::error(ErrorCode::E5001)
        .with_message(format!("`{}` is not a compile-time constant", node.tag()))
        .with_label(node.span, "declarations need a value known at compile time")
        .with_note("use literals, constants, operators on them, `cast_to` or `DAta[:label]`")
}
