//! The instruction template catalog.
//!
//! Every IR node carries exactly one [`Template`]. Templates are either
//! structural (they group children and emit nothing themselves), ordinary
//! instructions rendered as folded s-expressions, or the raw escape
//! [`Template::Inline`].

use garnet_types::{ClassId, NativeType};

use crate::{MethodId, NodeId};

/// Native binary operators. Division, remainder and right shift are signed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl BinOp {
    /// Map a source method name to its native operator.
    pub fn from_method(name: &str) -> Option<Self> {
        Some(match name {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "%" => BinOp::Rem,
            "&" => BinOp::And,
            "|" => BinOp::Or,
            "^" => BinOp::Xor,
            "<<" => BinOp::Shl,
            ">>" => BinOp::Shr,
            _ => return None,
        })
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div_s",
            BinOp::Rem => "rem_s",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::Shl => "shl",
            BinOp::Shr => "shr_s",
        }
    }

    /// Evaluate on integer operands of type `ty`.
    ///
    /// Operands and result are sign-extended to `i64`. Returns `None` for
    /// float types and for division or remainder by zero.
    pub fn apply(self, ty: NativeType, a: i64, b: i64) -> Option<i64> {
        match ty {
            NativeType::I32 => {
                #[expect(clippy::cast_possible_truncation, reason = "i32 wrap-around semantics")]
                let (a, b) = (a as i32, b as i32);
                let r = match self {
                    BinOp::Add => a.wrapping_add(b),
                    BinOp::Sub => a.wrapping_sub(b),
                    BinOp::Mul => a.wrapping_mul(b),
                    BinOp::Div => a.checked_div(b)?,
                    BinOp::Rem => a.checked_rem(b)?,
                    BinOp::And => a & b,
                    BinOp::Or => a | b,
                    BinOp::Xor => a ^ b,
                    #[expect(clippy::cast_sign_loss, reason = "shift count is masked")]
                    BinOp::Shl => a.wrapping_shl(b as u32),
                    #[expect(clippy::cast_sign_loss, reason = "shift count is masked")]
                    BinOp::Shr => a.wrapping_shr(b as u32),
                };
                Some(i64::from(r))
            }
            NativeType::I64 => Some(match self {
                BinOp::Add => a.wrapping_add(b),
                BinOp::Sub => a.wrapping_sub(b),
                BinOp::Mul => a.wrapping_mul(b),
                BinOp::Div => a.checked_div(b)?,
                BinOp::Rem => a.checked_rem(b)?,
                BinOp::And => a & b,
                BinOp::Or => a | b,
                BinOp::Xor => a ^ b,
                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "shift count is masked"
                )]
                BinOp::Shl => a.wrapping_shl(b as u32),
                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "shift count is masked"
                )]
                BinOp::Shr => a.wrapping_shr(b as u32),
            }),
            NativeType::F32 | NativeType::F64 => None,
        }
    }
}

/// Native unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnOp {
    Eqz,
    Clz,
    Ctz,
    Popcnt,
}

impl UnOp {
    /// Map a native method name (`zero?`, `popcnt`, ...) to its operator.
    pub fn from_method(name: &str) -> Option<Self> {
        Some(match name {
            "zero?" => UnOp::Eqz,
            "clz" => UnOp::Clz,
            "ctz" => UnOp::Ctz,
            "popcnt" => UnOp::Popcnt,
            _ => return None,
        })
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            UnOp::Eqz => "eqz",
            UnOp::Clz => "clz",
            UnOp::Ctz => "ctz",
            UnOp::Popcnt => "popcnt",
        }
    }

    /// `eqz` always yields an I32 boolean; the bit counts keep the operand type.
    pub const fn result_type(self, operand: NativeType) -> NativeType {
        match self {
            UnOp::Eqz => NativeType::I32,
            _ => operand,
        }
    }

    pub fn apply(self, ty: NativeType, a: i64) -> Option<i64> {
        match ty {
            NativeType::I32 => {
                #[expect(clippy::cast_possible_truncation, reason = "i32 wrap-around semantics")]
                let a = a as i32;
                Some(match self {
                    UnOp::Eqz => i64::from(a == 0),
                    UnOp::Clz => i64::from(a.leading_zeros()),
                    UnOp::Ctz => i64::from(a.trailing_zeros()),
                    UnOp::Popcnt => i64::from(a.count_ones()),
                })
            }
            NativeType::I64 => Some(match self {
                UnOp::Eqz => i64::from(a == 0),
                UnOp::Clz => i64::from(a.leading_zeros()),
                UnOp::Ctz => i64::from(a.trailing_zeros()),
                UnOp::Popcnt => i64::from(a.count_ones()),
            }),
            NativeType::F32 | NativeType::F64 => None,
        }
    }
}

/// Relational operators. Ordering comparisons are signed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    pub fn from_method(name: &str) -> Option<Self> {
        Some(match name {
            "==" => RelOp::Eq,
            "!=" => RelOp::Ne,
            "<" => RelOp::Lt,
            "<=" => RelOp::Le,
            ">" => RelOp::Gt,
            ">=" => RelOp::Ge,
            _ => return None,
        })
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            RelOp::Eq => "eq",
            RelOp::Ne => "ne",
            RelOp::Lt => "lt_s",
            RelOp::Le => "le_s",
            RelOp::Gt => "gt_s",
            RelOp::Ge => "ge_s",
        }
    }

    pub fn apply(self, a: i64, b: i64) -> bool {
        match self {
            RelOp::Eq => a == b,
            RelOp::Ne => a != b,
            RelOp::Lt => a < b,
            RelOp::Le => a <= b,
            RelOp::Gt => a > b,
            RelOp::Ge => a >= b,
        }
    }
}

/// A template argument that is only known once a class is finalized.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Lazy {
    /// Instance size of a class.
    ClassSize(ClassId),
    /// Byte offset of the `slot`-th instance variable of a class.
    IvarOffset { class: ClassId, slot: u32 },
}

/// Memory offset of a load or store.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Offset {
    Fixed(u32),
    Lazy(Lazy),
}

/// How a template participates in emission.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TemplateKind {
    /// Emits nothing itself; children are rendered in place.
    Structural,
    /// Folded instruction `(op args... children...)`.
    Instruction,
    /// Raw text copied to the output.
    Escape,
}

/// The instruction template carried by an IR node.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Template {
    // ── structural ──────────────────────────────────────────────
    Root,
    ClassBody(ClassId),

    // ── functions ───────────────────────────────────────────────
    /// A function definition; children are the body statements.
    Method(MethodId),
    Call(MethodId),
    Return,

    // ── values ──────────────────────────────────────────────────
    /// Integer constant; the machine type comes from the node type.
    Const(i64),
    ConstLazy(Lazy),
    LocalGet(String),
    LocalSet(String),
    LocalTee(String),
    GlobalGet(String),
    GlobalSet(String),
    /// Load of the node type from the address child.
    Load { offset: Offset },
    /// Store `ty` to the address child; second child is the value.
    Store { ty: NativeType, offset: Offset },

    // ── operators ───────────────────────────────────────────────
    Binary(BinOp),
    Unary(UnOp),
    Compare { op: RelOp, operand: NativeType },
    Extend { signed: bool },
    Wrap,

    // ── control flow ────────────────────────────────────────────
    /// Children: condition, [`Template::Then`], optional [`Template::Else`].
    If,
    Then,
    Else,
    Block,
    Loop,
    Br(NodeId),
    BrIf(NodeId),
    Drop,
    Nop,

    // ── escapes ─────────────────────────────────────────────────
    Inline(String),
    Comment(String),
}

impl Template {
    pub fn kind(&self) -> TemplateKind {
        match self {
            Template::Root | Template::ClassBody(_) => TemplateKind::Structural,
            Template::Inline(_) => TemplateKind::Escape,
            _ => TemplateKind::Instruction,
        }
    }

    #[inline]
    pub fn is_structural(&self) -> bool {
        self.kind() == TemplateKind::Structural
    }

    /// Blocks and loops get a branch label when created.
    #[inline]
    pub fn takes_label(&self) -> bool {
        matches!(self, Template::Block | Template::Loop)
    }

    /// `true` for templates that transfer control unconditionally.
    #[inline]
    pub fn is_terminator(&self) -> bool {
        matches!(self, Template::Br(_) | Template::Return)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i32_wraps() {
        let r = BinOp::Add.apply(NativeType::I32, i64::from(i32::MAX), 1);
        assert_eq!(r, Some(i64::from(i32::MIN)));
    }

    #[test]
    fn test_division_by_zero_does_not_fold() {
        assert_eq!(BinOp::Div.apply(NativeType::I32, 1, 0), None);
        assert_eq!(BinOp::Rem.apply(NativeType::I64, 1, 0), None);
        assert_eq!(BinOp::Div.apply(NativeType::I64, -7, 2), Some(-3));
    }

    #[test]
    fn test_float_arithmetic_is_not_evaluated() {
        assert_eq!(BinOp::Add.apply(NativeType::F64, 1, 2), None);
        assert_eq!(UnOp::Eqz.apply(NativeType::F32, 0), None);
    }

    #[test]
    fn test_bit_counts() {
        assert_eq!(UnOp::Popcnt.apply(NativeType::I32, 0b1011), Some(3));
        assert_eq!(UnOp::Clz.apply(NativeType::I32, 1), Some(31));
        assert_eq!(UnOp::Ctz.apply(NativeType::I64, 8), Some(3));
        assert_eq!(UnOp::Eqz.result_type(NativeType::I64), NativeType::I32);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(BinOp::from_method(">>"), Some(BinOp::Shr));
        assert_eq!(RelOp::from_method("<="), Some(RelOp::Le));
        assert_eq!(UnOp::from_method("zero?"), Some(UnOp::Eqz));
        assert_eq!(BinOp::from_method("<=>"), None);
    }

    #[test]
    fn test_template_kinds() {
        assert!(Template::Root.is_structural());
        assert_eq!(Template::Inline(String::new()).kind(), TemplateKind::Escape);
        assert!(Template::Loop.takes_label());
        assert!(!Template::If.takes_label());
    }
}
