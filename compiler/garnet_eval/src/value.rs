//! Runtime values.

use std::fmt;

use garnet_types::{NativeType, WType};

use crate::errors::{not_evaluable, EvalResult};

/// An integer on the operand stack. Class references are `I32` addresses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    I32(i32),
    I64(i64),
}

impl Value {
    /// Build a value of machine type `ty` from `raw`, wrapping to 32 bits
    /// when needed.
    pub fn of_type(ty: NativeType, raw: i64) -> EvalResult<Value> {
        match ty {
            #[expect(clippy::cast_possible_truncation, reason = "i32 wrap-around semantics")]
            NativeType::I32 => Ok(Value::I32(raw as i32)),
            NativeType::I64 => Ok(Value::I64(raw)),
            NativeType::F32 | NativeType::F64 => Err(not_evaluable("floating point values")),
        }
    }

    /// Zero of the machine type of `ty`; `None` for blank.
    pub fn zero(ty: WType) -> EvalResult<Option<Value>> {
        ty.machine_type().map(|n| Value::of_type(n, 0)).transpose()
    }

    #[inline]
    pub fn native(self) -> NativeType {
        match self {
            Value::I32(_) => NativeType::I32,
            Value::I64(_) => NativeType::I64,
        }
    }

    /// Sign-extended payload.
    #[inline]
    pub fn as_i64(self) -> i64 {
        match self {
            Value::I32(v) => i64::from(v),
            Value::I64(v) => v,
        }
    }

    /// Payload as an unsigned memory address.
    #[inline]
    pub fn as_address(self) -> u64 {
        match self {
            #[expect(clippy::cast_sign_loss, reason = "addresses are unsigned")]
            Value::I32(v) => u64::from(v as u32),
            #[expect(clippy::cast_sign_loss, reason = "addresses are unsigned")]
            Value::I64(v) => v as u64,
        }
    }

    #[inline]
    pub fn is_true(self) -> bool {
        self.as_i64() != 0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

    use super::*;

    #[test]
    fn test_i32_wraps() {
        assert_eq!(Value::of_type(NativeType::I32, 0x1_0000_0001).unwrap(), Value::I32(1));
        assert_eq!(Value::of_type(NativeType::I64, -1).unwrap().as_i64(), -1);
    }

    #[test]
    fn test_negative_i32_address() {
        assert_eq!(Value::I32(-1).as_address(), u64::from(u32::MAX));
    }
}
