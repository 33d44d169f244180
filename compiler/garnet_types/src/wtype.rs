//! Wire types.

use std::fmt;

use crate::ClassId;

/// One of the four native value types of the target machine.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum NativeType {
    I32,
    I64,
    F32,
    F64,
}

impl NativeType {
    /// All native types in precedence order.
    pub const ALL: [NativeType; 4] = [
        NativeType::I32,
        NativeType::I64,
        NativeType::F32,
        NativeType::F64,
    ];

    /// Size of a value of this type in linear memory.
    #[inline]
    pub const fn size(self) -> u32 {
        match self {
            NativeType::I32 | NativeType::F32 => 4,
            NativeType::I64 | NativeType::F64 => 8,
        }
    }

    /// Casting precedence. Wider and floating types outrank narrower integers.
    #[inline]
    pub const fn rank(self) -> u8 {
        match self {
            NativeType::I32 => 0,
            NativeType::I64 => 1,
            NativeType::F32 => 2,
            NativeType::F64 => 3,
        }
    }

    /// Instruction prefix used in the emitted text (`i32`, `i64`, ...).
    #[inline]
    pub const fn wasm_name(self) -> &'static str {
        match self {
            NativeType::I32 => "i32",
            NativeType::I64 => "i64",
            NativeType::F32 => "f32",
            NativeType::F64 => "f64",
        }
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, NativeType::F32 | NativeType::F64)
    }

    /// Parse a type name as written in directives (`:I64`, `:i64`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "I32" | "i32" => Some(NativeType::I32),
            "I64" | "i64" => Some(NativeType::I64),
            "F32" | "f32" => Some(NativeType::F32),
            "F64" | "f64" => Some(NativeType::F64),
            _ => None,
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NativeType::I32 => "I32",
            NativeType::I64 => "I64",
            NativeType::F32 => "F32",
            NativeType::F64 => "F64",
        };
        f.write_str(name)
    }
}

/// Coarse classification used as the key of the cast matrix.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeCategory {
    Blank,
    I32,
    I64,
    F32,
    F64,
    Class,
}

impl TypeCategory {
    pub const COUNT: usize = 6;

    /// Row/column index in the cast matrix.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            TypeCategory::Blank => 0,
            TypeCategory::I32 => 1,
            TypeCategory::I64 => 2,
            TypeCategory::F32 => 3,
            TypeCategory::F64 => 4,
            TypeCategory::Class => 5,
        }
    }
}

/// The type of a value: blank, native, or a reference to a class instance.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum WType {
    /// No value. Statements such as loops and stores have this type.
    #[default]
    Blank,
    Native(NativeType),
    /// Pointer to an instance of the given class.
    Class(ClassId),
}

impl WType {
    pub const I32: WType = WType::Native(NativeType::I32);
    pub const I64: WType = WType::Native(NativeType::I64);
    pub const F32: WType = WType::Native(NativeType::F32);
    pub const F64: WType = WType::Native(NativeType::F64);

    /// Type given to literals, booleans and undeclared slots.
    pub const DEFAULT: WType = WType::I32;

    /// Machine representation of a class reference.
    pub const POINTER: NativeType = NativeType::I32;

    /// Size in bytes of a value of this type (0 for blank).
    #[inline]
    pub const fn size(self) -> u32 {
        match self {
            WType::Blank => 0,
            WType::Native(n) => n.size(),
            WType::Class(_) => Self::POINTER.size(),
        }
    }

    #[inline]
    pub const fn is_blank(self) -> bool {
        matches!(self, WType::Blank)
    }

    #[inline]
    pub const fn is_native(self) -> bool {
        matches!(self, WType::Native(_))
    }

    #[inline]
    pub const fn is_class(self) -> bool {
        matches!(self, WType::Class(_))
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(self, WType::Native(NativeType::I32 | NativeType::I64))
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, WType::Native(NativeType::F32 | NativeType::F64))
    }

    #[inline]
    pub const fn native(self) -> Option<NativeType> {
        match self {
            WType::Native(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub const fn class(self) -> Option<ClassId> {
        match self {
            WType::Class(c) => Some(c),
            _ => None,
        }
    }

    /// The machine type that carries this value, `None` for blank.
    #[inline]
    pub const fn machine_type(self) -> Option<NativeType> {
        match self {
            WType::Blank => None,
            WType::Native(n) => Some(n),
            WType::Class(_) => Some(Self::POINTER),
        }
    }

    /// Precedence rank, `None` for types that do not take part in operand
    /// promotion (blank and class references).
    #[inline]
    pub const fn precedence(self) -> Option<u8> {
        match self {
            WType::Native(n) => Some(n.rank()),
            _ => None,
        }
    }

    #[inline]
    pub const fn category(self) -> TypeCategory {
        match self {
            WType::Blank => TypeCategory::Blank,
            WType::Native(NativeType::I32) => TypeCategory::I32,
            WType::Native(NativeType::I64) => TypeCategory::I64,
            WType::Native(NativeType::F32) => TypeCategory::F32,
            WType::Native(NativeType::F64) => TypeCategory::F64,
            WType::Class(_) => TypeCategory::Class,
        }
    }

    /// Render the type, asking `class_name` for the path of class references.
    pub fn describe(self, class_name: impl Fn(ClassId) -> String) -> String {
        match self {
            WType::Class(c) => class_name(c),
            other => other.to_string(),
        }
    }
}

impl From<NativeType> for WType {
    fn from(native: NativeType) -> Self {
        WType::Native(native)
    }
}

impl fmt::Display for WType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WType::Blank => f.write_str("none"),
            WType::Native(n) => write!(f, "{n}"),
            WType::Class(c) => write!(f, "class#{}", c.raw()),
        }
    }
}

/// Pick the operand type with the highest casting precedence.
///
/// Blank and class operands are skipped. On a tie the earliest operand wins.
/// Returns `None` when no operand has a native type.
pub fn leading_type(types: impl IntoIterator<Item = WType>) -> Option<WType> {
    let mut best: Option<(u8, WType)> = None;
    for ty in types {
        let Some(rank) = ty.precedence() else {
            continue;
        };
        match best {
            Some((best_rank, _)) if best_rank >= rank => {}
            _ => best = Some((rank, ty)),
        }
    }
    best.map(|(_, ty)| ty)
}

#[cfg(test)]
mod tests;
