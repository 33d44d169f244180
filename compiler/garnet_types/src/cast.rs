//! The cast matrix.

use std::fmt;

use crate::wtype::TypeCategory;
use crate::WType;

/// What a conversion between two types costs at the machine level.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CastKind {
    /// Same representation, nothing to emit.
    Noop,
    /// Widen a 32-bit integer to 64 bits.
    Extend,
    /// Truncate a 64-bit integer to 32 bits.
    Wrap,
    /// Reinterpret a pointer-sized value as another class or as a plain I32.
    Retag,
    /// Truncate to 32 bits, then reinterpret as a class reference.
    WrapRetag,
    /// A real conversion exists but the compiler does not implement it.
    NotSupported,
    /// No conversion exists between the two types.
    Invalid,
}

impl CastKind {
    /// `true` when the cast can be emitted.
    #[inline]
    pub const fn is_allowed(self) -> bool {
        !matches!(self, CastKind::NotSupported | CastKind::Invalid)
    }

    /// `true` when the cast changes the machine representation.
    #[inline]
    pub const fn emits_code(self) -> bool {
        matches!(self, CastKind::Extend | CastKind::Wrap | CastKind::WrapRetag)
    }
}

use CastKind::{Extend as E, Invalid as X, Noop as N, NotSupported as U, Retag as R, Wrap as W};

// Rows are the source category, columns the destination, both in
// `TypeCategory::index` order: Blank, I32, I64, F32, F64, Class.
const MATRIX: [[CastKind; TypeCategory::COUNT]; TypeCategory::COUNT] = [
    /* Blank */ [N, X, X, X, X, X],
    /* I32   */ [X, N, E, U, U, R],
    /* I64   */ [X, W, N, U, U, CastKind::WrapRetag],
    /* F32   */ [X, U, U, N, X, X],
    /* F64   */ [X, U, U, X, N, X],
    /* Class */ [X, R, E, X, X, R],
];

/// Look up the conversion from `from` to `to`.
///
/// Identical types are always [`CastKind::Noop`], including a class
/// reference cast to its own class.
pub fn cast_kind(from: WType, to: WType) -> CastKind {
    if from == to {
        return CastKind::Noop;
    }
    MATRIX[from.category().index()][to.category().index()]
}

/// Like [`cast_kind`], but reports disallowed conversions as an error.
pub fn check_cast(from: WType, to: WType) -> Result<CastKind, CastError> {
    let kind = cast_kind(from, to);
    if kind.is_allowed() {
        Ok(kind)
    } else {
        Err(CastError { from, to, kind })
    }
}

/// A conversion the matrix rejects.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CastError {
    pub from: WType,
    pub to: WType,
    pub kind: CastKind,
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CastKind::NotSupported => {
                write!(f, "cast from {} to {} is not supported", self.from, self.to)
            }
            _ => write!(f, "cannot cast {} to {}", self.from, self.to),
        }
    }
}

impl std::error::Error for CastError {}

#[cfg(test)]
mod tests;
