//! Garnet type model.
//!
//! Every value flowing through the compiler has a [`WType`]: one of the four
//! native wire types of the target stack machine, a reference to an instance
//! of a user class, or blank (no value at all).
//!
//! # Casting
//!
//! Conversions are selected from a closed matrix keyed by
//! [`TypeCategory`] pairs (see [`cast_kind`]). The matrix is total: any
//! pair without a real conversion maps to [`CastKind::Invalid`] or
//! [`CastKind::NotSupported`], never to an implicit coercion.
//!
//! # Precedence
//!
//! Native types are totally ordered by casting precedence
//! (`I32 < I64 < F32 < F64`). [`leading_type`] picks the operand type every
//! other operand is promoted to before a native operator is applied. Class
//! references never take part in that choice.

mod cast;
mod class_id;
mod wtype;

pub use cast::{cast_kind, check_cast, CastError, CastKind};
pub use class_id::ClassId;
pub use wtype::{leading_type, NativeType, TypeCategory, WType};
