//! Symbol table for the Garnet compiler.
//!
//! One [`SymbolTable`] holds the whole compile-time environment of a unit:
//! classes and modules, methods with their parameters and locals, class
//! variables, constants, globals, the static data segment and the export
//! list.
//!
//! # Scoping
//!
//! The table does not track a "current scope"; callers pass the class the
//! lookup starts from. Class `Object` ([`OBJECT`]) is the root scope.
//!
//! # Resolution order
//!
//! Instance methods resolve through [`SymbolTable::ancestors`]: prepended
//! modules (latest first), the class itself, included modules (latest
//! first), then the superclass's own order. Extended modules only take part
//! in class-method lookup.

pub mod data;
mod exports;
mod klass;
mod method;
mod table;

pub use data::{DataAllocator, DataEntry, DataValue};
pub use exports::{Export, ExportTarget, Exports, Global};
pub use klass::{Attr, ClassKind, ConstValue, Cvar, Ivar, Klass};
pub use method::{mangle, Method, MethodFlags, MethodScope, Slot, SELF_PARAM};
pub use table::{Declared, Mixin, SymbolTable, OBJECT};
