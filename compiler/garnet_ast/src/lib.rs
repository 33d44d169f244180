//! Garnet syntax tree input.
//!
//! The compiler does not parse source text itself. An external parser
//! turns a unit into a labeled tree and prints it as an s-expression dump;
//! [`sexp::read`] turns that dump back into [`SyntaxNode`]s whose tags come
//! from the closed [`NodeKind`] set.

mod kind;
mod node;
pub mod sexp;

pub use kind::NodeKind;
pub use node::{Child, SyntaxNode};
pub use sexp::{read, SexpError, SexpErrorKind};
