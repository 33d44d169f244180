//! Garnet intermediate representation.
//!
//! The code generator grows an [`IrTree`] of instruction [`Template`]s and
//! rewrites it in place (operand promotion inserts casts above operands,
//! statements in discard position get a `drop` spliced above them, loop
//! bodies are wrapped in blocks). Once a unit is complete the tree is
//! rendered to text by [`render`], which asks a [`Resolve`] implementation
//! for everything that lives in the symbol table rather than in the tree.
//!
//! # Design
//!
//! - **Arena + indices**: nodes live in one `Vec` and link to each other
//!   through [`NodeId`]s, so parent pointers cost nothing and subtrees can
//!   be detached or moved without touching ownership.
//! - **Lazy arguments**: instance-variable offsets and class sizes are
//!   stored as [`Lazy`] values and resolved only at render time, after every
//!   reopening of a class has been seen.

/// Compile-time assertion that a type has a specific size.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod ids;
mod render;
mod span;
mod stack;
mod template;
mod tree;

pub use ids::{GlobalId, MethodId, NodeId};
pub use render::{label_name, render, render_to_string, Resolve};
pub use span::Span;
pub use stack::ensure_sufficient_stack;
pub use template::{BinOp, Lazy, Offset, RelOp, Template, TemplateKind, UnOp};
pub use tree::{Ancestors, IrNode, IrTree};
