//! IR generation for the Garnet compiler.
//!
//! The dispatcher in `garnet_parse` walks a syntax tree and calls into a
//! [`CompilationContext`] to grow the IR tree. Most operations follow the
//! same pattern: the caller appends a placeholder node, parses the operand
//! children into it, then asks the context to turn the placeholder into a
//! typed instruction. The returned [`NodeId`](garnet_ir::NodeId) is the
//! node now standing in the placeholder's position, which differs from the
//! placeholder when a cast or `drop` had to be spliced above it.
//!
//! # Typing
//!
//! Every node carries a `WType`. Binary operands are promoted to their
//! leading type, arguments and assigned values are cast to the declared
//! slot type, and class references take part in pointer arithmetic scaled
//! by the instance size.
//!
//! Once a unit has been walked, [`CompilationContext::link_check`] verifies
//! that every call has a target and [`CompilationContext::emit_module`]
//! renders the module text.

mod calls;
mod cast;
mod classes;
mod context;
mod control_flow;
mod module;
mod operators;
mod variables;

pub use calls::CallReceiver;
pub use context::{CodegenOptions, CompilationContext, Scope};

#[cfg(test)]
mod tests;
