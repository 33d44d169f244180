//! Garnet Eval - reference evaluator for compiled Garnet units.
//!
//! Executes the IR tree of a finished [`CompilationContext`] directly,
//! without going through the WAT text. The `run` command and the
//! end-to-end tests use it to check what a program computes.
//!
//! # Architecture
//!
//! - [`Interpreter`]: call frames, globals, host functions and the
//!   instruction walk
//! - [`Memory`]: linear memory, initialised from the static data image
//! - [`Value`]: 32- and 64-bit integers; class references are addresses
//! - [`errors`]: E6xxx runtime errors
//!
//! Imported methods are bound with [`Interpreter::register_host`]. Raw
//! `inline` instruction text cannot be evaluated and traps with E6004.
//!
//! [`CompilationContext`]: garnet_codegen::CompilationContext

pub mod errors;
mod interpreter;
mod memory;
mod value;

pub use errors::{EvalError, EvalResult};
pub use interpreter::{HostFn, Interpreter, DEFAULT_MAX_DEPTH};
pub use memory::{Memory, PAGE_SIZE};
pub use value::Value;
