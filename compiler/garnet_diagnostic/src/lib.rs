//! Diagnostics for the Garnet compiler.
//!
//! Compilation is fail-fast: every fallible operation returns
//! `Result<T, Diagnostic>` and the first error aborts the unit. Warnings are
//! collected by the caller and reported alongside the result.
//!
//! A [`Diagnostic`] carries:
//! - an [`ErrorCode`] for searchability (`garnetc explain E1001`)
//! - a message saying what went wrong
//! - labelled spans saying where
//! - notes and suggestions saying why and how to fix it

mod diagnostic;
mod docs;
pub mod emitter;
mod error_code;

pub use diagnostic::{internal, malformed, unknown_name, unsupported, Diagnostic, Label, Severity};
pub use docs::ErrorDocs;
pub use error_code::ErrorCode;

/// Result of a compiler operation.
pub type CompileResult<T> = Result<T, Diagnostic>;
