//! Runtime errors of the evaluator.
//!
//! Factory functions are the public API; each sets the error code and a
//! message in one place.

use std::fmt;

use garnet_diagnostic::{Diagnostic, ErrorCode};

/// Result of evaluating a program.
pub type EvalResult<T> = Result<T, EvalError>;

/// A trap or setup failure while evaluating.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub code: ErrorCode,
    pub message: String,
    /// Function being evaluated when the error was raised.
    pub function: Option<String>,
}

impl EvalError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        EvalError {
            code,
            message: message.into(),
            function: None,
        }
    }

    /// Attach the innermost function name; outer frames keep it.
    #[must_use]
    pub fn in_function(mut self, name: impl Into<String>) -> Self {
        if self.function.is_none() {
            self.function = Some(name.into());
        }
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(function) = &self.function {
            write!(f, " (in `{function}`)")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

impl From<EvalError> for Diagnostic {
    fn from(err: EvalError) -> Self {
        let mut diagnostic = Diagnostic::error(err.code).with_message(err.message);
        if let Some(function) = err.function {
            diagnostic = diagnostic.with_note(format!("while evaluating `{function}`"));
        }
        diagnostic
    }
}

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::new(ErrorCode::E6001, "integer division by zero")
}

#[cold]
pub fn out_of_bounds(address: u64, len: usize, memory_size: usize) -> EvalError {
    EvalError::new(
        ErrorCode::E6002,
        format!(
            "access of {len} bytes at address {address} is outside memory of {memory_size} bytes"
        ),
    )
}

#[cold]
pub fn entry_not_found(entry: &str) -> EvalError {
    EvalError::new(ErrorCode::E6003, format!("no method `{entry}` to run"))
}

#[cold]
pub fn wrong_arg_count(entry: &str, expected: usize, got: usize) -> EvalError {
    EvalError::new(
        ErrorCode::E6003,
        format!("`{entry}` takes {expected} argument(s) but {got} were given"),
    )
}

#[cold]
pub fn not_evaluable(what: &str) -> EvalError {
    EvalError::new(ErrorCode::E6004, format!("{what} cannot be evaluated"))
}

#[cold]
pub fn missing_host(module: &str, function: &str) -> EvalError {
    EvalError::new(
        ErrorCode::E6005,
        format!("no host function registered for import `{module}.{function}`"),
    )
}

#[cold]
pub fn depth_exhausted(limit: usize) -> EvalError {
    EvalError::new(ErrorCode::E6006, format!("call depth exceeded {limit} frames"))
}

#[cold]
pub fn host_failure(module: &str, function: &str, message: &str) -> EvalError {
    EvalError::new(
        ErrorCode::E6005,
        format!("host function `{module}.{function}` failed: {message}"),
    )
}
