//! Error codes for all compiler diagnostics.
//!
//! Each code is a unique identifier (e.g. `E1001`) whose first digit names
//! the failure class. Used for `garnetc explain` lookups.

use std::fmt;

macro_rules! error_codes {
    ($( $(#[$doc:meta])* $code:ident => $summary:literal, )*) => {
        /// Error codes for all compiler diagnostics.
        ///
        /// Format: E#### where the first digit is the failure class:
        /// - E1xxx: lookup errors (unknown names)
        /// - E2xxx: scope errors (construct used in the wrong scope)
        /// - E3xxx: type errors (casts, operators, branch agreement)
        /// - E4xxx: redeclaration errors (conflicting definitions, data cursor)
        /// - E5xxx: unsupported constructs and malformed input
        /// - E6xxx: evaluation errors
        /// - E9xxx: internal compiler errors
        /// - Wxxxx: warnings
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
        pub enum ErrorCode {
            $( $(#[$doc])* $code, )*
        }

        impl ErrorCode {
            /// Every error code, in declaration order.
            pub const ALL: &[ErrorCode] = &[ $( ErrorCode::$code, )* ];

            /// The code as a string (e.g. `"E1001"`).
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( ErrorCode::$code => stringify!($code), )*
                }
            }

            /// One-line description used by `explain` and in listings.
            pub fn summary(&self) -> &'static str {
                match self {
                    $( ErrorCode::$code => $summary, )*
                }
            }
        }
    };
}

error_codes! {
    // Lookup (E1xxx)
    /// Unknown constant
    E1001 => "unknown constant",
    /// Unknown variable
    E1002 => "unknown variable",
    /// Unknown method
    E1003 => "unknown method",
    /// Unknown class, module or type name
    E1004 => "unknown class, module or type",

    // Scope (E2xxx)
    /// Instance variable outside an instance method
    E2001 => "instance variable used outside an instance method",
    /// Declaration outside class or root scope
    E2002 => "declaration is only allowed at class or root scope",
    /// Executable statement outside a method
    E2003 => "statement is only allowed inside a method",
    /// `break`/`next` outside a loop
    E2004 => "branch outside of a loop",
    /// Mixin used before its definition is complete
    E2005 => "module used before it is fully defined",
    /// Directive used in the wrong scope
    E2006 => "directive used in the wrong scope",

    // Type (E3xxx)
    /// Invalid cast
    E3001 => "invalid cast",
    /// Cast or operation not supported
    E3002 => "operation not supported for this type",
    /// Operator not applicable to operands
    E3003 => "operator not applicable to operand types",
    /// Method result does not match declared type
    E3004 => "method result does not match its declared type",
    /// Conditional branches disagree
    E3005 => "conditional branches have different types",
    /// Wrong number of arguments
    E3006 => "wrong number of arguments",

    // Redeclaration (E4xxx)
    /// Constant or class variable redeclared with a different value
    E4001 => "conflicting redeclaration",
    /// Global variable redeclared
    E4002 => "global variable already declared",
    /// Data label redeclared
    E4003 => "data label already declared",
    /// Data address moved backward
    E4004 => "static data address cannot move backward",
    /// Conflicting type declaration
    E4005 => "conflicting type declaration",
    /// Imported method has a body
    E4006 => "imported method must have an empty body",

    // Unsupported / input (E5xxx)
    /// Unsupported construct
    E5001 => "unsupported construct",
    /// Malformed syntax node
    E5002 => "malformed syntax node",
    /// Syntax error in the AST dump
    E5003 => "syntax error in AST dump",
    /// Invalid directive arguments
    E5004 => "invalid directive arguments",
    /// Source unit not found
    E5005 => "source unit not found",

    // Evaluation (E6xxx)
    /// Integer division by zero
    E6001 => "integer division by zero",
    /// Out-of-bounds memory access
    E6002 => "out-of-bounds memory access",
    /// Entry point not found
    E6003 => "entry point not found",
    /// Node cannot be evaluated
    E6004 => "instruction cannot be evaluated",
    /// Missing host function
    E6005 => "missing host function for import",
    /// Call depth exhausted
    E6006 => "call depth exhausted",

    // Internal (E9xxx)
    /// Internal compiler error
    E9001 => "internal compiler error",

    // Warnings
    /// Identical redeclaration
    W4001 => "identical redeclaration",
}

impl ErrorCode {
    pub fn is_lookup_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    pub fn is_scope_error(&self) -> bool {
        self.as_str().starts_with("E2")
    }

    pub fn is_type_error(&self) -> bool {
        self.as_str().starts_with("E3")
    }

    pub fn is_redeclaration_error(&self) -> bool {
        self.as_str().starts_with("E4")
    }

    pub fn is_unsupported_error(&self) -> bool {
        self.as_str().starts_with("E5")
    }

    pub fn is_eval_error(&self) -> bool {
        self.as_str().starts_with("E6")
    }

    pub fn is_internal_error(&self) -> bool {
        self.as_str().starts_with("E9")
    }

    pub fn is_warning(&self) -> bool {
        self.as_str().starts_with('W')
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse an error code string like `"E1001"` or `"w4001"`.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}

#[cfg(test)]
mod tests;
