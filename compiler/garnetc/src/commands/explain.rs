//! The `explain` command: display documentation for an error code.

use garnet_diagnostic::{ErrorCode, ErrorDocs};

/// Print the long description of `code_str`. Returns `false` for unknown
/// codes.
pub fn explain_error(code_str: &str) -> bool {
    let Ok(code) = code_str.parse::<ErrorCode>() else {
        eprintln!("Unknown error code: {code_str}");
        eprintln!();
        eprintln!("Codes have the format EXXXX (errors) or WXXXX (warnings) where X is a digit.");
        eprintln!("Examples: E1001, E2003, E6001, W4001");
        return false;
    };

    println!("{code}: {}", code.summary());
    if let Some(doc) = ErrorDocs::get(code) {
        println!();
        println!("{doc}");
    }
    true
}
