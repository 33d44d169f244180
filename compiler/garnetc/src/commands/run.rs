//! The `run` command: compile a unit and evaluate one method.

use std::path::Path;

use garnet_diagnostic::Diagnostic;
use garnet_eval::Interpreter;

use super::{report, summarize, CliOptions};
use crate::compile_file;

/// Compile `path`, then call `entry` (`Class.method` or `Class#method`)
/// with integer `args` and print its result. Returns `false` after
/// reporting an error.
pub fn run_entry(path: &str, entry: &str, args: &[String], options: &CliOptions) -> bool {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        match arg.parse::<i64>() {
            Ok(value) => values.push(value),
            Err(_) => {
                eprintln!("error: argument `{arg}` is not an integer");
                return false;
            }
        }
    }

    let mut loader = options.compile.loader();
    let ctx = match compile_file(&mut loader, Path::new(path), &options.compile) {
        Ok(ctx) => ctx,
        Err(diagnostic) => {
            report(&loader, path, std::slice::from_ref(&diagnostic), options.color);
            summarize(1, 0, options.color);
            return false;
        }
    };
    report(&loader, path, ctx.warnings(), options.color);

    let result =
        Interpreter::new(&ctx).and_then(|mut interpreter| interpreter.invoke(entry, &values));
    match result {
        Ok(Some(value)) => {
            println!("{value}");
            true
        }
        Ok(None) => true,
        Err(error) => {
            let diagnostic = Diagnostic::from(error);
            report(&loader, path, std::slice::from_ref(&diagnostic), options.color);
            false
        }
    }
}
