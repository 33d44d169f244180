//! The `check` command: compile a unit without writing anything.

use std::path::Path;

use super::{report, summarize, CliOptions};
use crate::compile_file;

/// Compile `path` and print a one-line summary. Returns `false` after
/// reporting an error.
pub fn check_file(path: &str, options: &CliOptions) -> bool {
    let mut loader = options.compile.loader();
    match compile_file(&mut loader, Path::new(path), &options.compile) {
        Ok(mut ctx) => {
            let warnings = ctx.take_warnings();
            report(&loader, path, &warnings, options.color);
            let classes = ctx.symbols.class_count();
            let methods = ctx
                .symbols
                .methods()
                .filter(|(_, m)| !m.is_synthesized())
                .count();
            println!(
                "OK: {path} ({classes} classes, {methods} methods, {} warnings)",
                warnings.len()
            );
            true
        }
        Err(diagnostic) => {
            report(&loader, path, std::slice::from_ref(&diagnostic), options.color);
            summarize(1, 0, options.color);
            false
        }
    }
}
