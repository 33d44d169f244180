//! Command handlers for the `garnetc` CLI.
//!
//! Each submodule implements one command. Option parsing and diagnostic
//! reporting shared between them live here.

mod build;
mod check;
mod explain;
mod run;

pub use build::{build_files, BuildOutput};
pub use check::check_file;
pub use explain::explain_error;
pub use run::run_entry;

use std::io::IsTerminal;
use std::path::PathBuf;

use garnet_diagnostic::emitter::{ColorMode, DiagnosticEmitter, SourceFile, TerminalEmitter};
use garnet_diagnostic::Diagnostic;
use garnet_parse::SourceLoader;

use crate::{CompileOptions, EmitKind};

/// Options shared by the commands, plus what is specific to `build`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub compile: CompileOptions,
    pub output: Option<PathBuf>,
    pub color: ColorMode,
}

impl CliOptions {
    /// Parse the flags of a command, returning the remaining positional
    /// arguments. `-o` takes the next argument as its value.
    pub fn parse(args: &[String]) -> Result<(CliOptions, Vec<String>), String> {
        let mut options = CliOptions::default();
        let mut positional = Vec::new();
        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            if arg == "-o" {
                let Some(path) = args.get(i + 1) else {
                    return Err("`-o` needs a path".to_string());
                };
                options.output = Some(PathBuf::from(path));
                i += 2;
                continue;
            }
            if let Some(value) = arg.strip_prefix("--emit=") {
                options.compile.emit =
                    EmitKind::from_flag(value).ok_or_else(|| {
                        format!("unknown output kind `{value}`; expected wat or ir")
                    })?;
            } else if let Some(value) = arg.strip_prefix("--memory-pages=") {
                options.compile.codegen.memory_pages =
                    value.parse().map_err(|_| format!("invalid page count `{value}`"))?;
            } else if let Some(value) = arg.strip_prefix("--load-path=") {
                options.compile.load_paths.push(PathBuf::from(value));
            } else if let Some(value) = arg.strip_prefix("--frontend=") {
                options.compile.frontend = Some(value.to_string());
            } else if let Some(value) = arg.strip_prefix("--color=") {
                options.color =
                    ColorMode::from_flag(value)
                        .ok_or_else(|| format!("unknown color mode `{value}`"))?;
            } else if arg == "--no-fold" {
                options.compile.codegen.fold_constants = false;
            } else if arg == "--no-export-memory" {
                options.compile.codegen.export_memory = false;
            } else if arg.starts_with("--") {
                return Err(format!("unknown option `{arg}`"));
            } else {
                positional.push(arg.to_string());
            }
            i += 1;
        }
        Ok((options, positional))
    }
}

/// Print `diagnostics` to stderr, with source snippets from `loader` when
/// the unit they belong to was read.
pub(crate) fn report(
    loader: &SourceLoader,
    main: &str,
    diagnostics: &[Diagnostic],
    color: ColorMode,
) {
    let is_tty = std::io::stderr().is_terminal();
    for diagnostic in diagnostics {
        let file = diagnostic.file.as_deref().unwrap_or(main);
        let mut emitter = TerminalEmitter::stderr(color, is_tty);
        if let Some(text) = loader.source(file) {
            emitter = emitter.with_source(SourceFile { path: file, text });
        }
        emitter.emit(diagnostic);
        emitter.flush();
    }
}

/// Final summary line for a failed command.
pub(crate) fn summarize(errors: usize, warnings: usize, color: ColorMode) {
    let is_tty = std::io::stderr().is_terminal();
    let mut emitter = TerminalEmitter::stderr(color, is_tty);
    emitter.emit_summary(errors, warnings);
    emitter.flush();
}
