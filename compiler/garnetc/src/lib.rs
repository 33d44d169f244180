//! Garnet compiler driver.
//!
//! Compiles AST dumps of a Ruby subset into WebAssembly text. Each unit
//! gets its own [`CompilationContext`] and [`SourceLoader`]; nothing is
//! shared between compilations, so several files can be built in
//! parallel.
//!
//! Library entry points:
//! - [`compile_source`]: an in-memory dump
//! - [`compile_file`]: a dump (or `.rb` file with a front end) on disk
//!
//! The `garnetc` binary wraps these in the commands of [`commands`].

pub mod commands;
pub mod logging;

use std::path::{Path, PathBuf};

use garnet_codegen::{CodegenOptions, CompilationContext};
use garnet_diagnostic::CompileResult;
use garnet_parse::{parse_program, SourceLoader, Unit};

/// Environment variable with extra `require` directories.
pub const LOAD_PATH_VAR: &str = "GARNET_PATH";

/// What `build` writes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EmitKind {
    /// WebAssembly text format.
    #[default]
    Wat,
    /// The IR tree, one node per line.
    Ir,
}

impl EmitKind {
    pub fn from_flag(value: &str) -> Option<Self> {
        match value {
            "wat" => Some(EmitKind::Wat),
            "ir" => Some(EmitKind::Ir),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            EmitKind::Wat => "wat",
            EmitKind::Ir => "ir",
        }
    }
}

/// Options for one compilation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub codegen: CodegenOptions,
    /// Directories searched by `require`, before the working directory.
    pub load_paths: Vec<PathBuf>,
    /// Command turning a `.rb` file into an AST dump.
    pub frontend: Option<String>,
    pub emit: EmitKind,
}

impl CompileOptions {
    /// Append the directories listed in `GARNET_PATH`.
    #[must_use]
    pub fn with_env_load_paths(mut self) -> Self {
        if let Some(value) = std::env::var_os(LOAD_PATH_VAR) {
            self.load_paths.extend(std::env::split_paths(&value));
        }
        self
    }

    /// A loader configured with these options' load path and front end.
    pub fn loader(&self) -> SourceLoader {
        let loader = SourceLoader::new().with_load_paths(self.load_paths.iter().cloned());
        match &self.frontend {
            Some(command) => loader.with_frontend(command.clone()),
            None => loader,
        }
    }
}

/// Compile the in-memory dump `dump`, reported under `name`.
#[tracing::instrument(level = "debug", skip(dump, options))]
pub fn compile_source(
    name: &str,
    dump: &str,
    options: &CompileOptions,
) -> CompileResult<CompilationContext> {
    let mut loader = options.loader();
    let unit = loader.open_in_memory(name, dump)?;
    compile_unit(&mut loader, &unit, options)
}

/// Compile the unit at `path` with `loader`, which keeps the source text
/// of every unit read for error reporting.
#[tracing::instrument(level = "debug", skip(loader, options), fields(path = %path.display()))]
pub fn compile_file(
    loader: &mut SourceLoader,
    path: &Path,
    options: &CompileOptions,
) -> CompileResult<CompilationContext> {
    let unit = loader.open(path)?;
    compile_unit(loader, &unit, options)
}

fn compile_unit(
    loader: &mut SourceLoader,
    unit: &Unit,
    options: &CompileOptions,
) -> CompileResult<CompilationContext> {
    let mut ctx = CompilationContext::new(options.codegen.clone());
    parse_program(&mut ctx, loader, unit)?;
    tracing::debug!(
        unit = %unit.name,
        nodes = ctx.tree.len(),
        warnings = ctx.warnings().len(),
        "compiled"
    );
    Ok(ctx)
}

/// Render the requested output of a finished compilation.
pub fn emit(ctx: &CompilationContext, kind: EmitKind) -> String {
    match kind {
        EmitKind::Wat => ctx.emit_module(),
        EmitKind::Ir => ctx.dump_ir(),
    }
}
