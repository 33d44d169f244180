//! AST dispatcher for Garnet.
//!
//! Walks the syntax tree of a unit and drives the code generator. The
//! dispatcher keeps no scope stack of its own: the scope of a construct is
//! found by walking up the IR tree from the node being built (see
//! [`CompilationContext::scope_of`]).
//!
//! Some method-call forms are compile-time directives rather than calls
//! (`result`, `arg`, `export`, `attr_accessor`, `DAta[...]` ...). They are
//! recognized by name when the receiver is absent, or by the `DAta`
//! receiver, and act on the symbol table directly.

mod grammar;
mod loader;

use std::path::PathBuf;

use garnet_codegen::CompilationContext;
use garnet_diagnostic::CompileResult;
use garnet_ir::IrTree;

pub use loader::{SourceLoader, Unit};

/// An export requested at class or root scope, applied to the next method
/// or global defined.
#[derive(Clone, Debug)]
struct PendingExport {
    name: Option<String>,
    span: garnet_ir::Span,
}

/// Dispatcher state for one compilation.
pub struct Parser<'a> {
    ctx: &'a mut CompilationContext,
    loader: &'a mut SourceLoader,
    pending_export: Option<PendingExport>,
    /// Units being walked, innermost last.
    units: Vec<(String, Option<PathBuf>)>,
}

impl<'a> Parser<'a> {
    pub fn new(ctx: &'a mut CompilationContext, loader: &'a mut SourceLoader) -> Self {
        Parser {
            ctx,
            loader,
            pending_export: None,
            units: Vec::new(),
        }
    }

    /// Walk a whole unit at root scope. Errors are attributed to the unit
    /// they occur in.
    #[tracing::instrument(level = "debug", skip(self, unit), fields(unit = %unit.name))]
    pub fn parse_unit(&mut self, unit: &Unit) -> CompileResult<()> {
        self.units.push((unit.name.clone(), unit.path.clone()));
        let result = self.parse_statements(IrTree::ROOT, &unit.root, false);
        self.units.pop();
        result.map(|_| ()).map_err(|d| d.in_file(unit.name.clone()))
    }
}

/// Parse `unit` and everything it requires into `ctx`, then check that
/// every call has a target.
pub fn parse_program(
    ctx: &mut CompilationContext,
    loader: &mut SourceLoader,
    unit: &Unit,
) -> CompileResult<()> {
    Parser::new(ctx, loader).parse_unit(unit)?;
    ctx.link_check().map_err(|d| d.in_file(unit.name.clone()))
}

#[cfg(test)]
mod tests;
