//! Per-unit compilation state.

use garnet_diagnostic::Diagnostic;
use garnet_ir::{IrTree, MethodId, NodeId, Template};
use garnet_symbols::{SymbolTable, OBJECT};
use garnet_types::ClassId;

/// Options for one compilation unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Minimum number of 64 KiB memory pages.
    pub memory_pages: u32,
    /// Export linear memory as `"memory"`.
    pub export_memory: bool,
    /// Class path and class method that `new` calls to obtain memory.
    pub allocator: (String, String),
    /// First address of the static data segment.
    pub data_base: u32,
    /// Fold native operators applied to two literals.
    pub fold_constants: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            memory_pages: 1,
            export_memory: true,
            allocator: ("Object".to_string(), "allocate".to_string()),
            data_base: 0,
            fold_constants: true,
        }
    }
}

/// Where a node sits, found by walking up the IR tree.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Scope {
    Root,
    Class(ClassId),
    Method(MethodId),
}

/// Everything one compilation unit owns: symbols, the IR tree under
/// construction, options, and the warnings gathered so far.
///
/// A fresh context is the only reset point; independent units never share
/// one.
#[derive(Debug)]
pub struct CompilationContext {
    pub symbols: SymbolTable,
    pub tree: IrTree,
    pub options: CodegenOptions,
    warnings: Vec<Diagnostic>,
    strings: u32,
}

impl CompilationContext {
    pub fn new(options: CodegenOptions) -> Self {
        CompilationContext {
            symbols: SymbolTable::new(options.data_base),
            tree: IrTree::new(),
            options,
            warnings: Vec::new(),
            strings: 0,
        }
    }

    pub fn warn(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(code = %diagnostic.code, "{}", diagnostic.message);
        self.warnings.push(diagnostic);
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.warnings)
    }

    pub(crate) fn next_string_label(&mut self) -> String {
        let label = format!("str{}", self.strings);
        self.strings += 1;
        label
    }

    /// Innermost method or class enclosing `node` (itself included).
    pub fn scope_of(&self, node: NodeId) -> Scope {
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .find_map(|n| match self.tree.template(n) {
                Template::Method(m) => Some(Scope::Method(*m)),
                Template::ClassBody(c) => Some(Scope::Class(*c)),
                _ => None,
            })
            .unwrap_or(Scope::Root)
    }

    /// Class that name lookups from `node` start in.
    pub fn class_of(&self, node: NodeId) -> ClassId {
        match self.scope_of(node) {
            Scope::Root => OBJECT,
            Scope::Class(c) => c,
            Scope::Method(m) => self.symbols.method(m).klass,
        }
    }

    pub fn method_of(&self, node: NodeId) -> Option<MethodId> {
        match self.scope_of(node) {
            Scope::Method(m) => Some(m),
            _ => None,
        }
    }

    /// Human-readable name of the scope for messages.
    pub fn describe_scope(&self, node: NodeId) -> String {
        match self.scope_of(node) {
            Scope::Root => "the root scope".to_string(),
            Scope::Class(c) => format!(
                "{} `{}`",
                self.symbols.class(c).kind.keyword(),
                self.symbols.class_path(c)
            ),
            Scope::Method(m) => format!("method `{}`", self.symbols.describe_method(m)),
        }
    }
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self::new(CodegenOptions::default())
    }
}
