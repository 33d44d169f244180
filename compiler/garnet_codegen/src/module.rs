//! Module assembly: header declarations, data segments and the rendered
//! function tree, plus a debugging dump of the raw IR.

use std::fmt::Write;

use garnet_ir::{render, ensure_sufficient_stack, NodeId};
use garnet_symbols::data::escape_bytes;
use garnet_symbols::ExportTarget;

use crate::CompilationContext;

const PAGE_SIZE: u32 = 64 * 1024;

impl CompilationContext {
    /// Memory pages needed to hold the static data, never fewer than
    /// configured.
    pub fn memory_pages(&self) -> u32 {
        let end = self
            .symbols
            .data
            .entries()
            .iter()
            .map(|e| e.address.saturating_add(e.value.size()))
            .max()
            .unwrap_or(0)
            .max(self.symbols.data.address());
        self.options.memory_pages.max(end.div_ceil(PAGE_SIZE))
    }

    /// The complete module text: imports, memory, exports, globals, data
    /// segments, then the functions.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn emit_module(&self) -> String {
        let mut out = String::from("(module\n");
        for (id, m) in self.symbols.methods() {
            if let (true, Some((module, function))) = (m.is_imported(), &m.import) {
                let _ = writeln!(
                    out,
                    "  (import \"{module}\" \"{function}\" (func ${}{}))",
                    self.symbols.method_name(id),
                    m.signature()
                );
            }
        }

        let _ = writeln!(out, "  (memory $0 {})", self.memory_pages());
        if self.options.export_memory {
            out.push_str("  (export \"memory\" (memory $0))\n");
        }

        for export in self.symbols.exports.iter() {
            let _ = match export.target {
                ExportTarget::Method(m) => writeln!(
                    out,
                    "  (export \"{}\" (func ${}))",
                    export.name,
                    self.symbols.method_name(m)
                ),
                ExportTarget::Global(g) => writeln!(
                    out,
                    "  (export \"{}\" (global ${}))",
                    export.name,
                    self.symbols.global(g).name
                ),
            };
        }

        for (_, global) in self.symbols.globals() {
            let Some(ty) = global.wtype.machine_type() else {
                continue;
            };
            let ty = ty.wasm_name();
            let declared = if global.mutable {
                format!("(mut {ty})")
            } else {
                ty.to_string()
            };
            let _ = writeln!(
                out,
                "  (global ${} {declared} ({ty}.const {}))",
                global.name, global.init
            );
        }

        for entry in self.symbols.data.entries() {
            let _ = writeln!(
                out,
                "  (data (i32.const {}) \"{}\") ;; {}",
                entry.address,
                escape_bytes(&entry.value.to_bytes()),
                entry.label
            );
        }

        render(&self.tree, self.tree.root(), &self.symbols, 1, &mut out);
        out.push_str(")\n");
        tracing::debug!(bytes = out.len(), "module emitted");
        out
    }

    /// One line per IR node: template, type and span.
    pub fn dump_ir(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.tree.root(), 0, &mut out);
        out
    }

    fn dump_node(&self, node: NodeId, depth: usize, out: &mut String) {
        ensure_sufficient_stack(|| {
            let span = self.tree.span(node);
            let _ = writeln!(
                out,
                "{:indent$}{node:?} {:?} : {} @{}..{}",
                "",
                self.tree.template(node),
                self.tree.wtype(node),
                span.start,
                span.end,
                indent = depth * 2
            );
            for &child in self.tree.children(node) {
                self.dump_node(child, depth + 1, out);
            }
        });
    }
}
