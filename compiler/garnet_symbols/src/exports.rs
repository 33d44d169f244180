//! Globals and the module export list.

use garnet_diagnostic::{Diagnostic, ErrorCode};
use garnet_ir::{GlobalId, MethodId, Span};
use garnet_types::WType;

/// A process-wide variable.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Global {
    pub name: String,
    pub wtype: WType,
    pub init: i64,
    pub mutable: bool,
    pub span: Span,
}

/// What an export refers to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ExportTarget {
    Method(MethodId),
    Global(GlobalId),
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Export {
    pub target: ExportTarget,
    /// Externally visible name.
    pub name: String,
}

/// Ordered export list. Entries are never removed.
#[derive(Clone, Default, Debug)]
pub struct Exports {
    entries: Vec<Export>,
}

impl Exports {
    /// Record an export. Exporting the same target twice under the same name
    /// is a no-op; reusing a name for a different target is an error. A
    /// target exported under a second name keeps both.
    pub fn add(&mut self, target: ExportTarget, name: &str, span: Span) -> Result<(), Diagnostic> {
        if let Some(existing) = self.entries.iter().find(|e| e.name == name) {
            if existing.target == target {
                return Ok(());
            }
            return Err(Diagnostic::error(ErrorCode::E4001)
                .with_message(format!("export name `{name}` is already used"))
                .with_label(span, "exported again here"));
        }
        tracing::debug!(name, ?target, "export");
        self.entries.push(Export {
            target,
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Export> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
