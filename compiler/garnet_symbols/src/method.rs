//! Methods and their storage slots.

use std::fmt::Write;

use bitflags::bitflags;

use garnet_ir::{NodeId, Span};
use garnet_types::{ClassId, WType};

/// Name of the implicit receiver parameter of instance methods.
pub const SELF_PARAM: &str = "_self_";

/// Instance methods are called on an object, class methods on the class.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MethodScope {
    Instance,
    Class,
}

impl MethodScope {
    /// Separator between class path and method name in internal names.
    pub const fn separator(self) -> &'static str {
        match self {
            MethodScope::Instance => "#",
            MethodScope::Class => "::",
        }
    }

    /// One-letter tag used in default export names.
    pub const fn tag(self) -> char {
        match self {
            MethodScope::Instance => 'i',
            MethodScope::Class => 'c',
        }
    }
}

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct MethodFlags: u32 {
        /// Return type given by a `result` directive.
        const DECLARED_RESULT = 1 << 0;
        /// A body has been generated.
        const IMPLEMENTED = 1 << 1;
        /// Generated by the compiler (`new`, `_size_`, accessors ...).
        const SYNTHESIZED = 1 << 2;
        /// Bound to a host function.
        const IMPORTED = 1 << 3;
        /// Listed in the module exports.
        const EXPORTED = 1 << 4;
    }
}

/// A typed parameter or local variable.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Slot {
    pub name: String,
    pub wtype: WType,
}

/// A callable unit.
#[derive(Clone, Debug)]
pub struct Method {
    pub name: String,
    pub klass: ClassId,
    pub scope: MethodScope,
    /// Return type.
    pub wtype: WType,
    pub flags: MethodFlags,
    /// Declared parameters, excluding the implicit receiver.
    pub params: Vec<Slot>,
    pub locals: Vec<Slot>,
    /// Function node in the IR tree once implemented.
    pub body: Option<NodeId>,
    /// `(module, function)` of an imported host function.
    pub import: Option<(String, String)>,
    pub span: Span,
}

impl Method {
    pub(crate) fn new(name: &str, klass: ClassId, scope: MethodScope, span: Span) -> Self {
        Method {
            name: name.to_string(),
            klass,
            scope,
            wtype: WType::DEFAULT,
            flags: MethodFlags::empty(),
            params: Vec::new(),
            locals: Vec::new(),
            body: None,
            import: None,
            span,
        }
    }

    #[inline]
    pub fn is_instance(&self) -> bool {
        self.scope == MethodScope::Instance
    }

    #[inline]
    pub fn is_implemented(&self) -> bool {
        self.flags.contains(MethodFlags::IMPLEMENTED)
    }

    #[inline]
    pub fn is_imported(&self) -> bool {
        self.flags.contains(MethodFlags::IMPORTED)
    }

    #[inline]
    pub fn is_synthesized(&self) -> bool {
        self.flags.contains(MethodFlags::SYNTHESIZED)
    }

    /// Number of arguments a call passes, receiver included.
    pub fn arity(&self) -> usize {
        self.params.len() + usize::from(self.is_instance())
    }

    pub fn param(&self, name: &str) -> Option<&Slot> {
        self.params.iter().find(|s| s.name == name)
    }

    pub fn local(&self, name: &str) -> Option<&Slot> {
        self.locals.iter().find(|s| s.name == name)
    }

    /// Parameter or local named `name`, the receiver included.
    pub fn slot_type(&self, name: &str) -> Option<WType> {
        if name == SELF_PARAM && self.is_instance() {
            return Some(WType::Class(self.klass));
        }
        self.param(name)
            .or_else(|| self.local(name))
            .map(|s| s.wtype)
    }

    pub fn add_param(&mut self, name: &str, wtype: WType) {
        self.params.push(Slot {
            name: name.to_string(),
            wtype,
        });
    }

    /// Set the type of an existing parameter.
    pub fn set_param_type(&mut self, name: &str, wtype: WType) -> bool {
        match self.params.iter_mut().find(|s| s.name == name) {
            Some(slot) => {
                slot.wtype = wtype;
                true
            }
            None => false,
        }
    }

    /// Declare a local, or return the type it already has.
    pub fn declare_local(&mut self, name: &str, wtype: WType) -> WType {
        if let Some(existing) = self.slot_type(name) {
            return existing;
        }
        self.locals.push(Slot {
            name: name.to_string(),
            wtype,
        });
        wtype
    }

    /// Parameter and result declarations shared by definitions and imports.
    pub fn signature(&self) -> String {
        let mut out = String::new();
        if self.is_instance() {
            let _ = write!(out, " (param ${SELF_PARAM} {})", type_name(WType::Class(self.klass)));
        }
        for p in &self.params {
            let _ = write!(out, " (param ${} {})", p.name, type_name(p.wtype));
        }
        if !self.wtype.is_blank() {
            let _ = write!(out, " (result {})", type_name(self.wtype));
        }
        out
    }
}

/// Machine type name of a slot type (`i32` for class references).
pub(crate) fn type_name(wtype: WType) -> &'static str {
    wtype.machine_type().unwrap_or(WType::POINTER).wasm_name()
}

/// Method names that are not valid in text identifiers.
pub fn mangle(name: &str) -> String {
    match name {
        "[]" => "_aref_".to_string(),
        "[]=" => "_aset_".to_string(),
        _ => name.replace(['[', ']', '(', ')', ',', ';', '"'], "_"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receiver_counts_toward_arity() {
        let mut m = Method::new("m", ClassId::new(0), MethodScope::Instance, Span::DUMMY);
        m.add_param("x", WType::I64);
        assert_eq!(m.arity(), 2);
        assert_eq!(m.slot_type(SELF_PARAM), Some(WType::Class(ClassId::new(0))));
        assert_eq!(m.slot_type("x"), Some(WType::I64));
    }

    #[test]
    fn test_declare_local_keeps_first_type() {
        let mut m = Method::new("m", ClassId::new(0), MethodScope::Class, Span::DUMMY);
        assert_eq!(m.declare_local("y", WType::I64), WType::I64);
        assert_eq!(m.declare_local("y", WType::I32), WType::I64);
        assert_eq!(m.slot_type(SELF_PARAM), None);
    }

    #[test]
    fn test_mangle() {
        assert_eq!(mangle("[]="), "_aset_");
        assert_eq!(mangle("zero?"), "zero?");
        assert_eq!(mangle("<<"), "<<");
    }
}
