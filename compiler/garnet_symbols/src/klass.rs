//! Classes and modules.

use rustc_hash::FxHashMap;

use garnet_ir::{MethodId, Span};
use garnet_types::{ClassId, WType};

use crate::MethodScope;

/// Whether a namespace can be instantiated.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ClassKind {
    Class,
    Module,
}

impl ClassKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Module => "module",
        }
    }
}

/// An instance variable slot.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Ivar {
    pub name: String,
    pub wtype: WType,
    /// Set once the type has been fixed by a first assignment or an
    /// `attr_type` directive. Accessor-created slots start unfixed.
    pub fixed: bool,
}

/// A class variable, backed by a static data cell.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Cvar {
    pub name: String,
    pub wtype: WType,
    pub address: u32,
    pub value: i64,
}

/// Compile-time value of a constant.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ConstValue {
    Int(i64, WType),
    Class(ClassId),
}

/// Accessor declaration (`attr_reader` / `attr_writer` / `attr_accessor`).
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Attr {
    pub name: String,
    pub reader: bool,
    pub writer: bool,
    pub span: Span,
}

/// A class or module.
#[derive(Clone, Debug)]
pub struct Klass {
    pub name: String,
    /// Fully qualified path (`Outer::Inner`). Top-level classes use the
    /// bare name.
    pub path: String,
    pub kind: ClassKind,
    /// Enclosing namespace; `None` only for `Object`.
    pub lexical_parent: Option<ClassId>,
    pub superclass: Option<ClassId>,
    pub ivars: Vec<Ivar>,
    pub cvars: Vec<Cvar>,
    pub consts: FxHashMap<String, ConstValue>,
    pub methods: FxHashMap<(String, MethodScope), MethodId>,
    pub includes: Vec<ClassId>,
    pub prepends: Vec<ClassId>,
    pub extends: Vec<ClassId>,
    pub attrs: Vec<Attr>,
    pub span: Span,
    pub finalized: bool,
    /// Method resolution order cached at finalization.
    pub(crate) ancestors: Vec<ClassId>,
}

impl Klass {
    pub(crate) fn new(
        name: &str,
        path: String,
        kind: ClassKind,
        lexical_parent: Option<ClassId>,
        superclass: Option<ClassId>,
        span: Span,
    ) -> Self {
        Klass {
            name: name.to_string(),
            path,
            kind,
            lexical_parent,
            superclass,
            ivars: Vec::new(),
            cvars: Vec::new(),
            consts: FxHashMap::default(),
            methods: FxHashMap::default(),
            includes: Vec::new(),
            prepends: Vec::new(),
            extends: Vec::new(),
            attrs: Vec::new(),
            span,
            finalized: false,
            ancestors: Vec::new(),
        }
    }

    #[inline]
    pub fn is_module(&self) -> bool {
        self.kind == ClassKind::Module
    }

    pub fn ivar_slot(&self, name: &str) -> Option<u32> {
        self.ivars
            .iter()
            .position(|iv| iv.name == name)
            .and_then(|i| u32::try_from(i).ok())
    }

    pub fn ivar(&self, name: &str) -> Option<&Ivar> {
        self.ivars.iter().find(|iv| iv.name == name)
    }

    pub fn cvar(&self, name: &str) -> Option<&Cvar> {
        self.cvars.iter().find(|cv| cv.name == name)
    }

    pub fn method(&self, name: &str, scope: MethodScope) -> Option<MethodId> {
        self.methods.get(&(name.to_string(), scope)).copied()
    }

    /// Instance size: the plain sum of instance-variable sizes.
    pub fn size(&self) -> u32 {
        self.ivars.iter().map(|iv| iv.wtype.size()).sum()
    }

    /// Byte offset of the `slot`-th instance variable.
    pub fn ivar_offset(&self, slot: u32) -> u32 {
        self.ivars
            .iter()
            .take(slot as usize)
            .map(|iv| iv.wtype.size())
            .sum()
    }

    /// Path segment used in export names: lowercased, `::` replaced by `_`.
    pub fn export_path(&self) -> String {
        self.path.replace("::", "_").to_lowercase()
    }
}
