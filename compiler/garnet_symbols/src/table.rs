//! The compile-time environment of one compilation unit.

use std::fmt::Write;

use rustc_hash::{FxHashMap, FxHashSet};

use garnet_diagnostic::{Diagnostic, ErrorCode};
use garnet_ir::{GlobalId, Lazy, MethodId, Resolve, Span};
use garnet_types::{ClassId, NativeType, WType};

use crate::data::{DataAllocator, DataValue};
use crate::exports::{Exports, Global};
use crate::klass::{ClassKind, ConstValue, Cvar, Ivar, Klass};
use crate::method::{mangle, type_name, Method, MethodScope};

/// The root namespace. Root-level constants and methods live here, and it
/// is the default superclass of every class.
pub const OBJECT: ClassId = ClassId::new(0);

/// Outcome of a declaration that may legally repeat.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Declared {
    New,
    /// Same name, same value: nothing changed.
    Unchanged,
}

/// How a module is mixed into a class.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Mixin {
    Include,
    Prepend,
    Extend,
}

impl Mixin {
    pub const fn keyword(self) -> &'static str {
        match self {
            Mixin::Include => "include",
            Mixin::Prepend => "prepend",
            Mixin::Extend => "extend",
        }
    }
}

/// Classes, methods, globals, static data and exports of one unit.
///
/// Every compilation builds its own table; nothing is shared between
/// units.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    classes: Vec<Klass>,
    methods: Vec<Method>,
    globals: Vec<Global>,
    class_by_path: FxHashMap<String, ClassId>,
    global_by_name: FxHashMap<String, GlobalId>,
    pub data: DataAllocator,
    pub exports: Exports,
}

impl SymbolTable {
    pub fn new(data_base: u32) -> Self {
        let mut object = Klass::new(
            "Object",
            "Object".to_string(),
            ClassKind::Class,
            None,
            None,
            Span::DUMMY,
        );
        object.finalized = true;
        object.ancestors = vec![OBJECT];
        let mut class_by_path = FxHashMap::default();
        class_by_path.insert("Object".to_string(), OBJECT);
        SymbolTable {
            classes: vec![object],
            methods: Vec::new(),
            globals: Vec::new(),
            class_by_path,
            global_by_name: FxHashMap::default(),
            data: DataAllocator::new(data_base),
            exports: Exports::default(),
        }
    }

    // ── Classes ─────────────────────────────────────────────────

    #[inline]
    pub fn class(&self, id: ClassId) -> &Klass {
        &self.classes[id.index()]
    }

    #[inline]
    pub fn class_mut(&mut self, id: ClassId) -> &mut Klass {
        &mut self.classes[id.index()]
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &Klass)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, k)| (ClassId::new(u32::try_from(i).unwrap_or(u32::MAX)), k))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Qualified name of a class.
    pub fn class_path(&self, id: ClassId) -> &str {
        &self.class(id).path
    }

    /// Human-readable type name (`I32`, `Outer::Fibo`, `none`).
    pub fn describe(&self, wtype: WType) -> String {
        wtype.describe(|c| self.class_path(c).to_string())
    }

    pub fn find_class(&self, path: &str) -> Option<ClassId> {
        self.class_by_path.get(path).copied()
    }

    fn child_path(&self, parent: ClassId, name: &str) -> String {
        if parent == OBJECT {
            name.to_string()
        } else {
            format!("{}::{name}", self.class_path(parent))
        }
    }

    /// Open a class or module, creating it on first sight.
    ///
    /// Reopening keeps everything already declared but un-finalizes the
    /// class until its body has been walked again.
    pub fn define_class(
        &mut self,
        name: &str,
        lexical: ClassId,
        kind: ClassKind,
        superclass: Option<ClassId>,
        span: Span,
    ) -> Result<ClassId, Diagnostic> {
        let path = self.child_path(lexical, name);
        if let Some(id) = self.find_class(&path) {
            let existing = self.class(id);
            if existing.kind != kind {
                return Err(Diagnostic::error(ErrorCode::E4005)
                    .with_message(format!(
                        "`{path}` is a {}, not a {}",
                        existing.kind.keyword(),
                        kind.keyword()
                    ))
                    .with_label(span, format!("reopened as a {}", kind.keyword()))
                    .with_secondary_label(existing.span, "first defined here"));
            }
            if let Some(sup) = superclass {
                if existing.superclass != Some(sup) {
                    return Err(Diagnostic::error(ErrorCode::E4005)
                        .with_message(format!("superclass mismatch for class `{path}`"))
                        .with_label(
                            span,
                            format!("declared with superclass `{}`", self.class_path(sup)),
                        )
                        .with_secondary_label(existing.span, "first defined here"));
                }
            }
            tracing::debug!(%path, "reopen {}", kind.keyword());
            self.class_mut(id).finalized = false;
            return Ok(id);
        }

        let superclass = match kind {
            ClassKind::Class => Some(superclass.unwrap_or(OBJECT)),
            ClassKind::Module => None,
        };
        let id = ClassId::new(u32::try_from(self.classes.len()).unwrap_or(u32::MAX));
        tracing::debug!(%path, ?id, "define {}", kind.keyword());
        self.class_by_path.insert(path.clone(), id);
        self.classes
            .push(Klass::new(name, path, kind, Some(lexical), superclass, span));
        Ok(id)
    }

    /// Class directly nested in `parent`, or a constant aliasing one.
    pub fn nested(&self, parent: ClassId, name: &str) -> Option<ClassId> {
        if let Some(id) = self.find_class(&self.child_path(parent, name)) {
            return Some(id);
        }
        match self.class(parent).consts.get(name) {
            Some(ConstValue::Class(id)) => Some(*id),
            _ => None,
        }
    }

    /// Enclosing namespaces from `lexical` outward, ending with `Object`.
    pub fn lexical_chain(&self, lexical: ClassId) -> Vec<ClassId> {
        let mut chain = vec![lexical];
        let mut current = self.class(lexical).lexical_parent;
        while let Some(c) = current {
            chain.push(c);
            current = self.class(c).lexical_parent;
        }
        if chain.last() != Some(&OBJECT) {
            chain.push(OBJECT);
        }
        chain
    }

    /// Resolve `A::B::C` as seen from inside `lexical`.
    pub fn resolve_class(
        &self,
        segments: &[&str],
        rooted: bool,
        lexical: ClassId,
    ) -> Option<ClassId> {
        let (first, rest) = segments.split_first()?;
        let mut current = if rooted {
            self.nested(OBJECT, first)?
        } else {
            self.lexical_chain(lexical)
                .into_iter()
                .chain(self.ancestors(lexical))
                .find_map(|scope| self.nested(scope, first))?
        };
        for segment in rest {
            current = self.nested(current, segment)?;
        }
        Some(current)
    }

    /// Parse a type name as written in directives: a native type,
    /// `none`, or a class path.
    pub fn type_from_name(&self, name: &str, lexical: ClassId) -> Option<WType> {
        if let Some(native) = NativeType::from_name(name) {
            return Some(WType::Native(native));
        }
        if matches!(name, "none" | "None" | "nil") {
            return Some(WType::Blank);
        }
        let rooted = name.starts_with("::");
        let segments: Vec<&str> = name.trim_start_matches("::").split("::").collect();
        self.resolve_class(&segments, rooted, lexical)
            .map(WType::Class)
    }

    // ── Mixins and resolution order ─────────────────────────────

    /// Mix `module` into `class`. The module must be completely defined.
    pub fn mix_in(
        &mut self,
        class: ClassId,
        module: ClassId,
        how: Mixin,
        span: Span,
    ) -> Result<(), Diagnostic> {
        let m = self.class(module);
        if !m.is_module() {
            return Err(Diagnostic::error(ErrorCode::E1004)
                .with_message(format!(
                    "cannot {} `{}`: it is a class, not a module",
                    how.keyword(),
                    m.path
                ))
                .with_label(span, "expected a module"));
        }
        if !m.finalized {
            return Err(Diagnostic::error(ErrorCode::E2005)
                .with_message(format!("module `{}` is used before it is fully defined", m.path))
                .with_label(span, format!("{} used here", how.keyword()))
                .with_secondary_label(m.span, "module defined here")
                .with_note("define the module completely before mixing it in"));
        }
        tracing::debug!(class = %self.class_path(class), module = %m.path, "{}", how.keyword());
        let k = self.class_mut(class);
        let list = match how {
            Mixin::Include => &mut k.includes,
            Mixin::Prepend => &mut k.prepends,
            Mixin::Extend => &mut k.extends,
        };
        if !list.contains(&module) {
            list.push(module);
        }
        Ok(())
    }

    /// Close a class body: cache its resolution order.
    pub fn finalize(&mut self, class: ClassId) {
        let ancestors = self.compute_ancestors(class);
        let k = self.class_mut(class);
        k.ancestors = ancestors;
        k.finalized = true;
        tracing::debug!(class = %k.path, size = k.size(), "finalized");
    }

    /// Instance-method resolution order: prepended modules (latest first),
    /// the class, included modules (latest first), then the superclass's
    /// ancestors.
    pub fn ancestors(&self, class: ClassId) -> Vec<ClassId> {
        let k = self.class(class);
        if k.finalized && !k.ancestors.is_empty() {
            k.ancestors.clone()
        } else {
            self.compute_ancestors(class)
        }
    }

    fn compute_ancestors(&self, class: ClassId) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_ancestors(class, &mut seen, &mut out);
        out
    }

    fn collect_ancestors(
        &self,
        class: ClassId,
        seen: &mut FxHashSet<ClassId>,
        out: &mut Vec<ClassId>,
    ) {
        if !seen.insert(class) {
            return;
        }
        let k = self.class(class);
        for &module in k.prepends.iter().rev() {
            self.collect_ancestors(module, seen, out);
        }
        out.push(class);
        for &module in k.includes.iter().rev() {
            self.collect_ancestors(module, seen, out);
        }
        if let Some(sup) = k.superclass {
            self.collect_ancestors(sup, seen, out);
        }
    }

    // ── Layout ──────────────────────────────────────────────────

    pub fn class_size(&self, class: ClassId) -> u32 {
        self.class(class).size()
    }

    pub fn ivar_offset(&self, class: ClassId, slot: u32) -> u32 {
        self.class(class).ivar_offset(slot)
    }

    /// Declare an instance variable, or return the slot it already has.
    ///
    /// A slot created by an accessor takes the type of the first fixing
    /// declaration.
    pub fn declare_ivar(&mut self, class: ClassId, name: &str, wtype: WType, fixed: bool) -> u32 {
        let k = self.class_mut(class);
        if let Some(slot) = k.ivar_slot(name) {
            let ivar = &mut k.ivars[slot as usize];
            if fixed && !ivar.fixed {
                ivar.wtype = wtype;
                ivar.fixed = true;
            }
            return slot;
        }
        tracing::trace!(class = %k.path, name, %wtype, "ivar");
        k.ivars.push(Ivar {
            name: name.to_string(),
            wtype,
            fixed,
        });
        u32::try_from(k.ivars.len() - 1).unwrap_or(u32::MAX)
    }

    // ── Class variables and constants ───────────────────────────

    pub fn declare_cvar(
        &mut self,
        class: ClassId,
        name: &str,
        value: i64,
        wtype: WType,
        span: Span,
    ) -> Result<Declared, Diagnostic> {
        if let Some(existing) = self.class(class).cvar(name) {
            if existing.value == value && existing.wtype == wtype {
                return Ok(Declared::Unchanged);
            }
            return Err(redeclared("class variable", &format!("@@{name}"), span));
        }
        let native = wtype.machine_type().unwrap_or(WType::POINTER);
        let label = format!("{}::@@{name}", self.class_path(class));
        let address = self
            .data
            .declare(&label, DataValue::Int { ty: native, value }, span)?;
        self.class_mut(class).cvars.push(Cvar {
            name: name.to_string(),
            wtype,
            address,
            value,
        });
        Ok(Declared::New)
    }

    /// Class variable visible from `class` (its own or a superclass's).
    pub fn find_cvar(&self, class: ClassId, name: &str) -> Option<&Cvar> {
        let mut current = Some(class);
        while let Some(c) = current {
            let k = self.class(c);
            if let Some(cv) = k.cvar(name) {
                return Some(cv);
            }
            current = k.superclass;
        }
        None
    }

    pub fn declare_const(
        &mut self,
        class: ClassId,
        name: &str,
        value: ConstValue,
        span: Span,
    ) -> Result<Declared, Diagnostic> {
        match self.class(class).consts.get(name) {
            Some(existing) if *existing == value => Ok(Declared::Unchanged),
            Some(_) => Err(redeclared("constant", name, span)),
            None => {
                tracing::trace!(class = %self.class_path(class), name, ?value, "constant");
                self.class_mut(class)
                    .consts
                    .insert(name.to_string(), value);
                Ok(Declared::New)
            }
        }
    }

    /// Resolve a constant path from inside `lexical`. Classes count as
    /// constants.
    pub fn lookup_const(
        &self,
        segments: &[&str],
        rooted: bool,
        lexical: ClassId,
    ) -> Option<ConstValue> {
        let (last, prefix) = segments.split_last()?;
        let owners: Vec<ClassId> = if prefix.is_empty() {
            if rooted {
                vec![OBJECT]
            } else {
                let mut owners = self.lexical_chain(lexical);
                owners.extend(self.ancestors(lexical));
                owners
            }
        } else {
            let owner = self.resolve_class(prefix, rooted, lexical)?;
            self.ancestors(owner)
        };
        owners.into_iter().find_map(|owner| {
            self.class(owner)
                .consts
                .get(*last)
                .copied()
                .or_else(|| self.nested(owner, last).map(ConstValue::Class))
        })
    }

    // ── Globals ─────────────────────────────────────────────────

    pub fn declare_global(
        &mut self,
        name: &str,
        wtype: WType,
        init: i64,
        span: Span,
    ) -> Result<GlobalId, Diagnostic> {
        if let Some(&id) = self.global_by_name.get(name) {
            return Err(Diagnostic::error(ErrorCode::E4002)
                .with_message(format!("global `${name}` is already declared"))
                .with_label(span, "declared again here")
                .with_secondary_label(self.global(id).span, "first declared here"));
        }
        let id = GlobalId::from_len(self.globals.len());
        tracing::trace!(name, %wtype, init, "global");
        self.globals.push(Global {
            name: name.to_string(),
            wtype,
            init,
            mutable: true,
            span,
        });
        self.global_by_name.insert(name.to_string(), id);
        Ok(id)
    }

    #[inline]
    pub fn global(&self, id: GlobalId) -> &Global {
        &self.globals[id.index()]
    }

    pub fn find_global(&self, name: &str) -> Option<GlobalId> {
        self.global_by_name.get(name).copied()
    }

    pub fn globals(&self) -> impl Iterator<Item = (GlobalId, &Global)> {
        self.globals
            .iter()
            .enumerate()
            .map(|(i, g)| (GlobalId::from_len(i), g))
    }

    // ── Methods ─────────────────────────────────────────────────

    #[inline]
    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    #[inline]
    pub fn method_mut(&mut self, id: MethodId) -> &mut Method {
        &mut self.methods[id.index()]
    }

    pub fn methods(&self) -> impl Iterator<Item = (MethodId, &Method)> {
        self.methods
            .iter()
            .enumerate()
            .map(|(i, m)| (MethodId::from_len(i), m))
    }

    /// The method `name` of `class` itself, created if missing.
    pub fn declare_method(
        &mut self,
        class: ClassId,
        name: &str,
        scope: MethodScope,
        span: Span,
    ) -> MethodId {
        if let Some(id) = self.class(class).method(name, scope) {
            return id;
        }
        let id = MethodId::from_len(self.methods.len());
        tracing::trace!(class = %self.class_path(class), name, ?scope, ?id, "declare method");
        self.methods.push(Method::new(name, class, scope, span));
        self.class_mut(class)
            .methods
            .insert((name.to_string(), scope), id);
        id
    }

    /// Instance method visible on instances of `class`.
    pub fn lookup_instance_method(&self, class: ClassId, name: &str) -> Option<MethodId> {
        self.ancestors(class)
            .into_iter()
            .find_map(|c| self.class(c).method(name, MethodScope::Instance))
    }

    /// Class method callable on `class`. The flag is set when the method
    /// comes from an extended module and so expects a receiver.
    pub fn lookup_class_method(&self, class: ClassId, name: &str) -> Option<(MethodId, bool)> {
        let mut current = Some(class);
        let mut reached_object = false;
        while let Some(c) = current {
            reached_object |= c == OBJECT;
            let k = self.class(c);
            if let Some(m) = k.method(name, MethodScope::Class) {
                return Some((m, false));
            }
            for &module in k.extends.iter().rev() {
                if let Some(m) = self.lookup_instance_method(module, name) {
                    return Some((m, true));
                }
            }
            current = k.superclass;
        }
        if reached_object {
            None
        } else {
            self.class(OBJECT)
                .method(name, MethodScope::Class)
                .map(|m| (m, false))
        }
    }

    /// Internal function name (without `$`): `A::B#m` or `A::B::m`.
    pub fn method_name(&self, id: MethodId) -> String {
        let m = self.method(id);
        format!("{}{}{}", self.class_path(m.klass), m.scope.separator(), mangle(&m.name))
    }

    /// Export name used when none is given: `{method}_{i|c}_{path}`.
    pub fn default_export_name(&self, id: MethodId) -> String {
        let m = self.method(id);
        format!("{}_{}_{}", m.name, m.scope.tag(), self.class(m.klass).export_path())
    }

    /// A human-readable `Class#method` for messages.
    pub fn describe_method(&self, id: MethodId) -> String {
        let m = self.method(id);
        format!("{}{}{}", self.class_path(m.klass), m.scope.separator(), m.name)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Resolve for SymbolTable {
    fn func_name(&self, method: MethodId) -> String {
        self.method_name(method)
    }

    fn func_header(&self, method: MethodId) -> String {
        let m = self.method(method);
        let mut header = format!("${}{}", self.method_name(method), m.signature());
        for local in &m.locals {
            let _ = write!(header, " (local ${} {})", local.name, type_name(local.wtype));
        }
        header
    }

    fn lazy(&self, lazy: Lazy) -> i64 {
        match lazy {
            Lazy::ClassSize(class) => i64::from(self.class_size(class)),
            Lazy::IvarOffset { class, slot } => i64::from(self.ivar_offset(class, slot)),
        }
    }
}

#[cold]
fn redeclared(kind: &str, name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(ErrorCode::E4001)
        .with_message(format!("{kind} `{name}` is already declared with a different value"))
        .with_label(span, "conflicting declaration")
}

#[cfg(test)]
mod tests;
