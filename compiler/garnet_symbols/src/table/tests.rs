#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn module(table: &mut SymbolTable, name: &str) -> ClassId {
    let id = table
        .define_class(name, OBJECT, ClassKind::Module, None, Span::DUMMY)
        .unwrap();
    table.finalize(id);
    id
}

fn class(table: &mut SymbolTable, name: &str) -> ClassId {
    table
        .define_class(name, OBJECT, ClassKind::Class, None, Span::DUMMY)
        .unwrap()
}

fn paths(table: &SymbolTable, ids: &[ClassId]) -> Vec<String> {
    ids.iter().map(|&c| table.class_path(c).to_string()).collect()
}

#[test]
fn ancestors_follow_prepend_self_include_super() {
    let mut t = SymbolTable::default();
    let p1 = module(&mut t, "P1");
    let p2 = module(&mut t, "P2");
    let i1 = module(&mut t, "I1");
    let i2 = module(&mut t, "I2");
    let base = class(&mut t, "Base");
    t.finalize(base);
    let c = t
        .define_class("C", OBJECT, ClassKind::Class, Some(base), Span::DUMMY)
        .unwrap();
    for (m, how) in [
        (p1, Mixin::Prepend),
        (p2, Mixin::Prepend),
        (i1, Mixin::Include),
        (i2, Mixin::Include),
    ] {
        t.mix_in(c, m, how, Span::DUMMY).unwrap();
    }
    t.finalize(c);
    assert_eq!(
        paths(&t, &t.ancestors(c)),
        vec!["P2", "P1", "C", "I2", "I1", "Base", "Object"]
    );
}

#[test]
fn shared_module_appears_once() {
    let mut t = SymbolTable::default();
    let m = module(&mut t, "M");
    let base = class(&mut t, "Base");
    t.mix_in(base, m, Mixin::Include, Span::DUMMY).unwrap();
    t.finalize(base);
    let c = t
        .define_class("C", OBJECT, ClassKind::Class, Some(base), Span::DUMMY)
        .unwrap();
    t.mix_in(c, m, Mixin::Include, Span::DUMMY).unwrap();
    assert_eq!(paths(&t, &t.ancestors(c)), vec!["C", "M", "Base", "Object"]);
}

#[test]
fn prepended_method_wins_over_local_and_included() {
    let mut t = SymbolTable::default();
    let p = module(&mut t, "P");
    let i = module(&mut t, "I");
    let from_p = t.declare_method(p, "m1", MethodScope::Instance, Span::DUMMY);
    let from_i = t.declare_method(i, "m1", MethodScope::Instance, Span::DUMMY);
    let c = class(&mut t, "C");
    let local = t.declare_method(c, "m1", MethodScope::Instance, Span::DUMMY);
    t.mix_in(c, i, Mixin::Include, Span::DUMMY).unwrap();
    assert_eq!(t.lookup_instance_method(c, "m1"), Some(local));
    t.mix_in(c, p, Mixin::Prepend, Span::DUMMY).unwrap();
    assert_eq!(t.lookup_instance_method(c, "m1"), Some(from_p));
    assert_ne!(t.lookup_instance_method(c, "m1"), Some(from_i));
}

#[test]
fn mixing_in_unfinished_module_fails() {
    let mut t = SymbolTable::default();
    let m = t
        .define_class("M", OBJECT, ClassKind::Module, None, Span::DUMMY)
        .unwrap();
    let c = class(&mut t, "C");
    let err = t.mix_in(c, m, Mixin::Include, Span::DUMMY).unwrap_err();
    assert_eq!(err.code, ErrorCode::E2005);

    let k = class(&mut t, "K");
    let err = t.mix_in(c, k, Mixin::Include, Span::DUMMY).unwrap_err();
    assert_eq!(err.code, ErrorCode::E1004);
}

#[test]
fn class_methods_come_from_chain_then_extends() {
    let mut t = SymbolTable::default();
    let e = module(&mut t, "E");
    let from_e = t.declare_method(e, "helper", MethodScope::Instance, Span::DUMMY);
    let base = class(&mut t, "Base");
    let inherited = t.declare_method(base, "build", MethodScope::Class, Span::DUMMY);
    t.finalize(base);
    let c = t
        .define_class("C", OBJECT, ClassKind::Class, Some(base), Span::DUMMY)
        .unwrap();
    t.mix_in(c, e, Mixin::Extend, Span::DUMMY).unwrap();
    let root = t.declare_method(OBJECT, "puts", MethodScope::Class, Span::DUMMY);

    assert_eq!(t.lookup_class_method(c, "helper"), Some((from_e, true)));
    assert_eq!(t.lookup_class_method(c, "build"), Some((inherited, false)));
    assert_eq!(t.lookup_class_method(c, "puts"), Some((root, false)));
    assert_eq!(t.lookup_instance_method(c, "helper"), None);

    let m = module(&mut t, "Util");
    assert_eq!(t.lookup_class_method(m, "puts"), Some((root, false)));
}

#[test]
fn nested_classes_resolve_lexically() {
    let mut t = SymbolTable::default();
    let outer = class(&mut t, "Outer");
    let fibo = t
        .define_class("Fibo", outer, ClassKind::Class, None, Span::DUMMY)
        .unwrap();
    let other = class(&mut t, "Other");
    assert_eq!(t.class_path(fibo), "Outer::Fibo");
    assert_eq!(t.resolve_class(&["Fibo"], false, outer), Some(fibo));
    assert_eq!(t.resolve_class(&["Fibo"], false, other), None);
    assert_eq!(t.resolve_class(&["Outer", "Fibo"], true, other), Some(fibo));
    assert_eq!(t.type_from_name("Outer::Fibo", other), Some(WType::Class(fibo)));
    assert_eq!(t.type_from_name("I64", other), Some(WType::I64));
    assert_eq!(t.type_from_name("none", other), Some(WType::Blank));
}

#[test]
fn reopening_with_another_kind_fails() {
    let mut t = SymbolTable::default();
    class(&mut t, "A");
    let err = t
        .define_class("A", OBJECT, ClassKind::Module, None, Span::DUMMY)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::E4005);
}

#[test]
fn constants_walk_outward_then_root() {
    let mut t = SymbolTable::default();
    t.declare_const(OBJECT, "LIMIT", ConstValue::Int(10, WType::I32), Span::DUMMY)
        .unwrap();
    let outer = class(&mut t, "Outer");
    t.declare_const(outer, "SIZE", ConstValue::Int(4, WType::I64), Span::DUMMY)
        .unwrap();
    let inner = t
        .define_class("Inner", outer, ClassKind::Class, None, Span::DUMMY)
        .unwrap();
    assert_eq!(
        t.lookup_const(&["SIZE"], false, inner),
        Some(ConstValue::Int(4, WType::I64))
    );
    assert_eq!(
        t.lookup_const(&["LIMIT"], false, inner),
        Some(ConstValue::Int(10, WType::I32))
    );
    assert_eq!(
        t.lookup_const(&["Outer", "Inner"], false, inner),
        Some(ConstValue::Class(inner))
    );
    assert_eq!(t.lookup_const(&["MISSING"], false, inner), None);
}

#[test]
fn constant_redeclaration_policy() {
    let mut t = SymbolTable::default();
    let v = ConstValue::Int(1, WType::I32);
    assert_eq!(t.declare_const(OBJECT, "A", v, Span::DUMMY).unwrap(), Declared::New);
    assert_eq!(t.declare_const(OBJECT, "A", v, Span::DUMMY).unwrap(), Declared::Unchanged);
    let err = t
        .declare_const(OBJECT, "A", ConstValue::Int(2, WType::I32), Span::DUMMY)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::E4001);
}

#[test]
fn class_variables_live_in_data_cells() {
    let mut t = SymbolTable::new(16);
    let c = class(&mut t, "Counter");
    t.declare_cvar(c, "count", 5, WType::I64, Span::DUMMY).unwrap();
    let cv = t.find_cvar(c, "count").unwrap();
    assert_eq!(cv.address, 16);
    assert_eq!(t.data.address(), 24);
    assert_eq!(t.data.label_address("Counter::@@count"), Some(16));

    let sub = t
        .define_class("Sub", OBJECT, ClassKind::Class, Some(c), Span::DUMMY)
        .unwrap();
    assert!(t.find_cvar(sub, "count").is_some());

    assert_eq!(
        t.declare_cvar(c, "count", 5, WType::I64, Span::DUMMY).unwrap(),
        Declared::Unchanged
    );
    let err = t
        .declare_cvar(c, "count", 6, WType::I64, Span::DUMMY)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::E4001);
}

#[test]
fn globals_cannot_be_redeclared() {
    let mut t = SymbolTable::default();
    let g = t.declare_global("heap", WType::I32, 1024, Span::DUMMY).unwrap();
    assert_eq!(t.find_global("heap"), Some(g));
    let err = t
        .declare_global("heap", WType::I32, 1024, Span::DUMMY)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::E4002);
}

#[test]
fn accessor_slot_takes_first_fixed_type() {
    let mut t = SymbolTable::default();
    let c = class(&mut t, "C");
    let slot = t.declare_ivar(c, "len", WType::I32, false);
    assert_eq!(t.declare_ivar(c, "len", WType::I64, true), slot);
    assert_eq!(t.class(c).ivars[0].wtype, WType::I64);
    t.declare_ivar(c, "len", WType::I32, true);
    assert_eq!(t.class(c).ivars[0].wtype, WType::I64);
}

#[test]
fn header_layout_with_padding_field() {
    let mut t = SymbolTable::default();
    let c = class(&mut t, "Header");
    t.declare_ivar(c, "size", WType::I64, true);
    t.declare_ivar(c, "used", WType::I32, true);
    t.declare_ivar(c, "pad", WType::I32, true);
    assert_eq!(t.class_size(c), 16);
    assert_eq!(t.lazy(Lazy::IvarOffset { class: c, slot: 2 }), 12);
    assert_eq!(t.lazy(Lazy::ClassSize(c)), 16);
}

#[test]
fn function_names_and_headers() {
    let mut t = SymbolTable::default();
    let outer = class(&mut t, "Outer");
    let fibo = t
        .define_class("Fibo", outer, ClassKind::Class, None, Span::DUMMY)
        .unwrap();
    let fib = t.declare_method(fibo, "fib", MethodScope::Class, Span::DUMMY);
    t.method_mut(fib).add_param("n", WType::I32);
    t.method_mut(fib).declare_local("acc", WType::I64);
    assert_eq!(t.func_name(fib), "Outer::Fibo::fib");
    assert_eq!(t.default_export_name(fib), "fib_c_outer_fibo");
    assert_eq!(
        t.func_header(fib),
        "$Outer::Fibo::fib (param $n i32) (result i32) (local $acc i64)"
    );

    let get = t.declare_method(fibo, "[]", MethodScope::Instance, Span::DUMMY);
    t.method_mut(get).wtype = WType::Blank;
    assert_eq!(t.func_header(get), "$Outer::Fibo#_aref_ (param $_self_ i32)");
}

proptest! {
    #[test]
    fn offsets_are_prefix_sums(kinds in prop::collection::vec(0usize..4, 0..24)) {
        let mut t = SymbolTable::default();
        let c = class(&mut t, "C");
        let mut expected = Vec::new();
        let mut offset = 0u32;
        for (i, k) in kinds.iter().enumerate() {
            let ty = WType::Native(NativeType::ALL[*k]);
            let slot = t.declare_ivar(c, &format!("v{i}"), ty, true);
            prop_assert_eq!(slot as usize, i);
            expected.push(offset);
            offset += ty.size();
        }
        let actual: Vec<u32> = (0..kinds.len())
            .map(|s| t.ivar_offset(c, u32::try_from(s).unwrap()))
            .collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(t.class_size(c), offset);
    }
}
