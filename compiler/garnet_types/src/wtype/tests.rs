use pretty_assertions::assert_eq;

use super::*;

#[test]
fn native_sizes() {
    assert_eq!(NativeType::I32.size(), 4);
    assert_eq!(NativeType::I64.size(), 8);
    assert_eq!(NativeType::F32.size(), 4);
    assert_eq!(NativeType::F64.size(), 8);
}

#[test]
fn class_reference_is_pointer_sized() {
    let ty = WType::Class(ClassId::new(3));
    assert_eq!(ty.size(), 4);
    assert_eq!(ty.machine_type(), Some(NativeType::I32));
    assert!(ty.precedence().is_none());
}

#[test]
fn blank_has_no_size_or_machine_type() {
    assert_eq!(WType::Blank.size(), 0);
    assert_eq!(WType::Blank.machine_type(), None);
    assert_eq!(WType::default(), WType::Blank);
}

#[test]
fn precedence_is_strict() {
    let ranks: Vec<u8> = NativeType::ALL.iter().map(|n| n.rank()).collect();
    assert_eq!(ranks, vec![0, 1, 2, 3]);
}

#[test]
fn type_names_parse() {
    assert_eq!(NativeType::from_name("I64"), Some(NativeType::I64));
    assert_eq!(NativeType::from_name("f32"), Some(NativeType::F32));
    assert_eq!(NativeType::from_name("UI64"), None);
}

#[test]
fn leading_type_picks_widest() {
    let lead = leading_type([WType::I32, WType::I64, WType::I32]);
    assert_eq!(lead, Some(WType::I64));
}

#[test]
fn leading_type_ignores_class_operands() {
    let class = WType::Class(ClassId::new(0));
    assert_eq!(leading_type([class, WType::I32]), Some(WType::I32));
    assert_eq!(leading_type([class, class]), None);
}

#[test]
fn leading_type_ignores_blank() {
    assert_eq!(leading_type([WType::Blank, WType::F64]), Some(WType::F64));
    assert_eq!(leading_type(std::iter::empty()), None);
}

#[test]
fn describe_uses_class_names() {
    let ty = WType::Class(ClassId::new(1));
    assert_eq!(ty.describe(|_| "Header".to_string()), "Header");
    assert_eq!(WType::I64.describe(|_| String::new()), "I64");
    assert_eq!(WType::Blank.to_string(), "none");
}
