#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::{ClassId, NativeType};

fn class(n: u32) -> WType {
    WType::Class(ClassId::new(n))
}

#[test]
fn integer_widening_and_narrowing() {
    assert_eq!(cast_kind(WType::I32, WType::I64), CastKind::Extend);
    assert_eq!(cast_kind(WType::I64, WType::I32), CastKind::Wrap);
}

#[test]
fn pointers_retag() {
    assert_eq!(cast_kind(WType::I32, class(0)), CastKind::Retag);
    assert_eq!(cast_kind(class(0), WType::I32), CastKind::Retag);
    assert_eq!(cast_kind(class(0), class(1)), CastKind::Retag);
    assert_eq!(cast_kind(class(2), class(2)), CastKind::Noop);
}

#[test]
fn wide_integer_to_pointer_wraps_then_retags() {
    assert_eq!(cast_kind(WType::I64, class(4)), CastKind::WrapRetag);
    assert_eq!(cast_kind(class(4), WType::I64), CastKind::Extend);
}

#[test]
fn float_conversions_are_not_supported() {
    let err = check_cast(WType::I32, WType::F64).unwrap_err();
    assert_eq!(err.kind, CastKind::NotSupported);
    assert_eq!(err.to_string(), "cast from I32 to F64 is not supported");
    assert_eq!(cast_kind(WType::F32, WType::F64), CastKind::Invalid);
}

#[test]
fn blank_only_casts_to_itself() {
    assert_eq!(cast_kind(WType::Blank, WType::Blank), CastKind::Noop);
    let err = check_cast(WType::Blank, WType::I32).unwrap_err();
    assert_eq!(err.to_string(), "cannot cast none to I32");
    assert_eq!(cast_kind(WType::I64, WType::Blank), CastKind::Invalid);
}

#[test]
fn class_to_float_is_invalid() {
    assert_eq!(cast_kind(class(0), WType::F32), CastKind::Invalid);
    assert_eq!(cast_kind(WType::F64, class(0)), CastKind::Invalid);
}

fn any_wtype() -> impl Strategy<Value = WType> {
    prop_oneof![
        Just(WType::Blank),
        prop::sample::select(NativeType::ALL.to_vec()).prop_map(WType::Native),
        (0u32..8).prop_map(class),
    ]
}

proptest! {
    #[test]
    fn identity_is_always_noop(ty in any_wtype()) {
        prop_assert_eq!(cast_kind(ty, ty), CastKind::Noop);
    }

    #[test]
    fn check_agrees_with_matrix(from in any_wtype(), to in any_wtype()) {
        let kind = cast_kind(from, to);
        match check_cast(from, to) {
            Ok(k) => prop_assert_eq!(k, kind),
            Err(e) => {
                prop_assert!(!kind.is_allowed());
                prop_assert_eq!(e.kind, kind);
            }
        }
    }
}
