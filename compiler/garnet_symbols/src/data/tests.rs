#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn int(ty: NativeType, value: i64) -> DataValue {
    DataValue::Int { ty, value }
}

#[test]
fn declare_then_append_grows_label() {
    let mut data = DataAllocator::new(0);
    let a = data.declare("heap", int(NativeType::I32, 7), Span::DUMMY).unwrap();
    let b = data.append("heap", int(NativeType::I64, -1));
    assert_eq!((a, b), (0, 4));
    assert_eq!(data.address(), 12);
    assert_eq!(data.label_address("heap"), Some(0));
}

#[test]
fn redeclaring_a_label_fails() {
    let mut data = DataAllocator::new(0);
    data.declare("x", int(NativeType::I32, 1), Span::DUMMY).unwrap();
    let err = data.declare("x", int(NativeType::I32, 1), Span::DUMMY).unwrap_err();
    assert_eq!(err.code, ErrorCode::E4003);
}

#[test]
fn address_never_moves_backward() {
    let mut data = DataAllocator::new(100);
    data.set_address(200, Span::DUMMY).unwrap();
    let err = data.set_address(150, Span::DUMMY).unwrap_err();
    assert_eq!(err.code, ErrorCode::E4004);
    assert_eq!(data.address(), 200);
}

#[test]
fn memory_image_is_little_endian() {
    let mut data = DataAllocator::new(0);
    data.append("a", int(NativeType::I32, 0x0102_0304));
    data.append("s", DataValue::Bytes(b"hi\0".to_vec()));
    assert_eq!(data.image(), vec![4, 3, 2, 1, b'h', b'i', 0]);
}

#[test]
fn escape_keeps_printable_ascii() {
    assert_eq!(escape_bytes(b"a\"b\n\0"), "a\\22b\\0a\\00");
}

#[test]
fn entries_are_sorted_by_address() {
    let mut data = DataAllocator::new(0);
    data.append("a", int(NativeType::I32, 1));
    data.append("b", int(NativeType::I32, 2));
    data.append("a", int(NativeType::I32, 3));
    let addrs: Vec<u32> = data.entries().iter().map(|e| e.address).collect();
    assert_eq!(addrs, vec![0, 4, 8]);
}

#[derive(Clone, Debug)]
enum Step {
    Append(u8),
    Align(u32),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u8..32).prop_map(Step::Append),
        prop::sample::select(vec![1u32, 2, 4, 8, 16, 3, 12]).prop_map(Step::Align),
    ]
}

proptest! {
    #[test]
    fn appends_are_strictly_increasing(sizes in prop::collection::vec(1u8..32, 1..40)) {
        let mut data = DataAllocator::new(0);
        let mut last = None;
        for len in sizes {
            let addr = data.append("blob", DataValue::Bytes(vec![0; len as usize]));
            if let Some(prev) = last {
                prop_assert!(addr > prev);
            }
            last = Some(addr);
        }
    }

    #[test]
    fn alignment_rounds_up(base in 0u32..10_000, steps in prop::collection::vec(step(), 0..30)) {
        let mut data = DataAllocator::new(base);
        for step in steps {
            let before = data.address();
            match step {
                Step::Append(len) => {
                    data.append("x", DataValue::Bytes(vec![1; len as usize]));
                    prop_assert_eq!(data.address(), before + u32::from(len));
                }
                Step::Align(n) => {
                    let after = data.align(n);
                    prop_assert!(after >= before);
                    prop_assert_eq!(after % n, 0);
                    prop_assert!(after - before < n);
                }
            }
        }
    }
}
