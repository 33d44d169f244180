#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use garnet_codegen::CompilationContext;
use garnet_diagnostic::ErrorCode;
use garnet_parse::{parse_program, SourceLoader};

use crate::{Interpreter, Value};

fn compile(dump: &str) -> CompilationContext {
    let mut ctx = CompilationContext::default();
    let mut loader = SourceLoader::new();
    let unit = loader.open_in_memory("test", dump).unwrap();
    parse_program(&mut ctx, &mut loader, &unit).unwrap();
    ctx
}

fn run(dump: &str, entry: &str, args: &[i64]) -> Option<Value> {
    let ctx = compile(dump);
    Interpreter::new(&ctx).unwrap().invoke(entry, args).unwrap()
}

fn trap(dump: &str, entry: &str, args: &[i64]) -> ErrorCode {
    let ctx = compile(dump);
    Interpreter::new(&ctx).unwrap().invoke(entry, args).unwrap_err().code
}

const FIB: &str = "(class (const nil :Fib) nil
  (defs (self) :fib (args (arg :n))
    (if (send (lvar :n) :< (int 2))
      (lvar :n)
      (send
        (send (self) :fib (send (lvar :n) :- (int 1))) :+
        (send (self) :fib (send (lvar :n) :- (int 2)))))))";

#[test]
fn test_recursive_calls() {
    assert_eq!(run(FIB, "Fib.fib", &[10]), Some(Value::I32(55)));
    assert_eq!(run(FIB, "Fib.fib", &[1]), Some(Value::I32(1)));
}

#[test]
fn test_while_loop() {
    let dump = "(class (const nil :Sum) nil
      (defs (self) :sum (args (arg :n))
        (begin
          (lvasgn :acc (int 0))
          (while (send (lvar :n) :> (int 0))
            (begin
              (op-asgn (lvasgn :acc) :+ (lvar :n))
              (op-asgn (lvasgn :n) :- (int 1))))
          (lvar :acc))))";
    assert_eq!(run(dump, "Sum.sum", &[10]), Some(Value::I32(55)));
    assert_eq!(run(dump, "Sum.sum", &[0]), Some(Value::I32(0)));
}

#[test]
fn test_break_leaves_loop() {
    let dump = "(class (const nil :Count) nil
      (defs (self) :five (args)
        (begin
          (lvasgn :i (int 0))
          (while (true)
            (begin
              (if (send (lvar :i) :== (int 5)) (break) nil)
              (op-asgn (lvasgn :i) :+ (int 1))))
          (lvar :i))))";
    assert_eq!(run(dump, "Count.five", &[]), Some(Value::I32(5)));
}

#[test]
fn test_post_condition_loop_runs_once() {
    let dump = "(class (const nil :Count) nil
      (defs (self) :once (args (arg :n))
        (begin
          (until_post (send (lvar :n) :> (int 0))
            (kwbegin (op-asgn (lvasgn :n) :+ (int 1))))
          (lvar :n))))";
    assert_eq!(run(dump, "Count.once", &[100]), Some(Value::I32(101)));
}

#[test]
fn test_i32_arithmetic_wraps() {
    let dump = "(class (const nil :W) nil
      (defs (self) :inc (args (arg :n)) (send (lvar :n) :+ (int 1))))";
    assert_eq!(
        run(dump, "W.inc", &[i64::from(i32::MAX)]),
        Some(Value::I32(i32::MIN))
    );
}

#[test]
fn test_widening_casts() {
    let dump = "(class (const nil :W) nil
      (begin
        (defs (self) :unsigned (args (arg :n))
          (begin
            (send nil :result (sym :I64))
            (send (lvar :n) :cast_to (sym :I64))))
        (defs (self) :signed (args (arg :n))
          (begin
            (send nil :result (sym :I64))
            (send (lvar :n) :cast_to (sym :I64) (sym :signed))))))";
    assert_eq!(run(dump, "W.unsigned", &[-1]), Some(Value::I64(0xFFFF_FFFF)));
    assert_eq!(run(dump, "W.signed", &[-1]), Some(Value::I64(-1)));
}

#[test]
fn test_short_circuit() {
    let dump = "(class (const nil :Logic) nil
      (defs (self) :both (args (arg :a) (arg :b))
        (and (send (lvar :a) :> (int 0)) (send (lvar :b) :> (int 0)))))";
    assert_eq!(run(dump, "Logic.both", &[1, 1]), Some(Value::I32(1)));
    assert_eq!(run(dump, "Logic.both", &[0, 1]), Some(Value::I32(0)));
}

#[test]
fn test_string_literal_in_memory() {
    let ctx = compile(r#"(class (const nil :S) nil
      (defs (self) :greeting (args) (str "hey")))"#);
    let mut interp = Interpreter::new(&ctx).unwrap();
    let address = interp.invoke("S.greeting", &[]).unwrap().unwrap();
    assert_eq!(interp.memory().c_string(address.as_address()).unwrap(), b"hey");
}

#[test]
fn test_objects_and_bump_allocator() {
    let dump = "(gvasgn :$heap (int 1024))
      (def :allocate (args (arg :nbytes))
        (begin
          (lvasgn :p (gvar :$heap))
          (op-asgn (gvasgn :$heap) :+ (lvar :nbytes))
          (lvar :p)))
      (class (const nil :Pair) nil
        (begin
          (send nil :attr_accessor (sym :a) (sym :b))
          (defs (self) :run (args)
            (begin
              (lvasgn :p (send (const nil :Pair) :new))
              (send (lvar :p) :a= (int 3))
              (send (lvar :p) :b= (int 4))
              (send (send (lvar :p) :a) :+ (send (lvar :p) :b))))))";
    let ctx = compile(dump);
    let mut interp = Interpreter::new(&ctx).unwrap();
    assert_eq!(interp.invoke("Pair.run", &[]).unwrap(), Some(Value::I32(7)));
    assert_eq!(interp.global("heap"), Some(Value::I32(1032)));
    assert_eq!(interp.memory().load(garnet_types::NativeType::I32, 1028).unwrap(), Value::I32(4));
}

// ── Host functions ──────────────────────────────────────────────

const IO: &str = "(class (const nil :Io) nil
  (begin
    (defs (self) :put (args (arg :v))
      (begin
        (send nil :import (sym :env) (sym :put))
        (send nil :result (sym :none))))
    (defs (self) :main (args)
      (begin
        (send nil :put (int 42))
        (send nil :put (int 7))
        (int 0)))))";

#[test]
fn test_host_function_receives_arguments() {
    let ctx = compile(IO);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut interp = Interpreter::new(&ctx).unwrap();
    interp.register_host("env", "put", move |_, args| {
        sink.borrow_mut().extend(args.iter().map(|v| v.as_i64()));
        Ok(None)
    });
    assert_eq!(interp.invoke("Io.main", &[]).unwrap(), Some(Value::I32(0)));
    assert_eq!(*seen.borrow(), vec![42, 7]);
}

#[test]
fn test_missing_host_function() {
    assert_eq!(trap(IO, "Io.main", &[]), ErrorCode::E6005);
}

// ── Traps ───────────────────────────────────────────────────────

#[test]
fn test_division_by_zero_traps() {
    let dump = "(class (const nil :D) nil
      (defs (self) :div (args (arg :a) (arg :b)) (send (lvar :a) :/ (lvar :b))))";
    assert_eq!(run(dump, "D.div", &[7, 2]), Some(Value::I32(3)));
    assert_eq!(trap(dump, "D.div", &[7, 0]), ErrorCode::E6001);
}

#[test]
fn test_inline_cannot_be_evaluated() {
    let dump = r#"(class (const nil :Raw) nil
      (defs (self) :one (args)
        (send nil :inline (hash (pair (sym :wat) (str "i32.const 1")) (pair (sym :wtype) (sym :I32))))))"#;
    assert_eq!(trap(dump, "Raw.one", &[]), ErrorCode::E6004);
}

#[test]
fn test_call_depth_limit() {
    let dump = "(class (const nil :Deep) nil
      (defs (self) :down (args (arg :n)) (send (self) :down (lvar :n))))";
    let ctx = compile(dump);
    let err = Interpreter::new(&ctx)
        .unwrap()
        .with_max_depth(50)
        .invoke("Deep.down", &[1])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::E6006);
    assert_eq!(err.function.as_deref(), Some("Deep::down"));
}

#[test]
fn test_entry_point_errors() {
    assert_eq!(trap(FIB, "Fib.nope", &[]), ErrorCode::E6003);
    assert_eq!(trap(FIB, "Nope.fib", &[1]), ErrorCode::E6003);
    assert_eq!(trap(FIB, "fib", &[1]), ErrorCode::E6003);
    assert_eq!(trap(FIB, "Fib.fib", &[]), ErrorCode::E6003);
}
