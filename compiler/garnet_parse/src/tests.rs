#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use garnet_codegen::CompilationContext;
use garnet_diagnostic::{CompileResult, ErrorCode};

use crate::{parse_program, SourceLoader};

fn compile_with(loader: &mut SourceLoader, dump: &str) -> CompileResult<CompilationContext> {
    let mut ctx = CompilationContext::default();
    let unit = loader.open_in_memory("main", dump)?;
    parse_program(&mut ctx, loader, &unit)?;
    Ok(ctx)
}

fn compile(dump: &str) -> CompileResult<CompilationContext> {
    compile_with(&mut SourceLoader::new(), dump)
}

fn wat(dump: &str) -> String {
    compile(dump).unwrap().emit_module()
}

fn error_code(dump: &str) -> ErrorCode {
    match compile(dump) {
        Ok(_) => panic!("expected an error compiling:\n{dump}"),
        Err(d) => d.code,
    }
}

// ── Methods and directives ──────────────────────────────────────

#[test]
fn test_class_method_signature() {
    let out = wat("(class (const nil :Calc) nil
        (defs (self) :twice (args (arg :n))
          (send (lvar :n) :* (int 2))))");
    assert!(out.contains("$Calc::twice (param $n i32) (result i32)"), "{out}");
}

#[test]
fn test_arg_and_result_directives() {
    let out = wat("(class (const nil :Calc) nil
        (defs (self) :widen (args (arg :n))
          (begin
            (send nil :arg (hash (pair (sym :n) (sym :I64))))
            (send nil :result (sym :I64))
            (lvar :n))))");
    assert!(out.contains("$Calc::widen (param $n i64) (result i64)"), "{out}");
}

#[test]
fn test_result_none_drops_last_value() {
    let ctx = compile("(class (const nil :Calc) nil
        (defs (self) :noop (args)
          (begin
            (send nil :result (sym :none))
            (int 1))))").unwrap();
    let out = ctx.emit_module();
    assert!(!out.contains("$Calc::noop (result"), "{out}");
    assert!(ctx.dump_ir().contains("Drop"));
}

#[test]
fn test_only_discarded_statements_are_dropped() {
    let out = wat("(class (const nil :Calc) nil
        (defs (self) :stack (args (arg :n))
          (begin
            (send (lvar :n) :+ (int 1))
            (lvasgn :m (lvar :n))
            (send (lvar :n) :* (int 2))
            (lvar :m))))");
    let start = out.find("(func $Calc::stack").unwrap();
    let body = &out[start..];
    let body = &body[..body[1..].find("(func ").map_or(body.len(), |i| i + 1)];
    assert_eq!(body.matches("(drop").count(), 2, "{body}");
}

#[test]
fn test_pending_export_applies_to_next_method() {
    let out = wat("(class (const nil :Calc) nil
        (begin
          (send nil :export)
          (defs (self) :twice (args (arg :n))
            (send (lvar :n) :* (int 2)))))");
    assert!(out.contains("(export \"twice_c_calc\" (func $Calc::twice))"), "{out}");
}

#[test]
fn test_export_with_name_inside_method() {
    let out = wat("(class (const nil :Calc) nil
        (defs (self) :twice (args (arg :n))
          (begin
            (send nil :export (sym :double))
            (send (lvar :n) :* (int 2)))))");
    assert!(out.contains("(export \"double\" (func $Calc::twice))"), "{out}");
}

#[test]
fn test_method_exported_under_two_names() {
    let out = wat("(class (const nil :Calc) nil
        (begin
          (send nil :export)
          (defs (self) :twice (args (arg :n))
            (begin
              (send nil :export (sym :double))
              (send (lvar :n) :* (int 2))))))");
    assert!(out.contains("(export \"twice_c_calc\" (func $Calc::twice))"), "{out}");
    assert!(out.contains("(export \"double\" (func $Calc::twice))"), "{out}");
}

#[test]
fn test_two_pending_exports_rejected() {
    let code = error_code("(class (const nil :Calc) nil
        (begin
          (send nil :export)
          (send nil :export)))");
    assert_eq!(code, ErrorCode::E5004);
}

#[test]
fn test_import_declares_host_function() {
    let out = wat("(class (const nil :Host) nil
        (defs (self) :log (args (arg :v))
          (begin
            (send nil :import (sym :env) (sym :log))
            (send nil :result (sym :none)))))");
    assert!(out.contains("(import \"env\" \"log\" (func $Host::log (param $v i32)))"), "{out}");
    assert!(!out.contains("(func $Host::log (param $v i32)\n"), "{out}");
}

#[test]
fn test_imported_method_with_body_rejected() {
    let code = error_code("(class (const nil :Host) nil
        (defs (self) :log (args (arg :v))
          (begin
            (send nil :import (sym :env) (sym :log))
            (send nil :result (sym :none))
            (int 1))))");
    assert_eq!(code, ErrorCode::E4006);
}

#[test]
fn test_inline_text_is_emitted() {
    let out = wat(r#"(class (const nil :Raw) nil
        (defs (self) :one (args)
          (send nil :inline (hash (pair (sym :wat) (str "i32.const 1")) (pair (sym :wtype) (sym :I32))))))"#);
    assert!(out.contains("i32.const 1"), "{out}");
}

#[test]
fn test_arg_for_unknown_parameter() {
    let code = error_code("(class (const nil :Calc) nil
        (defs (self) :f (args)
          (send nil :arg (hash (pair (sym :n) (sym :I64))))))");
    assert_eq!(code, ErrorCode::E1002);
}

#[test]
fn test_unknown_type_name() {
    let code = error_code("(class (const nil :Calc) nil
        (defs (self) :f (args)
          (send nil :result (sym :Nope))))");
    assert_eq!(code, ErrorCode::E1004);
}

// ── Scope rules ─────────────────────────────────────────────────

#[test]
fn test_statement_outside_method() {
    assert_eq!(
        error_code("(class (const nil :A) nil (send (int 1) :+ (int 2)))"),
        ErrorCode::E2003
    );
    assert_eq!(error_code("(lvasgn :x (int 1))"), ErrorCode::E2003);
}

#[test]
fn test_ivar_in_class_method() {
    let code = error_code("(class (const nil :A) nil
        (defs (self) :f (args) (ivar :@x)))");
    assert_eq!(code, ErrorCode::E2001);
}

#[test]
fn test_directive_in_wrong_scope() {
    let code = error_code("(class (const nil :A) nil
        (send nil :arg (hash (pair (sym :x) (sym :I64)))))");
    assert_eq!(code, ErrorCode::E2006);

    let code = error_code("(class (const nil :A) nil
        (defs (self) :f (args)
          (begin
            (send nil :attr_reader (sym :x))
            (int 0))))");
    assert_eq!(code, ErrorCode::E2006);
}

#[test]
fn test_break_outside_loop() {
    let code = error_code("(class (const nil :A) nil
        (defs (self) :f (args) (break)))");
    assert_eq!(code, ErrorCode::E2004);
}

#[test]
fn test_missing_result_value() {
    let code = error_code("(class (const nil :A) nil
        (defs (self) :f (args) (while (false) (int 1))))");
    assert_eq!(code, ErrorCode::E3004);
}

#[test]
fn test_unsupported_nodes() {
    let code = error_code("(class (const nil :A) nil
        (defs (self) :f (args) (float 1.5)))");
    assert_eq!(code, ErrorCode::E5001);

    let code = error_code("(class (const nil :A) nil
        (defs (self) :f (args) (array (int 1))))");
    assert_eq!(code, ErrorCode::E5001);
}

// ── Calls ───────────────────────────────────────────────────────

#[test]
fn test_forward_call_resolved_later() {
    let out = wat("(class (const nil :A) nil
        (begin
          (defs (self) :f (args) (send nil :g (int 1)))
          (defs (self) :g (args (arg :n)) (lvar :n))))");
    assert!(out.contains("call $A::g"), "{out}");
}

#[test]
fn test_call_to_undefined_method() {
    let code = error_code("(class (const nil :A) nil
        (defs (self) :f (args) (send nil :missing)))");
    assert_eq!(code, ErrorCode::E1003);
}

#[test]
fn test_included_module_method() {
    let out = wat("(module (const nil :Greets) (def :hello (args) (int 7)))
        (class (const nil :Person) nil
          (begin
            (send nil :include (const nil :Greets))
            (defs (self) :run (args)
              (send (send (const nil :Person) :new) :hello))))");
    assert!(out.contains("call $Greets#hello"), "{out}");
    assert!(out.contains("call $Person::new"), "{out}");
}

#[test]
fn test_module_cannot_be_instantiated() {
    let code = error_code("(module (const nil :M) nil)
        (class (const nil :A) nil
          (defs (self) :f (args) (send (const nil :M) :new)))");
    assert_eq!(code, ErrorCode::E1003);
}

#[test]
fn test_accessors_on_allocated_object() {
    let out = wat("(def :allocate (args (arg :nbytes)) (int 4096))
        (class (const nil :Point) nil
          (begin
            (send nil :attr_accessor (sym :x))
            (defs (self) :run (args)
              (begin
                (lvasgn :p (send (const nil :Point) :new))
                (send (lvar :p) :x= (int 5))
                (send (lvar :p) :x)))))");
    assert!(out.contains("call $Point#x="), "{out}");
    assert!(out.contains("call $Point#x"), "{out}");
    assert!(out.contains("call $Object::allocate"), "{out}");
}

// ── Constants and static data ───────────────────────────────────

#[test]
fn test_constant_folded_at_declaration() {
    let out = wat("(class (const nil :Sizes) nil
        (begin
          (casgn nil :SIZE (send (int 4) :* (int 8)))
          (defs (self) :size (args) (const nil :SIZE))))");
    assert!(out.contains("i32.const 32"), "{out}");
}

#[test]
fn test_constant_division_by_zero() {
    let code = error_code("(class (const nil :Sizes) nil
        (casgn nil :BAD (send (int 1) :/ (int 0))))");
    assert_eq!(code, ErrorCode::E6001);
}

#[test]
fn test_data_label_address() {
    let ctx = compile(r#"(class (const nil :Tbl) nil
        (begin
          (send (const nil :DAta) :[]= (sym :greeting) (str "hi"))
          (defs (self) :addr (args) (send (const nil :DAta) :[] (sym :greeting)))))"#)
    .unwrap();
    let address = ctx.symbols.data.label_address("greeting").unwrap();
    let out = ctx.emit_module();
    assert!(out.contains("\"hi\") ;; greeting"), "{out}");
    assert!(out.contains(&format!("i32.const {address}")), "{out}");
}

#[test]
fn test_data_unknown_label() {
    let code = error_code("(class (const nil :Tbl) nil
        (defs (self) :addr (args) (send (const nil :DAta) :[] (sym :nothing))))");
    assert_eq!(code, ErrorCode::E1002);
}

#[test]
fn test_global_declaration_and_use() {
    let out = wat("(gvasgn :$counter (int 3))
        (class (const nil :A) nil
          (defs (self) :bump (args)
            (op-asgn (gvasgn :$counter) :+ (int 1))))");
    assert!(out.contains("(global $counter (mut i32) (i32.const 3))"), "{out}");
    assert!(out.contains("global.set $counter"), "{out}");
}

#[test]
fn test_identical_redeclaration_warns() {
    let ctx = compile("(class (const nil :A) nil
        (begin
          (casgn nil :K (int 3))
          (casgn nil :K (int 3))
          (cvasgn :@@n (int 1))
          (cvasgn :@@n (int 1))))")
    .unwrap();
    let codes: Vec<ErrorCode> = ctx.warnings().iter().map(|w| w.code).collect();
    assert_eq!(codes, vec![ErrorCode::W4001, ErrorCode::W4001]);
}

#[test]
fn test_conflicting_redeclaration_rejected() {
    let code = error_code("(class (const nil :A) nil
        (begin
          (casgn nil :K (int 3))
          (casgn nil :K (int 4))))");
    assert_eq!(code, ErrorCode::E4001);

    let code = error_code("(class (const nil :A) nil
        (begin
          (cvasgn :@@n (int 1))
          (cvasgn :@@n (int 2))))");
    assert_eq!(code, ErrorCode::E4001);
}

#[test]
fn test_global_redeclaration_rejected() {
    let code = error_code("(gvasgn :$g (int 1))
        (gvasgn :$g (int 1))");
    assert_eq!(code, ErrorCode::E4002);
}

// ── Units ───────────────────────────────────────────────────────

#[test]
fn test_require_loads_each_unit_once() {
    let mut loader = SourceLoader::new();
    loader.add_unit("lib", "(class (const nil :Lib) nil (defs (self) :one (args) (int 1)))");
    let ctx = compile_with(
        &mut loader,
        r#"(send nil :require (str "lib"))
        (send nil :require (str "lib"))
        (class (const nil :App) nil
          (defs (self) :two (args) (send (send (const nil :Lib) :one) :+ (int 1))))"#,
    )
    .unwrap();
    let out = ctx.emit_module();
    assert_eq!(out.matches("(func $Lib::one").count(), 1, "{out}");
    assert!(out.contains("call $Lib::one"), "{out}");
}

#[test]
fn test_require_missing_unit() {
    let code = error_code(r#"(send nil :require (str "no_such_unit"))"#);
    assert_eq!(code, ErrorCode::E5005);
}

#[test]
fn test_error_names_unit() {
    let mut loader = SourceLoader::new();
    loader.add_unit("broken", "(lvasgn :x (int 1))");
    let err = compile_with(&mut loader, r#"(send nil :require (str "broken"))"#).unwrap_err();
    assert_eq!(err.code, ErrorCode::E2003);
    assert_eq!(err.file.as_deref(), Some("broken"));
}
