#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use garnet_diagnostic::ErrorCode;
use garnet_ir::{render_to_string, IrTree, NodeId, Span, Template};
use garnet_symbols::{ClassKind, MethodScope};
use garnet_types::{ClassId, WType};

use crate::{CallReceiver, CompilationContext};

const S: Span = Span::DUMMY;

fn class(ctx: &mut CompilationContext, name: &str) -> (ClassId, NodeId) {
    ctx.begin_class(IrTree::ROOT, name, ClassKind::Class, None, S)
        .unwrap()
}

fn render(ctx: &CompilationContext, node: NodeId) -> String {
    render_to_string(&ctx.tree, node, &ctx.symbols)
}

#[test]
fn test_cast_is_idempotent() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Wide");
    let (m, node) = ctx
        .begin_method(body, c, "widen", MethodScope::Class, S)
        .unwrap();
    ctx.method_param(m, "n", S).unwrap();
    let get = ctx.local_get(node, "n", S).unwrap();

    let extended = ctx.cast(get, WType::I64, true, S).unwrap();
    assert_eq!(ctx.tree.template(extended), &Template::Extend { signed: true });
    let len = ctx.tree.len();
    let again = ctx.cast(extended, WType::I64, true, S).unwrap();
    assert_eq!(again, extended);
    assert_eq!(ctx.tree.len(), len);
}

#[test]
fn test_literal_is_retyped_not_wrapped() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Lit");
    let (_, node) = ctx
        .begin_method(body, c, "big", MethodScope::Class, S)
        .unwrap();
    let lit = ctx.int_literal(node, 7, S);
    let cast = ctx.cast(lit, WType::I64, true, S).unwrap();
    assert_eq!(cast, lit);
    assert_eq!(ctx.tree.wtype(lit), WType::I64);
    assert_eq!(ctx.tree.children(node).len(), 1);
}

#[test]
fn test_float_cast_not_supported() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "F");
    let (_, node) = ctx
        .begin_method(body, c, "f", MethodScope::Class, S)
        .unwrap();
    let lit = ctx.int_literal(node, 1, S);
    let err = ctx.cast(lit, WType::F32, true, S).unwrap_err();
    assert_eq!(err.code, ErrorCode::E3002);
}

#[test]
fn test_literals_fold() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Fold");
    let (_, node) = ctx
        .begin_method(body, c, "five", MethodScope::Class, S)
        .unwrap();
    let op = ctx.tree.add(node, Template::Nop, WType::Blank);
    ctx.int_literal(op, 2, S);
    ctx.int_literal(op, 3, S);
    let folded = ctx.operator(op, "+", S).unwrap();
    assert_eq!(ctx.tree.template(folded), &Template::Const(5));
    assert!(ctx.tree.children(folded).is_empty());
}

#[test]
fn test_mixed_widths_promote_to_i64() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Mix");
    let (m, node) = ctx
        .begin_method(body, c, "mix", MethodScope::Class, S)
        .unwrap();
    ctx.method_param(m, "a", S).unwrap();
    ctx.method_param(m, "b", S).unwrap();
    ctx.symbols.method_mut(m).set_param_type("b", WType::I64);
    let op = ctx.tree.add(node, Template::Nop, WType::Blank);
    ctx.local_get(op, "a", S).unwrap();
    ctx.local_get(op, "b", S).unwrap();
    let sum = ctx.operator(op, "+", S).unwrap();
    assert_eq!(
        render(&ctx, sum),
        "(i64.add\n  (i64.extend_i32_s\n    (local.get $a))\n  (local.get $b))\n"
    );
}

#[test]
fn test_pointer_arithmetic_scales_by_size() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Cell");
    ctx.symbols.declare_ivar(c, "v", WType::I64, true);
    let (_, node) = ctx
        .begin_method(body, c, "succ", MethodScope::Instance, S)
        .unwrap();
    let op = ctx.tree.add(node, Template::Nop, WType::Blank);
    ctx.local_get(op, "_self_", S).unwrap();
    ctx.int_literal(op, 1, S);
    let sum = ctx.operator(op, "+", S).unwrap();
    assert_eq!(ctx.tree.wtype(sum), WType::Class(c));
    assert_eq!(
        render(&ctx, sum),
        "(i32.add\n  (local.get $_self_)\n  (i32.mul\n    (i32.const 1)\n    (call $Cell::_size_)))\n"
    );
}

#[test]
fn test_pointer_difference_divides_by_size() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Node");
    let (m, node) = ctx
        .begin_method(body, c, "distance", MethodScope::Instance, S)
        .unwrap();
    ctx.method_param(m, "other", S).unwrap();
    ctx.symbols
        .method_mut(m)
        .set_param_type("other", WType::Class(c));
    let op = ctx.tree.add(node, Template::Nop, WType::Blank);
    ctx.local_get(op, "_self_", S).unwrap();
    ctx.local_get(op, "other", S).unwrap();
    let diff = ctx.operator(op, "-", S).unwrap();
    assert_eq!(ctx.tree.wtype(diff), WType::I32);
    assert_eq!(
        render(&ctx, diff),
        "(i32.div_s\n  (i32.sub\n    (local.get $_self_)\n    (local.get $other))\n  (call $Node::_size_))\n"
    );
}

#[test]
fn test_pointer_multiply_rejected() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "P");
    let (_, node) = ctx
        .begin_method(body, c, "bad", MethodScope::Instance, S)
        .unwrap();
    let op = ctx.tree.add(node, Template::Nop, WType::Blank);
    ctx.local_get(op, "_self_", S).unwrap();
    ctx.int_literal(op, 2, S);
    assert_eq!(ctx.operator(op, "*", S).unwrap_err().code, ErrorCode::E3003);
}

#[test]
fn test_if_in_value_position_synthesizes_else() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Pick");
    let (m, node) = ctx
        .begin_method(body, c, "pick", MethodScope::Class, S)
        .unwrap();
    ctx.method_param(m, "a", S).unwrap();
    let branch = ctx.tree.add(node, Template::If, WType::Blank);
    let cond = ctx.local_get(branch, "a", S).unwrap();
    ctx.condition(cond).unwrap();
    let then_arm = ctx.tree.add(branch, Template::Then, WType::Blank);
    ctx.int_literal(then_arm, 5, S);
    ctx.finish_if(branch, true, S).unwrap();
    assert_eq!(
        render(&ctx, branch),
        "(if (result i32)\n  (local.get $a)\n  (then\n    (i32.const 5))\n  (else\n    (i32.const 0)))\n"
    );
}

#[test]
fn test_if_arms_of_different_classes_rejected() {
    let mut ctx = CompilationContext::default();
    let (a, _) = class(&mut ctx, "A");
    let (b, body) = class(&mut ctx, "B");
    let (m, node) = ctx
        .begin_method(body, b, "choose", MethodScope::Class, S)
        .unwrap();
    ctx.method_param(m, "x", S).unwrap();
    ctx.method_param(m, "y", S).unwrap();
    ctx.symbols.method_mut(m).set_param_type("x", WType::Class(a));
    ctx.symbols.method_mut(m).set_param_type("y", WType::Class(b));
    let branch = ctx.tree.add(node, Template::If, WType::Blank);
    ctx.int_literal(branch, 1, S);
    let then_arm = ctx.tree.add(branch, Template::Then, WType::Blank);
    ctx.local_get(then_arm, "x", S).unwrap();
    let else_arm = ctx.tree.add(branch, Template::Else, WType::Blank);
    ctx.local_get(else_arm, "y", S).unwrap();
    assert_eq!(ctx.finish_if(branch, true, S).unwrap_err().code, ErrorCode::E3005);
}

#[test]
fn test_while_loop_shape() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Counter");
    let (m, node) = ctx
        .begin_method(body, c, "count", MethodScope::Class, S)
        .unwrap();
    ctx.method_param(m, "n", S).unwrap();

    let (block, lp) = ctx.loop_shell(node, S);
    let exit = ctx.tree.add(lp, Template::BrIf(block), WType::Blank);
    let test = ctx.tree.add(exit, Template::Nop, WType::Blank);
    ctx.local_get(test, "n", S).unwrap();
    ctx.int_literal(test, 0, S);
    ctx.operator(test, ">", S).unwrap();
    ctx.branch_if(exit, true).unwrap();

    let assign = ctx.tree.add(lp, Template::Nop, WType::Blank);
    let dec = ctx.tree.add(assign, Template::Nop, WType::Blank);
    ctx.local_get(dec, "n", S).unwrap();
    ctx.int_literal(dec, 1, S);
    ctx.operator(dec, "-", S).unwrap();
    ctx.local_assign(assign, "n", false, S).unwrap();
    ctx.loop_back(lp);

    ctx.local_get(node, "n", S).unwrap();
    ctx.finish_method(m, node).unwrap();

    let expected = "\
(func $Counter::count (param $n i32) (result i32)
  (block $block0
    (loop $loop1
      (br_if $block0
        (i32.eqz
          (i32.gt_s
            (local.get $n)
            (i32.const 0))))
      (local.set $n
        (i32.sub
          (local.get $n)
          (i32.const 1)))
      (br $loop1)))
  (local.get $n))
";
    assert_eq!(render(&ctx, node), expected);
}

#[test]
fn test_break_outside_loop() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Brk");
    let (_, node) = ctx
        .begin_method(body, c, "run", MethodScope::Class, S)
        .unwrap();
    assert_eq!(ctx.break_loop(node, S).unwrap_err().code, ErrorCode::E2004);
}

#[test]
fn test_short_circuit_and() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Logic");
    let (m, node) = ctx
        .begin_method(body, c, "both", MethodScope::Class, S)
        .unwrap();
    ctx.method_param(m, "a", S).unwrap();
    ctx.method_param(m, "b", S).unwrap();
    let and = ctx.tree.add(node, Template::If, WType::Blank);
    ctx.local_get(and, "a", S).unwrap();
    ctx.local_get(and, "b", S).unwrap();
    ctx.short_circuit(and, true, S).unwrap();
    assert_eq!(
        render(&ctx, and),
        "(if (result i32)\n  (local.get $a)\n  (then\n    (i32.ne\n      (local.get $b)\n      (i32.const 0)))\n  (else\n    (i32.const 0)))\n"
    );
}

#[test]
fn test_blank_method_drops_last_value() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Init");
    let (m, node) = ctx
        .begin_method(body, c, "initialize", MethodScope::Instance, S)
        .unwrap();
    assert!(ctx.symbols.method(m).wtype.is_blank());
    ctx.int_literal(node, 3, S);
    ctx.finish_method(m, node).unwrap();
    let last = ctx.tree.last_child(node).unwrap();
    assert_eq!(ctx.tree.template(last), &Template::Drop);
}

#[test]
fn test_missing_result_value() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Empty");
    let (m, node) = ctx
        .begin_method(body, c, "value", MethodScope::Class, S)
        .unwrap();
    let err = ctx.finish_method(m, node).unwrap_err();
    assert_eq!(err.code, ErrorCode::E3004);
}

#[test]
fn test_method_redefinition_rejected() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Twice");
    let (m, node) = ctx
        .begin_method(body, c, "f", MethodScope::Class, S)
        .unwrap();
    ctx.int_literal(node, 1, S);
    ctx.finish_method(m, node).unwrap();
    let err = ctx
        .begin_method(body, c, "f", MethodScope::Class, S)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::E4001);
}

#[test]
fn test_finish_class_synthesizes_new() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Point");
    ctx.symbols.declare_ivar(c, "x", WType::I32, true);
    ctx.finish_class(c, body).unwrap();

    let new = ctx
        .symbols
        .class(c)
        .method("new", MethodScope::Class)
        .unwrap();
    let node = ctx.symbols.method(new).body.unwrap();
    let expected = "\
(func $Point::new (result i32) (local $_obj_ i32)
  (local.set $_obj_
    (call $Object::allocate
      (call $Point::_size_)))
  (call $Point#initialize
    (local.get $_obj_))
  (local.get $_obj_))
";
    assert_eq!(render(&ctx, node), expected);
    assert_eq!(ctx.symbols.method(new).wtype, WType::Class(c));
}

#[test]
fn test_new_takes_initialize_params() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Pair");
    let (init, node) = ctx
        .begin_method(body, c, "initialize", MethodScope::Instance, S)
        .unwrap();
    ctx.method_param(init, "a", S).unwrap();
    ctx.finish_method(init, node).unwrap();
    ctx.finish_class(c, body).unwrap();

    let new = ctx.symbols.lookup_class_method(c, "new").unwrap().0;
    let params: Vec<&str> = ctx
        .symbols
        .method(new)
        .params
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(params, ["a"]);
}

#[test]
fn test_accessors_follow_attr_type() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Header");
    ctx.declare_attr(c, "size", true, true, S).unwrap();
    ctx.attr_type(c, "size", WType::I64, S).unwrap();
    ctx.finish_class(c, body).unwrap();

    let reader = ctx.symbols.lookup_instance_method(c, "size").unwrap();
    assert_eq!(ctx.symbols.method(reader).wtype, WType::I64);
    let writer = ctx.symbols.lookup_instance_method(c, "size=").unwrap();
    let node = ctx.symbols.method(writer).body.unwrap();
    assert_eq!(
        render(&ctx, node),
        "(func $Header#size= (param $_self_ i32) (param $value i64)\n  (i64.store\n    (local.get $_self_)\n    (local.get $value)))\n"
    );
}

#[test]
fn test_call_checks_arity() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Callee");
    let target = ctx
        .symbols
        .declare_method(c, "two", MethodScope::Class, S);
    ctx.symbols.method_mut(target).add_param("a", WType::I32);
    ctx.symbols.method_mut(target).add_param("b", WType::I32);
    let (_, node) = ctx
        .begin_method(body, c, "caller", MethodScope::Class, S)
        .unwrap();
    let call = ctx.tree.add(node, Template::Nop, WType::Blank);
    ctx.int_literal(call, 1, S);
    let err = ctx
        .call(call, target, CallReceiver::Absent, S)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::E3006);
}

#[test]
fn test_link_check_reports_missing_body() {
    let mut ctx = CompilationContext::default();
    let (c, body) = class(&mut ctx, "Linker");
    let target = ctx
        .symbols
        .declare_method(c, "later", MethodScope::Class, S);
    let (m, node) = ctx
        .begin_method(body, c, "now", MethodScope::Class, S)
        .unwrap();
    let call = ctx.tree.add(node, Template::Nop, WType::Blank);
    ctx.call(call, target, CallReceiver::Absent, S).unwrap();
    ctx.finish_method(m, node).unwrap();
    assert_eq!(ctx.link_check().unwrap_err().code, ErrorCode::E1003);
}

#[test]
fn test_module_section_order() {
    let mut ctx = CompilationContext::default();
    ctx.global_declare("heap", 1024, WType::I32, S).unwrap();
    let (c, body) = class(&mut ctx, "Greeter");
    let (_, node) = ctx
        .begin_method(body, c, "hello", MethodScope::Class, S)
        .unwrap();
    ctx.string_literal(node, b"hi", S);

    let text = ctx.emit_module();
    let memory = text.find("(memory $0 1)").unwrap();
    let global = text.find("(global $heap (mut i32) (i32.const 1024))").unwrap();
    let data = text.find("(data (i32.const 0) \"hi\\00\") ;; str0").unwrap();
    let func = text.find("(func $Greeter::hello (result i32)").unwrap();
    assert!(text.starts_with("(module\n"));
    assert!(memory < global && global < data && data < func);
    assert!(text.ends_with(")\n"));
}

#[test]
fn test_memory_grows_with_data() {
    let mut ctx = CompilationContext::default();
    ctx.symbols
        .data
        .set_address(70_000, S)
        .unwrap();
    ctx.string_address(b"x");
    assert_eq!(ctx.memory_pages(), 2);
}
