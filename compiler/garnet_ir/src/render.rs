//! Text rendering of IR trees.
//!
//! Every instruction node becomes one folded s-expression. Leaves stay on a
//! single line; a node with children opens on its own line, lists its
//! children one indentation level deeper and closes on the last child's
//! line.

use std::fmt::Write;

use garnet_types::{NativeType, WType};

use crate::stack::ensure_sufficient_stack;
use crate::{IrTree, Lazy, MethodId, NodeId, Offset, Template, TemplateKind};

/// Symbol information the renderer cannot know on its own.
pub trait Resolve {
    /// Internal name of a function, without the leading `$`.
    fn func_name(&self, method: MethodId) -> String;

    /// Everything following `func ` in a function definition: name,
    /// parameters, result and locals.
    fn func_header(&self, method: MethodId) -> String;

    /// Value of a lazily computed template argument.
    fn lazy(&self, lazy: Lazy) -> i64;
}

const INDENT: &str = "  ";

/// Render the subtree at `node` into `out`, starting at `depth` levels of
/// indentation. Every emitted line ends with a newline.
pub fn render(tree: &IrTree, node: NodeId, resolve: &dyn Resolve, depth: usize, out: &mut String) {
    ensure_sufficient_stack(|| render_node(tree, node, resolve, depth, out));
}

/// Render the subtree at `node` into a fresh string.
pub fn render_to_string(tree: &IrTree, node: NodeId, resolve: &dyn Resolve) -> String {
    let mut out = String::new();
    render(tree, node, resolve, 0, &mut out);
    out
}

/// Text name of a block or loop label (`$block3`, `$loop4`).
pub fn label_name(tree: &IrTree, target: NodeId) -> String {
    let prefix = match tree.template(target) {
        Template::Loop => "loop",
        _ => "block",
    };
    format!("${prefix}{}", tree.label(target).unwrap_or_default())
}

fn render_node(tree: &IrTree, node: NodeId, resolve: &dyn Resolve, depth: usize, out: &mut String) {
    let template = tree.template(node);
    match template.kind() {
        TemplateKind::Structural => {
            for &child in tree.children(node) {
                render(tree, child, resolve, depth, out);
            }
        }
        TemplateKind::Escape => {
            if let Template::Inline(text) = template {
                for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                    push_indent(out, depth);
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        TemplateKind::Instruction => {
            push_indent(out, depth);
            if let Template::Comment(text) = template {
                let _ = writeln!(out, ";; {text}");
                return;
            }
            out.push('(');
            out.push_str(&head(tree, node, resolve));
            let children = tree.children(node);
            if children.is_empty() {
                out.push_str(")\n");
                return;
            }
            out.push('\n');
            for &child in children {
                render(tree, child, resolve, depth + 1, out);
            }
            let closes_inline = children
                .last()
                .is_some_and(|&last| {
                    !matches!(tree.template(last), Template::Comment(_) | Template::Inline(_))
                });
            if closes_inline && out.ends_with('\n') {
                out.pop();
                out.push_str(")\n");
            } else {
                push_indent(out, depth);
                out.push_str(")\n");
            }
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn machine(ty: WType) -> NativeType {
    ty.machine_type().unwrap_or(WType::POINTER)
}

fn result_suffix(ty: WType) -> String {
    ty.machine_type()
        .map(|n| format!(" (result {})", n.wasm_name()))
        .unwrap_or_default()
}

fn offset_suffix(offset: Offset, resolve: &dyn Resolve) -> String {
    let value = match offset {
        Offset::Fixed(n) => i64::from(n),
        Offset::Lazy(lazy) => resolve.lazy(lazy),
    };
    if value == 0 {
        String::new()
    } else {
        format!(" offset={value}")
    }
}

fn head(tree: &IrTree, node: NodeId, resolve: &dyn Resolve) -> String {
    let ty = tree.wtype(node);
    match tree.template(node) {
        Template::Method(m) => format!("func {}", resolve.func_header(*m)),
        Template::Call(m) => format!("call ${}", resolve.func_name(*m)),
        Template::Return => "return".to_string(),
        Template::Const(value) => format!("{}.const {value}", machine(ty).wasm_name()),
        Template::ConstLazy(lazy) => format!("i32.const {}", resolve.lazy(*lazy)),
        Template::LocalGet(name) => format!("local.get ${name}"),
        Template::LocalSet(name) => format!("local.set ${name}"),
        Template::LocalTee(name) => format!("local.tee ${name}"),
        Template::GlobalGet(name) => format!("global.get ${name}"),
        Template::GlobalSet(name) => format!("global.set ${name}"),
        Template::Load { offset } => format!(
            "{}.load{}",
            machine(ty).wasm_name(),
            offset_suffix(*offset, resolve)
        ),
        Template::Store { ty: stored, offset } => {
            format!("{}.store{}", stored.wasm_name(), offset_suffix(*offset, resolve))
        }
        Template::Binary(op) => format!("{}.{}", machine(ty).wasm_name(), op.mnemonic()),
        Template::Unary(op) => {
            let operand = tree
                .first_child(node)
                .map_or(WType::POINTER, |c| machine(tree.wtype(c)));
            format!("{}.{}", operand.wasm_name(), op.mnemonic())
        }
        Template::Compare { op, operand } => format!("{}.{}", operand.wasm_name(), op.mnemonic()),
        Template::Extend { signed } => {
            format!("i64.extend_i32_{}", if *signed { 's' } else { 'u' })
        }
        Template::Wrap => "i32.wrap_i64".to_string(),
        Template::If => format!("if{}", result_suffix(ty)),
        Template::Then => "then".to_string(),
        Template::Else => "else".to_string(),
        Template::Block | Template::Loop => {
            let keyword = if matches!(tree.template(node), Template::Loop) {
                "loop"
            } else {
                "block"
            };
            format!("{keyword} {}{}", label_name(tree, node), result_suffix(ty))
        }
        Template::Br(target) => format!("br {}", label_name(tree, *target)),
        Template::BrIf(target) => format!("br_if {}", label_name(tree, *target)),
        Template::Drop => "drop".to_string(),
        Template::Nop => "nop".to_string(),
        Template::Root
        | Template::ClassBody(_)
        | Template::Inline(_)
        | Template::Comment(_) => String::new(),
    }
}
