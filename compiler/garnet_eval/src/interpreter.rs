//! Tree-walking evaluation of a finished IR tree.
//!
//! The IR is already in folded stack-machine form: every instruction
//! evaluates its children left to right as operands, and a sequence leaves
//! at most its last value. Branches unwind to the labelled `block` or
//! `loop` node they name, `return` unwinds to the function.

use rustc_hash::FxHashMap;

use garnet_codegen::CompilationContext;
use garnet_ir::{ensure_sufficient_stack, MethodId, NodeId, Offset, Resolve, Template};
use garnet_symbols::{MethodScope, SELF_PARAM};
use garnet_types::{NativeType, WType};

use crate::errors::{
    depth_exhausted, division_by_zero, entry_not_found, host_failure, missing_host, not_evaluable,
    wrong_arg_count,
    EvalError, EvalResult,
};
use crate::memory::Memory;
use crate::value::Value;

/// Default limit on nested calls.
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

/// A host function bound to an import. Receives the arguments and linear
/// memory; returns the result value, if the import has one.
pub type HostFn = Box<dyn FnMut(&mut Memory, &[Value]) -> Result<Option<Value>, String>>;

/// Non-local exits while evaluating a function body.
enum Unwind {
    Branch(NodeId),
    Return(Option<Value>),
    Trap(EvalError),
}

impl From<EvalError> for Unwind {
    fn from(err: EvalError) -> Self {
        Unwind::Trap(err)
    }
}

type Exec<T> = Result<T, Unwind>;

/// Locals of one activation.
struct Frame {
    slots: FxHashMap<String, Value>,
}

impl Frame {
    fn get(&self, name: &str) -> EvalResult<Value> {
        self.slots
            .get(name)
            .copied()
            .ok_or_else(|| not_evaluable(&format!("read of undeclared local `{name}`")))
    }

    fn set(&mut self, name: &str, value: Value) -> EvalResult<()> {
        match self.slots.get_mut(name) {
            Some(slot) => {
                *slot = coerce(*slot, value);
                Ok(())
            }
            None => Err(not_evaluable(&format!("write to undeclared local `{name}`"))),
        }
    }
}

/// Keep a slot's machine type when storing into it.
fn coerce(slot: Value, value: Value) -> Value {
    match slot {
        #[expect(clippy::cast_possible_truncation, reason = "i32 wrap-around semantics")]
        Value::I32(_) => Value::I32(value.as_i64() as i32),
        Value::I64(_) => Value::I64(value.as_i64()),
    }
}

/// Evaluates methods of one compiled unit.
pub struct Interpreter<'a> {
    ctx: &'a CompilationContext,
    memory: Memory,
    globals: FxHashMap<String, Value>,
    hosts: FxHashMap<(String, String), HostFn>,
    depth: usize,
    max_depth: usize,
}

impl<'a> Interpreter<'a> {
    /// Set up memory from the static data image and globals from their
    /// initial values.
    pub fn new(ctx: &'a CompilationContext) -> EvalResult<Self> {
        let memory = Memory::new(ctx.memory_pages(), &ctx.symbols.data.image());
        let mut globals = FxHashMap::default();
        for (_, global) in ctx.symbols.globals() {
            if let Some(value) = global
                .wtype
                .machine_type()
                .map(|ty| Value::of_type(ty, global.init))
                .transpose()?
            {
                globals.insert(global.name.clone(), value);
            }
        }
        tracing::debug!(bytes = memory.size(), globals = globals.len(), "interpreter ready");
        Ok(Interpreter {
            ctx,
            memory,
            globals,
            hosts: FxHashMap::default(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Bind `module.function` imports to `host`.
    pub fn register_host(
        &mut self,
        module: &str,
        function: &str,
        host: impl FnMut(&mut Memory, &[Value]) -> Result<Option<Value>, String> + 'static,
    ) {
        self.hosts
            .insert((module.to_string(), function.to_string()), Box::new(host));
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).copied()
    }

    /// Find `Class.method` (class method) or `Class#method` (instance
    /// method, whose first argument is the receiver address).
    pub fn resolve_entry(&self, entry: &str) -> EvalResult<MethodId> {
        let symbols = &self.ctx.symbols;
        let (class, name, scope) = if let Some((class, name)) = entry.rsplit_once('#') {
            (class, name, MethodScope::Instance)
        } else if let Some((class, name)) = entry.rsplit_once('.') {
            (class, name, MethodScope::Class)
        } else {
            return Err(entry_not_found(entry));
        };
        let class = symbols.find_class(class).ok_or_else(|| entry_not_found(entry))?;
        let method = match scope {
            MethodScope::Instance => symbols.lookup_instance_method(class, name),
            MethodScope::Class => symbols.lookup_class_method(class, name).map(|(m, _)| m),
        };
        method.ok_or_else(|| entry_not_found(entry))
    }

    /// Run `entry` with integer arguments converted to the parameter types.
    #[tracing::instrument(level = "debug", skip(self, args))]
    pub fn invoke(&mut self, entry: &str, args: &[i64]) -> EvalResult<Option<Value>> {
        let method = self.resolve_entry(entry)?;
        let types = self.param_types(method);
        if types.len() != args.len() {
            return Err(wrong_arg_count(entry, types.len(), args.len()));
        }
        let values = types
            .iter()
            .zip(args)
            .map(|(ty, &raw)| Value::of_type(ty.machine_type().unwrap_or(WType::POINTER), raw))
            .collect::<EvalResult<Vec<_>>>()?;
        self.call(method, &values)
    }

    /// Parameter types including the receiver of instance methods.
    fn param_types(&self, method: MethodId) -> Vec<WType> {
        let m = self.ctx.symbols.method(method);
        let receiver = m.is_instance().then_some(WType::Class(m.klass));
        receiver
            .into_iter()
            .chain(m.params.iter().map(|p| p.wtype))
            .collect()
    }

    /// Call `method` with already evaluated arguments.
    pub fn call(&mut self, method: MethodId, args: &[Value]) -> EvalResult<Option<Value>> {
        let ctx = self.ctx;
        let m = ctx.symbols.method(method);
        let name = ctx.symbols.method_name(method);

        if m.is_imported() {
            let Some((module, function)) = &m.import else {
                return Err(missing_host(&name, ""));
            };
            let host = self
                .hosts
                .get_mut(&(module.clone(), function.clone()))
                .ok_or_else(|| missing_host(module, function))?;
            return host(&mut self.memory, args).map_err(|msg| host_failure(module, function, &msg));
        }
        let Some(body) = m.body else {
            return Err(not_evaluable(&format!("`{name}` without a body")).in_function(name));
        };

        if self.depth >= self.max_depth {
            return Err(depth_exhausted(self.max_depth).in_function(name));
        }
        let mut frame = Frame {
            slots: FxHashMap::default(),
        };
        let names = m
            .is_instance()
            .then(|| SELF_PARAM.to_string())
            .into_iter()
            .chain(m.params.iter().map(|p| p.name.clone()));
        for ((slot, ty), &value) in names.zip(self.param_types(method)).zip(args) {
            let value = match ty.machine_type() {
                Some(native) => Value::of_type(native, value.as_i64())?,
                None => value,
            };
            frame.slots.insert(slot, value);
        }
        for local in &m.locals {
            if let Some(zero) = Value::zero(local.wtype)? {
                frame.slots.entry(local.name.clone()).or_insert(zero);
            }
        }
        let result_type = m.wtype;

        tracing::trace!(function = %name, depth = self.depth, "call");
        self.depth += 1;
        let outcome = self.sequence(body, &mut frame);
        self.depth -= 1;

        let value = match outcome {
            Ok(value) | Err(Unwind::Return(value)) => value,
            Err(Unwind::Trap(err)) => return Err(err.in_function(name)),
            Err(Unwind::Branch(_)) => {
                return Err(not_evaluable("branch out of a function").in_function(name));
            }
        };
        if result_type.is_blank() {
            return Ok(None);
        }
        match (value, result_type.machine_type()) {
            (Some(v), Some(native)) => Value::of_type(native, v.as_i64()).map(Some),
            _ => Err(not_evaluable("function ending without its result").in_function(name)),
        }
    }

    /// Children of `node` in order; the value is that of the last one.
    fn sequence(&mut self, node: NodeId, frame: &mut Frame) -> Exec<Option<Value>> {
        let ctx = self.ctx;
        let mut last = None;
        for &child in ctx.tree.children(node) {
            last = self.eval(child, frame)?;
        }
        Ok(last)
    }

    fn operand(&mut self, node: NodeId, frame: &mut Frame) -> Exec<Value> {
        match self.eval(node, frame)? {
            Some(value) => Ok(value),
            None => Err(not_evaluable("an operand without a value").into()),
        }
    }

    /// Values of all children of `node`.
    fn operands(&mut self, node: NodeId, frame: &mut Frame) -> Exec<Vec<Value>> {
        let ctx = self.ctx;
        let children = ctx.tree.children(node);
        let mut values = Vec::with_capacity(children.len());
        for &child in children {
            if let Some(value) = self.eval(child, frame)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    fn binary_operands(&mut self, node: NodeId, frame: &mut Frame) -> Exec<(Value, Value)> {
        match self.operands(node, frame)?.as_slice() {
            &[a, b] => Ok((a, b)),
            _ => Err(not_evaluable("a binary instruction without two operands").into()),
        }
    }

    fn unary_operand(&mut self, node: NodeId, frame: &mut Frame) -> Exec<Value> {
        match self.operands(node, frame)?.as_slice() {
            &[a] => Ok(a),
            _ => Err(not_evaluable("a unary instruction without one operand").into()),
        }
    }

    fn effective_address(&self, base: Value, offset: Offset) -> u64 {
        let offset = match offset {
            Offset::Fixed(n) => i64::from(n),
            Offset::Lazy(lazy) => self.ctx.symbols.lazy(lazy),
        };
        base.as_address().wrapping_add_signed(offset)
    }

    fn eval(&mut self, node: NodeId, frame: &mut Frame) -> Exec<Option<Value>> {
        ensure_sufficient_stack(|| self.eval_node(node, frame))
    }

    fn eval_node(&mut self, node: NodeId, frame: &mut Frame) -> Exec<Option<Value>> {
        let ctx = self.ctx;
        let tree = &ctx.tree;
        let ty = tree.wtype(node);
        let machine = ty.machine_type().unwrap_or(WType::POINTER);
        match tree.template(node) {
            Template::Root | Template::ClassBody(_) | Template::Method(_) => {
                Err(not_evaluable("a definition inside a function body").into())
            }
            Template::Then | Template::Else | Template::Nop => self.sequence(node, frame),

            Template::Call(method) => {
                let method = *method;
                let args = self.operands(node, frame)?;
                Ok(self.call(method, &args)?)
            }
            Template::Return => {
                let value = self.sequence(node, frame)?;
                Err(Unwind::Return(value))
            }

            Template::Const(value) => Ok(Some(Value::of_type(machine, *value)?)),
            Template::ConstLazy(lazy) => {
                let value = ctx.symbols.lazy(*lazy);
                Ok(Some(Value::of_type(NativeType::I32, value)?))
            }
            Template::LocalGet(name) => Ok(Some(frame.get(name)?)),
            Template::LocalSet(name) | Template::LocalTee(name) => {
                let tee = matches!(tree.template(node), Template::LocalTee(_));
                let value = self.unary_operand(node, frame)?;
                frame.set(name, value)?;
                Ok(tee.then(|| frame.get(name)).transpose()?)
            }
            Template::GlobalGet(name) => match self.globals.get(name) {
                Some(&value) => Ok(Some(value)),
                None => Err(not_evaluable(&format!("read of unknown global `{name}`")).into()),
            },
            Template::GlobalSet(name) => {
                let value = self.unary_operand(node, frame)?;
                match self.globals.get_mut(name) {
                    Some(slot) => {
                        *slot = coerce(*slot, value);
                        Ok(None)
                    }
                    None => Err(not_evaluable(&format!("write to unknown global `{name}`")).into()),
                }
            }
            Template::Load { offset } => {
                let offset = *offset;
                let base = self.unary_operand(node, frame)?;
                let address = self.effective_address(base, offset);
                Ok(Some(self.memory.load(machine, address)?))
            }
            Template::Store { ty: store_ty, offset } => {
                let (store_ty, offset) = (*store_ty, *offset);
                let (base, value) = self.binary_operands(node, frame)?;
                let address = self.effective_address(base, offset);
                self.memory.store(store_ty, address, value)?;
                Ok(None)
            }

            Template::Binary(op) => {
                let op = *op;
                let (a, b) = self.binary_operands(node, frame)?;
                let native = a.native();
                let result = op.apply(native, a.as_i64(), b.as_i64()).ok_or_else(division_by_zero)?;
                Ok(Some(Value::of_type(native, result)?))
            }
            Template::Unary(op) => {
                let op = *op;
                let a = self.unary_operand(node, frame)?;
                let result = op
                    .apply(a.native(), a.as_i64())
                    .ok_or_else(|| not_evaluable("a floating point operator"))?;
                Ok(Some(Value::of_type(op.result_type(a.native()), result)?))
            }
            Template::Compare { op, .. } => {
                let op = *op;
                let (a, b) = self.binary_operands(node, frame)?;
                Ok(Some(Value::I32(i32::from(op.apply(a.as_i64(), b.as_i64())))))
            }
            Template::Extend { signed } => {
                let signed = *signed;
                let a = self.unary_operand(node, frame)?;
                let value = match a {
                    #[expect(clippy::cast_sign_loss, reason = "zero extension")]
                    Value::I32(v) if !signed => i64::from(v as u32),
                    other => other.as_i64(),
                };
                Ok(Some(Value::I64(value)))
            }
            Template::Wrap => {
                let a = self.unary_operand(node, frame)?;
                Ok(Some(Value::of_type(NativeType::I32, a.as_i64())?))
            }

            Template::If => self.eval_if(node, frame),
            Template::Block => match self.sequence(node, frame) {
                Err(Unwind::Branch(target)) if target == node => Ok(None),
                other => other,
            },
            Template::Loop => loop {
                match self.sequence(node, frame) {
                    Err(Unwind::Branch(target)) if target == node => {}
                    other => break other,
                }
            },
            Template::Br(target) => Err(Unwind::Branch(*target)),
            Template::BrIf(target) => {
                let target = *target;
                if self.unary_operand(node, frame)?.is_true() {
                    Err(Unwind::Branch(target))
                } else {
                    Ok(None)
                }
            }
            Template::Drop => {
                self.sequence(node, frame)?;
                Ok(None)
            }

            Template::Inline(_) => Err(not_evaluable("inline instruction text").into()),
            Template::Comment(_) => Ok(None),
        }
    }

    /// Children: condition, `then`, optional `else`.
    fn eval_if(&mut self, node: NodeId, frame: &mut Frame) -> Exec<Option<Value>> {
        let ctx = self.ctx;
        let children = ctx.tree.children(node);
        let Some((&condition, arms)) = children.split_first() else {
            return Err(not_evaluable("an `if` without a condition").into());
        };
        let arm = if self.operand(condition, frame)?.is_true() {
            arms.first().copied()
        } else {
            arms.get(1).copied()
        };
        match arm {
            Some(arm) => self.sequence(arm, frame),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests;
