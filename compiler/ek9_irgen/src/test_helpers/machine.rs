//! Reference interpreter for generated IR.
//!
//! Executes instructions with real reference counts so tests can check
//! what the static verifier cannot: which branch ran, which values a loop
//! variable took, the order of resource cleanup, and that every object's
//! count is back to zero when the function returns.
//!
//! Objects start at count 0. `RETAIN`/`RELEASE` move the count; a release
//! to zero frees the object (and releases what it holds). Releasing below
//! zero or touching a freed object is a [`Fault`].
//!
//! Aggregate operations registered with [`Machine::define_aggregate`] run
//! as nested calls with `this` bound to the receiver. Dispatch is by the
//! call's static type, so `super.op()` reaches the parent's operation. A
//! nested call hands its result back fresh, the same way built-in methods
//! do; constructors hand back the allocation itself.

use std::cmp::Ordering;
use std::mem;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use ek9_ir::{
    CallDetails, CallKind, ChainKind, ControlFlowChain, DirectionalCase, ForRangePolymorphic,
    Instr, InstrKind, LogicalBlock, ScopeId, Var,
};

use crate::AggregateIr;
use ek9_tree::{Name, StringInterner, TypeId};
use ek9_types::TypeUniverse;

/// Iterations any single loop may run before the machine gives up.
const LOOP_LIMIT: usize = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ObjId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Value {
    Null,
    Prim(bool),
    Obj(ObjId),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Data {
    Boolean(Option<bool>),
    Integer(Option<i64>),
    Float(Option<f64>),
    String(Option<String>),
    Exception(String),
    Resource(String),
    List(Vec<ObjId>),
    Iterator { list: ObjId, next: usize },
    /// Instance of an aggregate; parent properties first.
    Record {
        ty: TypeId,
        fields: Vec<(Name, Value)>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum Fault {
    #[error("{0:?} read before it was written")]
    UnknownVar(Var),
    #[error("{0:?} is not a primitive boolean")]
    NotPrimitive(Var),
    #[error("`{0}` called on null")]
    NullReceiver(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("object #{} released below zero", .0.0)]
    OverRelease(ObjId),
    #[error("object #{} used after it was freed", .0.0)]
    UseAfterFree(ObjId),
    #[error("exit of {0} does not match the innermost scope")]
    ScopeMismatch(ScopeId),
    #[error("register into {0}, which is not open")]
    RegisterOutsideScope(ScopeId),
    #[error("assertion failed: {0}")]
    Assertion(String),
    #[error("loop did not terminate")]
    Runaway,
}

/// How a function run ended. The value is owned by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Returned(Value),
    Threw(Value),
}

enum Flow {
    Normal,
    Returned(Option<Value>),
    Threw(Value),
}

/// Propagate a non-normal flow out of the current instruction.
macro_rules! proceed {
    ($flow:expr) => {
        match $flow {
            Flow::Normal => {}
            other => return Ok(other),
        }
    };
}

struct Object {
    data: Data,
    count: i64,
    freed: bool,
}

struct Frame {
    scope: ScopeId,
    registered: Vec<Var>,
}

struct Operation {
    params: Vec<Name>,
    body: Vec<Instr>,
    constructor: bool,
}

pub(crate) struct Machine<'a> {
    interner: &'a StringInterner,
    types: &'a TypeUniverse,
    objects: Vec<Object>,
    slots: FxHashMap<Var, Value>,
    frames: Vec<Frame>,
    params: FxHashMap<Var, Value>,
    catching: Option<(Var, Value)>,
    trace: Vec<String>,
    operations: FxHashMap<(TypeId, Name), Rc<Operation>>,
    layouts: FxHashMap<TypeId, Vec<Name>>,
    this: Name,
    super_: Name,
}

impl<'a> Machine<'a> {
    pub(crate) fn new(interner: &'a StringInterner, types: &'a TypeUniverse) -> Self {
        Machine {
            interner,
            types,
            objects: Vec::new(),
            slots: FxHashMap::default(),
            frames: Vec::new(),
            params: FxHashMap::default(),
            catching: None,
            trace: Vec::new(),
            operations: FxHashMap::default(),
            layouts: FxHashMap::default(),
            this: interner.intern("this"),
            super_: interner.intern("super"),
        }
    }

    /// Make the operations of `aggregate` callable. A parent aggregate
    /// must be defined first.
    pub(crate) fn define_aggregate(&mut self, aggregate: &AggregateIr) {
        let mut layout: Vec<Name> = self
            .types
            .get(aggregate.ty)
            .and_then(|def| def.supers.iter().find_map(|sup| self.layouts.get(sup)))
            .cloned()
            .unwrap_or_default();
        layout.extend(aggregate.properties.iter().map(|&(name, _)| name));
        self.layouts.insert(aggregate.ty, layout);

        for op in &aggregate.operations {
            let operation = Operation {
                params: op.params.clone(),
                body: op.instructions.clone(),
                constructor: op.name == aggregate.name,
            };
            self.operations
                .insert((aggregate.ty, op.name), Rc::new(operation));
        }
    }

    /// Bind `this` (and `super`) for running a single operation.
    pub(crate) fn bind_this(&mut self, value: Value) {
        self.slots.insert(Var::Named(self.this), value);
        self.slots.insert(Var::Named(self.super_), value);
    }

    /// A fresh instance of `ty` with every property null.
    pub(crate) fn instance(&mut self, ty: TypeId) -> Value {
        let fields = self
            .layouts
            .get(&ty)
            .map(|names| names.iter().map(|&name| (name, Value::Null)).collect())
            .unwrap_or_default();
        self.alloc(Data::Record { ty, fields })
    }

    // ── Setup and inspection ────────────────────────────────────────

    /// Allocate an object owned by the caller (count 1).
    pub(crate) fn owned(&mut self, data: Data) -> Value {
        let value = self.alloc(data);
        if let Value::Obj(id) = value {
            self.objects[id.0].count = 1;
        }
        value
    }

    /// Value the function's `REFERENCE` of parameter `name` picks up.
    pub(crate) fn bind_param(&mut self, name: Name, value: Value) {
        self.params.insert(Var::Named(name), value);
    }

    pub(crate) fn trace(&self) -> &[String] {
        &self.trace
    }

    /// Objects whose count is not zero.
    pub(crate) fn live(&self) -> Vec<String> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, object)| object.count != 0)
            .map(|(index, object)| {
                format!(
                    "#{index} {} (count {})",
                    self.display_data(&object.data),
                    object.count
                )
            })
            .collect()
    }

    pub(crate) fn display(&self, value: Value) -> String {
        match value {
            Value::Null => "null".to_owned(),
            Value::Prim(b) => b.to_string(),
            Value::Obj(id) => self.display_data(&self.objects[id.0].data),
        }
    }

    fn display_data(&self, data: &Data) -> String {
        fn opt<T: ToString>(value: Option<&T>) -> String {
            value.map_or_else(|| "unset".to_owned(), ToString::to_string)
        }
        match data {
            Data::Boolean(b) => opt(b.as_ref()),
            Data::Integer(i) => opt(i.as_ref()),
            Data::Float(f) => opt(f.as_ref()),
            Data::String(s) => opt(s.as_ref()),
            Data::Exception(message) => format!("Exception({message})"),
            Data::Resource(name) => name.clone(),
            Data::List(items) => {
                let items: Vec<_> = items.iter().map(|&id| self.display(Value::Obj(id))).collect();
                format!("[{}]", items.join(", "))
            }
            Data::Iterator { next, .. } => format!("<iterator at {next}>"),
            Data::Record { ty, fields } => {
                let fields: Vec<_> = fields
                    .iter()
                    .map(|&(name, value)| format!("{}={}", self.text(name), self.display(value)))
                    .collect();
                format!("{}{{{}}}", self.text(self.types.name(*ty)), fields.join(", "))
            }
        }
    }

    // ── Execution ───────────────────────────────────────────────────

    pub(crate) fn run(&mut self, instrs: &[Instr]) -> Result<Outcome, Fault> {
        match self.exec(instrs)? {
            Flow::Normal => Ok(Outcome::Returned(Value::Null)),
            Flow::Returned(value) => Ok(Outcome::Returned(value.unwrap_or(Value::Null))),
            Flow::Threw(value) => {
                self.unwind(0)?;
                Ok(Outcome::Threw(value))
            }
        }
    }

    fn exec(&mut self, instrs: &[Instr]) -> Result<Flow, Fault> {
        for instr in instrs {
            proceed!(self.step(instr)?);
        }
        Ok(Flow::Normal)
    }

    fn step(&mut self, instr: &Instr) -> Result<Flow, Fault> {
        match &instr.kind {
            InstrKind::Reference { var, .. } => {
                let value = match self.catching {
                    Some((caught, value)) if caught == *var => {
                        self.catching = None;
                        value
                    }
                    _ => self.params.get(var).copied().unwrap_or(Value::Null),
                };
                self.slots.insert(*var, value);
            }
            InstrKind::Load { dst, src } | InstrKind::Store { dst, src } => {
                let value = self.get(*src)?;
                self.set(*dst, value)?;
            }
            InstrKind::Retain { var } => {
                if let Value::Obj(id) = self.get(*var)? {
                    self.live_object(id)?.count += 1;
                }
            }
            InstrKind::Release { var } => {
                let value = self.get(*var)?;
                self.release(value)?;
            }
            InstrKind::IsNull { dst, var } => {
                let is_null = self.get(*var)? == Value::Null;
                self.slots.insert(*dst, Value::Prim(is_null));
            }
            InstrKind::ScopeEnter { scope } => self.frames.push(Frame {
                scope: *scope,
                registered: Vec::new(),
            }),
            InstrKind::ScopeExit { scope } => match self.frames.last() {
                Some(frame) if frame.scope == *scope => self.pop_frame()?,
                _ => return Err(Fault::ScopeMismatch(*scope)),
            },
            InstrKind::ScopeRegister { var, scope } => {
                let frame = self
                    .frames
                    .iter_mut()
                    .rev()
                    .find(|frame| frame.scope == *scope)
                    .ok_or(Fault::RegisterOutsideScope(*scope))?;
                frame.registered.push(*var);
            }
            InstrKind::Call { dst, kind, details } => {
                let result = self.call(*kind, details)?;
                match (dst, result) {
                    (Some(dst), Some(value)) => {
                        self.slots.insert(*dst, value);
                    }
                    (None, _) => {}
                    (Some(_), None) => {
                        return Err(Fault::Unsupported(format!(
                            "`{}` produced no value",
                            self.text(details.method)
                        )))
                    }
                }
            }
            InstrKind::Literal { dst, text, ty } => {
                let value = self.literal(self.text(*text), *ty)?;
                self.slots.insert(*dst, value);
            }
            InstrKind::Return { value } => {
                let value = value.map(|var| self.get(var)).transpose()?;
                return Ok(Flow::Returned(value));
            }
            InstrKind::Assert { condition, message } => {
                if !self.primitive(*condition)? {
                    return Err(Fault::Assertion(message.to_string()));
                }
            }
            InstrKind::Throw { value } => return Ok(Flow::Threw(self.get(*value)?)),
            InstrKind::Logical(block) => return self.logical(block),
            InstrKind::ControlFlowChain(chain) => return self.chain(chain),
            InstrKind::ForRange(block) => return self.for_range(block),
        }
        Ok(Flow::Normal)
    }

    fn logical(&mut self, block: &LogicalBlock) -> Result<Flow, Fault> {
        proceed!(self.exec(&block.left.instructions)?);
        proceed!(self.exec(&block.condition.instructions)?);
        let left_true = self.primitive(block.condition.primitive)?;
        let value = if block.short_circuits_on(left_true) {
            self.get(block.left.value)?
        } else {
            proceed!(self.exec(&block.right.instructions)?);
            proceed!(self.exec(&block.result_computation.instructions)?);
            self.get(block.result_computation.value)?
        };
        self.slots.insert(block.result, value);
        Ok(Flow::Normal)
    }

    fn chain(&mut self, chain: &ControlFlowChain) -> Result<Flow, Fault> {
        match chain.kind {
            ChainKind::WhileLoop | ChainKind::DoWhileLoop => self.loop_chain(chain),
            ChainKind::TryCatchFinally => self.try_chain(chain),
            _ => self.selection(chain),
        }
    }

    fn selection(&mut self, chain: &ControlFlowChain) -> Result<Flow, Fault> {
        for case in &chain.cases {
            proceed!(self.exec(&case.condition)?);
            let primitive = case
                .primitive
                .ok_or_else(|| Fault::Unsupported("case without primitive".to_owned()))?;
            if self.primitive(primitive)? {
                proceed!(self.exec(&case.body)?);
                return self.chain_result(chain.result, case.body_result);
            }
        }
        if let Some(default) = &chain.default {
            proceed!(self.exec(&default.body)?);
            return self.chain_result(chain.result, default.result);
        }
        Ok(Flow::Normal)
    }

    fn chain_result(&mut self, result: Option<Var>, source: Option<Var>) -> Result<Flow, Fault> {
        if let (Some(result), Some(source)) = (result, source) {
            let value = self.get(source)?;
            self.slots.insert(result, value);
        }
        Ok(Flow::Normal)
    }

    fn loop_chain(&mut self, chain: &ControlFlowChain) -> Result<Flow, Fault> {
        let case = chain
            .cases
            .first()
            .ok_or_else(|| Fault::Unsupported("loop without a case".to_owned()))?;
        let primitive = case
            .primitive
            .ok_or_else(|| Fault::Unsupported("loop case without primitive".to_owned()))?;
        let body_first = chain.kind == ChainKind::DoWhileLoop;
        for _ in 0..LOOP_LIMIT {
            if body_first {
                proceed!(self.exec(&case.body)?);
            }
            proceed!(self.exec(&case.condition)?);
            if !self.primitive(primitive)? {
                return Ok(Flow::Normal);
            }
            if !body_first {
                proceed!(self.exec(&case.body)?);
            }
        }
        Err(Fault::Runaway)
    }

    fn try_chain(&mut self, chain: &ControlFlowChain) -> Result<Flow, Fault> {
        let try_block = chain
            .try_block
            .as_ref()
            .ok_or_else(|| Fault::Unsupported("try chain without try block".to_owned()))?;
        let depth = self.frames.len();

        let mut flow = self.exec(&try_block.body)?;
        if let Flow::Threw(exception) = flow {
            self.unwind(depth)?;
            if let Some(handler) = chain.handler() {
                let binding = handler
                    .exception
                    .ok_or_else(|| Fault::Unsupported("handler without binding".to_owned()))?;
                self.catching = Some((binding.var, exception));
                flow = self.exec(&handler.body)?;
                if matches!(flow, Flow::Threw(_)) {
                    self.unwind(depth)?;
                }
            }
        }

        if let Some(finally) = &chain.finally {
            match self.exec(finally)? {
                Flow::Normal => {}
                other => {
                    self.unwind(depth)?;
                    flow = other;
                }
            }
        }
        Ok(flow)
    }

    fn for_range(&mut self, block: &ForRangePolymorphic) -> Result<Flow, Fault> {
        proceed!(self.exec(&block.initialization)?);
        for case in [&block.dispatch.ascending, &block.dispatch.descending] {
            proceed!(self.exec(&case.direction_check)?);
            if self.primitive(case.direction_primitive)? {
                return self.directional(case, &block.body);
            }
        }
        let equal = &block.dispatch.equal;
        proceed!(self.exec(&equal.direction_check)?);
        if self.primitive(equal.direction_primitive)? {
            proceed!(self.exec(&equal.body_setup)?);
            proceed!(self.exec(&block.body)?);
        }
        Ok(Flow::Normal)
    }

    fn directional(&mut self, case: &DirectionalCase, body: &[Instr]) -> Result<Flow, Fault> {
        for _ in 0..LOOP_LIMIT {
            proceed!(self.exec(&case.condition)?);
            if !self.primitive(case.condition_primitive)? {
                return Ok(Flow::Normal);
            }
            proceed!(self.exec(&case.body_setup)?);
            proceed!(self.exec(body)?);
            proceed!(self.exec(&case.increment)?);
        }
        Err(Fault::Runaway)
    }

    // ── Memory ──────────────────────────────────────────────────────

    fn alloc(&mut self, data: Data) -> Value {
        self.objects.push(Object {
            data,
            count: 0,
            freed: false,
        });
        Value::Obj(ObjId(self.objects.len() - 1))
    }

    fn live_object(&mut self, id: ObjId) -> Result<&mut Object, Fault> {
        let object = &mut self.objects[id.0];
        if object.freed {
            Err(Fault::UseAfterFree(id))
        } else {
            Ok(object)
        }
    }

    /// Drop one reference; null and primitives are ignored.
    pub(crate) fn release(&mut self, value: Value) -> Result<(), Fault> {
        let Value::Obj(id) = value else {
            return Ok(());
        };
        let object = self.live_object(id)?;
        object.count -= 1;
        match object.count.cmp(&0) {
            Ordering::Less => Err(Fault::OverRelease(id)),
            Ordering::Greater => Ok(()),
            Ordering::Equal => {
                object.freed = true;
                match object.data.clone() {
                    Data::List(items) => {
                        for item in items {
                            self.release(Value::Obj(item))?;
                        }
                    }
                    Data::Iterator { list, .. } => self.release(Value::Obj(list))?,
                    Data::Record { fields, .. } => {
                        for (_, value) in fields {
                            self.release(value)?;
                        }
                    }
                    _ => {}
                }
                Ok(())
            }
        }
    }

    fn pop_frame(&mut self) -> Result<(), Fault> {
        if let Some(frame) = self.frames.pop() {
            for var in frame.registered.into_iter().rev() {
                let value = self.get(var)?;
                self.release(value)?;
            }
        }
        Ok(())
    }

    /// Exit every frame above `depth`, innermost first.
    fn unwind(&mut self, depth: usize) -> Result<(), Fault> {
        while self.frames.len() > depth {
            self.pop_frame()?;
        }
        Ok(())
    }

    // ── Values ──────────────────────────────────────────────────────

    fn get(&self, var: Var) -> Result<Value, Fault> {
        if let Var::Field { object, field } = var {
            let Data::Record { fields, .. } = self.data(self.get(Var::Named(object))?, "property")?
            else {
                return Err(Fault::UnknownVar(var));
            };
            return fields
                .iter()
                .find(|&&(name, _)| name == field)
                .map(|&(_, value)| value)
                .ok_or(Fault::UnknownVar(var));
        }
        self.slots.get(&var).copied().ok_or(Fault::UnknownVar(var))
    }

    fn set(&mut self, var: Var, value: Value) -> Result<(), Fault> {
        let Var::Field { object, field } = var else {
            self.slots.insert(var, value);
            return Ok(());
        };
        let Value::Obj(id) = self.get(Var::Named(object))? else {
            return Err(Fault::NullReceiver(self.text(field).to_owned()));
        };
        let Data::Record { fields, .. } = &mut self.live_object(id)?.data else {
            return Err(Fault::UnknownVar(var));
        };
        let slot = fields
            .iter_mut()
            .find(|(name, _)| *name == field)
            .ok_or(Fault::UnknownVar(var))?;
        slot.1 = value;
        Ok(())
    }

    fn primitive(&self, var: Var) -> Result<bool, Fault> {
        match self.get(var)? {
            Value::Prim(b) => Ok(b),
            _ => Err(Fault::NotPrimitive(var)),
        }
    }

    fn text(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    fn data(&self, value: Value, what: &str) -> Result<Data, Fault> {
        match value {
            Value::Obj(id) => {
                let object = &self.objects[id.0];
                if object.freed {
                    Err(Fault::UseAfterFree(id))
                } else {
                    Ok(object.data.clone())
                }
            }
            _ => Err(Fault::NullReceiver(what.to_owned())),
        }
    }

    fn literal(&mut self, text: &str, ty: TypeId) -> Result<Value, Fault> {
        let unsupported = || Fault::Unsupported(format!("literal {text}"));
        let data = match ty {
            TypeId::INTEGER => Data::Integer(Some(text.parse().map_err(|_| unsupported())?)),
            TypeId::FLOAT => Data::Float(Some(text.parse().map_err(|_| unsupported())?)),
            TypeId::BOOLEAN => Data::Boolean(Some(text == "true")),
            TypeId::STRING => Data::String(Some(text.trim_matches('"').to_owned())),
            _ => return Err(unsupported()),
        };
        Ok(self.alloc(data))
    }

    // ── Calls ───────────────────────────────────────────────────────

    fn call(&mut self, kind: CallKind, details: &CallDetails) -> Result<Option<Value>, Fault> {
        let args = details
            .arguments
            .iter()
            .map(|&var| self.get(var))
            .collect::<Result<Vec<_>, _>>()?;
        let method = self.text(details.method);
        let registered = self
            .operations
            .get(&(details.target_type, details.method))
            .cloned();
        match kind {
            CallKind::Constructor => match registered {
                Some(operation) => {
                    let instance = self.instance(details.target_type);
                    self.call_operation(&operation, instance, &args)
                }
                None => self.construct(details.target_type, &args).map(Some),
            },
            CallKind::Static => {
                let function = self.text(self.types.name(details.target_type));
                let shown: Vec<_> = args.iter().map(|&arg| self.display(arg)).collect();
                self.trace.push(format!("{function}({})", shown.join(", ")));
                if details.returns_void() {
                    return Ok(None);
                }
                // Non-void functions hand back their first argument.
                args.first()
                    .copied()
                    .map(Some)
                    .ok_or_else(|| Fault::Unsupported(format!("{function} without an argument")))
            }
            CallKind::Call | CallKind::Operator => {
                let target = details
                    .target
                    .ok_or_else(|| Fault::Unsupported(format!("`{method}` without receiver")))?;
                let receiver = self.get(target)?;
                match registered {
                    Some(operation) => self.call_operation(&operation, receiver, &args),
                    None => self.invoke(receiver, method, &args),
                }
            }
        }
    }

    /// Run an aggregate operation in a frame of its own.
    fn call_operation(
        &mut self,
        operation: &Operation,
        receiver: Value,
        args: &[Value],
    ) -> Result<Option<Value>, Fault> {
        if receiver == Value::Null {
            return Err(Fault::NullReceiver("aggregate operation".to_owned()));
        }
        let params = operation
            .params
            .iter()
            .map(|&name| Var::Named(name))
            .zip(args.iter().copied())
            .collect();
        let saved_params = mem::replace(&mut self.params, params);
        let saved_slots = mem::take(&mut self.slots);
        self.bind_this(receiver);
        let depth = self.frames.len();

        let flow = self.exec(&operation.body)?;
        if let Flow::Threw(_) = flow {
            self.unwind(depth)?;
        }
        self.slots = saved_slots;
        self.params = saved_params;

        match flow {
            Flow::Normal => Ok(None),
            Flow::Returned(value) => {
                if let (Some(Value::Obj(id)), false) = (value, operation.constructor) {
                    self.live_object(id)?.count -= 1;
                }
                Ok(value)
            }
            Flow::Threw(_) => Err(Fault::Unsupported(
                "exception escaping an aggregate operation".to_owned(),
            )),
        }
    }

    fn construct(&mut self, ty: TypeId, args: &[Value]) -> Result<Value, Fault> {
        let first = match args.first() {
            Some(&arg) => Some(self.data(arg, "constructor argument")?),
            None => None,
        };
        let data = match (ty, first) {
            (TypeId::BOOLEAN, None) => Data::Boolean(None),
            (TypeId::INTEGER, None) => Data::Integer(None),
            (TypeId::FLOAT, None) => Data::Float(None),
            (TypeId::STRING, None) => Data::String(None),
            (TypeId::BOOLEAN | TypeId::INTEGER | TypeId::FLOAT | TypeId::STRING, Some(data)) => data,
            (TypeId::EXCEPTION, Some(Data::String(message))) => {
                Data::Exception(message.unwrap_or_default())
            }
            (TypeId::EXCEPTION, None) => Data::Exception(String::new()),
            (ty, first) => {
                let name = self.text(self.types.name(ty));
                match (name, first) {
                    ("Resource", Some(Data::String(label))) => {
                        let label = label.unwrap_or_default();
                        self.trace.push(format!("open {label}"));
                        Data::Resource(label)
                    }
                    (name, None) if name.starts_with("List of") => Data::List(Vec::new()),
                    _ => return Err(Fault::Unsupported(format!("constructor {name}"))),
                }
            }
        };
        Ok(self.alloc(data))
    }

    fn invoke(&mut self, receiver: Value, method: &str, args: &[Value]) -> Result<Option<Value>, Fault> {
        let this = self.data(receiver, method)?;
        let arg = match args.first() {
            Some(&arg) => Some(self.data(arg, method)?),
            None => None,
        };

        let data = match (method, &this, arg.as_ref()) {
            ("_true", Data::Boolean(b), None) => return Ok(Some(Value::Prim(b.unwrap_or(false)))),
            ("_isSet", data, None) => Data::Boolean(Some(match data {
                Data::Boolean(b) => b.is_some(),
                Data::Integer(i) => i.is_some(),
                Data::Float(f) => f.is_some(),
                Data::String(s) => s.is_some(),
                _ => true,
            })),
            ("_negate", Data::Boolean(b), None) => Data::Boolean(b.map(|b| !b)),
            ("_negate", Data::Integer(i), None) => Data::Integer(i.map(|i| -i)),
            ("_and", Data::Boolean(a), Some(Data::Boolean(b))) => Data::Boolean(both(*a, *b, |a, b| a && b)),
            ("_or", Data::Boolean(a), Some(Data::Boolean(b))) => Data::Boolean(both(*a, *b, |a, b| a || b)),
            ("_xor", Data::Boolean(a), Some(Data::Boolean(b))) => Data::Boolean(both(*a, *b, |a, b| a ^ b)),
            ("_eq" | "_neq" | "_lt" | "_lteq" | "_gt" | "_gteq" | "_cmp", this, Some(other)) => {
                let ordering = compare(this, other)?;
                if method == "_cmp" {
                    Data::Integer(ordering.map(|o| o as i64))
                } else {
                    Data::Boolean(ordering.map(|o| match method {
                        "_eq" => o == Ordering::Equal,
                        "_neq" => o != Ordering::Equal,
                        "_lt" => o == Ordering::Less,
                        "_lteq" => o != Ordering::Greater,
                        "_gt" => o == Ordering::Greater,
                        _ => o != Ordering::Less,
                    }))
                }
            }
            ("_add" | "_sub" | "_mul" | "_div" | "_mod", Data::Integer(a), Some(Data::Integer(b))) => {
                Data::Integer(both(*a, *b, |a, b| match method {
                    "_add" => a + b,
                    "_sub" => a - b,
                    "_mul" => a * b,
                    "_div" => a.checked_div(b).unwrap_or(0),
                    _ => a.checked_rem(b).unwrap_or(0),
                }))
            }
            ("_add" | "_sub" | "_mul" | "_div", Data::Float(a), Some(Data::Float(b))) => {
                Data::Float(both(*a, *b, |a, b| match method {
                    "_add" => a + b,
                    "_sub" => a - b,
                    "_mul" => a * b,
                    _ => a / b,
                }))
            }
            ("_add", Data::String(a), Some(Data::String(b))) => {
                Data::String(both(a.clone(), b.clone(), |a, b| a + &b))
            }
            ("_len", Data::String(s), None) => {
                Data::Integer(s.as_ref().and_then(|s| i64::try_from(s.len()).ok()))
            }
            ("_len", Data::List(items), None) => Data::Integer(i64::try_from(items.len()).ok()),
            ("_inc", Data::Integer(i), None) => Data::Integer(i.map(|i| i + 1)),
            ("_dec", Data::Integer(i), None) => Data::Integer(i.map(|i| i - 1)),
            ("_promote", Data::Integer(i), None) => Data::Float(i.map(|i| i as f64)),
            ("_string", data, None) => Data::String(Some(self.display_data(data))),
            ("_hashcode", Data::Integer(i), None) => Data::Integer(*i),
            ("_hashcode", Data::String(s), None) => Data::Integer(s.as_ref().map(|s| {
                s.bytes()
                    .fold(0i64, |hash, byte| hash.wrapping_mul(31).wrapping_add(i64::from(byte)))
            })),
            ("_addAss" | "_subAss", _, Some(_)) => {
                self.mutate(receiver, method, args[0])?;
                return Ok(None);
            }
            ("iterator", Data::List(_), None) => {
                if let Value::Obj(list) = receiver {
                    self.live_object(list)?.count += 1;
                    Data::Iterator { list, next: 0 }
                } else {
                    return Err(Fault::NullReceiver(method.to_owned()));
                }
            }
            ("hasNext", Data::Iterator { list, next }, None) => {
                let len = match &self.objects[list.0].data {
                    Data::List(items) => items.len(),
                    _ => 0,
                };
                Data::Boolean(Some(*next < len))
            }
            ("next", Data::Iterator { list, next }, None) => {
                let item = match &self.objects[list.0].data {
                    Data::List(items) => items.get(*next).copied(),
                    _ => None,
                };
                let item = item.ok_or_else(|| Fault::Unsupported("next past the end".to_owned()))?;
                if let Value::Obj(id) = receiver {
                    self.objects[id.0].data = Data::Iterator {
                        list: *list,
                        next: next + 1,
                    };
                }
                return Ok(Some(Value::Obj(item)));
            }
            ("close", Data::Resource(label), None) => {
                self.trace.push(format!("close {label}"));
                return Ok(None);
            }
            ("message", Data::Exception(message), None) => Data::String(Some(message.clone())),
            _ => {
                return Err(Fault::Unsupported(format!(
                    "{method} on {}",
                    self.display_data(&this)
                )))
            }
        };
        Ok(Some(self.alloc(data)))
    }

    /// In-place `+=` / `-=`.
    fn mutate(&mut self, receiver: Value, method: &str, arg: Value) -> Result<(), Fault> {
        let Value::Obj(id) = receiver else {
            return Err(Fault::NullReceiver(method.to_owned()));
        };
        let argument = self.data(arg, method)?;
        if let Data::List(_) = self.live_object(id)?.data {
            let Value::Obj(item) = arg else {
                return Err(Fault::NullReceiver(method.to_owned()));
            };
            self.live_object(item)?.count += 1;
            if let Data::List(items) = &mut self.objects[id.0].data {
                items.push(item);
            }
            return Ok(());
        }
        let object = self.live_object(id)?;
        match (&mut object.data, argument, method) {
            (Data::Integer(Some(a)), Data::Integer(Some(b)), "_addAss") => *a += b,
            (Data::Integer(Some(a)), Data::Integer(Some(b)), _) => *a -= b,
            (Data::String(Some(a)), Data::String(Some(b)), "_addAss") => a.push_str(&b),
            (Data::Integer(a), _, _) => *a = None,
            (data, _, _) => {
                return Err(Fault::Unsupported(format!("{method} on {data:?}")));
            }
        }
        Ok(())
    }
}

fn both<T>(a: Option<T>, b: Option<T>, f: impl FnOnce(T, T) -> T) -> Option<T> {
    Some(f(a?, b?))
}

fn compare(a: &Data, b: &Data) -> Result<Option<Ordering>, Fault> {
    Ok(match (a, b) {
        (Data::Integer(a), Data::Integer(b)) => a.zip(*b).map(|(a, b)| a.cmp(&b)),
        (Data::Float(a), Data::Float(b)) => a.zip(*b).and_then(|(a, b)| a.partial_cmp(&b)),
        (Data::String(a), Data::String(b)) => a.as_ref().zip(b.as_ref()).map(|(a, b)| a.cmp(b)),
        (Data::Boolean(a), Data::Boolean(b)) => a.zip(*b).map(|(a, b)| a.cmp(&b)),
        _ => return Err(Fault::Unsupported(format!("compare {a:?} with {b:?}"))),
    })
}
