//! Shared fixtures for generator tests.
//!
//! [`Fixture`] carries an interner and a type universe with the built-ins
//! plus three test types, lowers functions with verification switched on,
//! and runs the result on the reference [`machine`].

mod machine;

pub(crate) use machine::{Fault, Outcome};

use ek9_ir::print::IrPrinter;
use ek9_ir::Instr;
use ek9_tree::{ExprId, FunctionId, StmtId, StringInterner, TreeArena, TreeBuilder, TypeId};
use ek9_types::{Genus, MethodDef, SideEffects, TypeUniverse};
use machine::{Data, Machine, Value};

use crate::{generate_function, AggregateIr, FunctionIr, GenOptions, GenResult};

/// A parameter value handed to a function under test. The caller owns it.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Arg {
    Int(i64),
    /// An `Integer` with no value.
    Unset,
    Str(&'static str),
    Bool(bool),
    Null,
}

/// Result of running a function on the machine.
pub(crate) struct Run {
    pub outcome: Outcome,
    /// Display form of the returned (or thrown) value.
    pub value: String,
    /// Calls to `Observe`, plus resource opens and closes, in order.
    pub trace: Vec<String>,
    /// Objects still referenced after the caller dropped everything it owns.
    pub leaks: Vec<String>,
}

impl Run {
    pub(crate) fn threw(&self) -> bool {
        matches!(self.outcome, Outcome::Threw(_))
    }
}

pub(crate) struct Fixture {
    pub interner: StringInterner,
    pub types: TypeUniverse,
    /// Function type: `_call(Any)` appends `Observe(arg)` to the trace.
    pub observe: TypeId,
    /// Function type: `_call(Boolean) -> Boolean` traces `Check(arg)` and
    /// returns `arg`.
    pub check: TypeId,
    /// Function type: `_call(Integer) -> Integer` traces `Pick(arg)` and
    /// returns `arg`.
    pub pick: TypeId,
    /// Class with `Resource(String)` and `close()`.
    pub resource: TypeId,
    pub int_list: TypeId,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let interner = StringInterner::new();
        let mut types = TypeUniverse::new(&interner);

        let observe = types.define_named(interner.intern("Observe"), Genus::Function, &[]);
        types.add_method(
            observe,
            MethodDef::new(interner.intern("_call"), &[TypeId::ANY], TypeId::VOID)
                .with_effects(SideEffects::POSSIBLE_MUTATION),
        );

        let check = types.define_named(interner.intern("Check"), Genus::Function, &[]);
        types.add_method(
            check,
            MethodDef::new(interner.intern("_call"), &[TypeId::BOOLEAN], TypeId::BOOLEAN),
        );
        let pick = types.define_named(interner.intern("Pick"), Genus::Function, &[]);
        types.add_method(
            pick,
            MethodDef::new(interner.intern("_call"), &[TypeId::INTEGER], TypeId::INTEGER),
        );

        let resource =
            types.define_named(interner.intern("Resource"), Genus::Class, &[TypeId::ANY]);
        types.add_method(
            resource,
            MethodDef::new(interner.intern("Resource"), &[TypeId::STRING], resource)
                .as_constructor(),
        );
        types.add_method(
            resource,
            MethodDef::new(interner.intern("close"), &[], TypeId::VOID)
                .with_effects(SideEffects::POSSIBLE_MUTATION),
        );

        let int_list = types.list_of(TypeId::INTEGER, &interner);

        Fixture {
            interner,
            types,
            observe,
            check,
            pick,
            resource,
            int_list,
        }
    }

    pub(crate) fn builder(&self) -> TreeBuilder<'_> {
        TreeBuilder::new(&self.interner)
    }

    /// `f(params) -> rtn as ty` with `rtn` initialised by the expression
    /// `init` builds and an empty body.
    pub(crate) fn returning(
        &self,
        params: &[(&str, TypeId)],
        ty: TypeId,
        init: impl FnOnce(&mut TreeBuilder<'_>) -> ExprId,
    ) -> (TreeArena, FunctionId) {
        let mut b = self.builder();
        let value = init(&mut b);
        let rtn = b.returning("rtn", ty, Some(value));
        let function = b.function("f", params, Some(rtn), &[]);
        (b.finish(), function)
    }

    /// `f(params)` with the statements `body` builds and no returning
    /// variable.
    pub(crate) fn procedure(
        &self,
        params: &[(&str, TypeId)],
        body: impl FnOnce(&mut TreeBuilder<'_>) -> Vec<StmtId>,
    ) -> (TreeArena, FunctionId) {
        let mut b = self.builder();
        let stmts = body(&mut b);
        let function = b.function("f", params, None, &stmts);
        (b.finish(), function)
    }

    /// `Observe(value)` as a statement.
    pub(crate) fn observe(&self, t: &mut TreeBuilder<'_>, value: ExprId) -> StmtId {
        let call = t.call_function(self.observe, &[value], TypeId::VOID);
        t.expr_stmt(call)
    }

    /// `Observe("text")` as a statement.
    pub(crate) fn observe_text(&self, t: &mut TreeBuilder<'_>, text: &str) -> StmtId {
        let value = t.string(text);
        self.observe(t, value)
    }

    /// Lower with verification on.
    pub(crate) fn generate(&self, tree: &TreeArena, function: FunctionId) -> GenResult<FunctionIr> {
        let options = GenOptions {
            verify: true,
            ..GenOptions::default()
        };
        generate_function(tree, &self.types, &self.interner, function, options)
    }

    pub(crate) fn lower(&self, tree: &TreeArena, function: FunctionId) -> FunctionIr {
        self.generate(tree, function)
            .unwrap_or_else(|fault| panic!("generation failed: {fault}"))
    }

    pub(crate) fn print(&self, instrs: &[Instr]) -> String {
        IrPrinter::new(&self.interner, &self.types).print(instrs)
    }

    /// Run `ir` with `args` bound to its parameters, then drop the
    /// returned value and the arguments as the caller would.
    pub(crate) fn execute(&self, ir: &FunctionIr, args: &[(&str, Arg)]) -> Result<Run, Fault> {
        self.execute_with(ir, args, &[])
    }

    /// [`execute`](Self::execute) with the operations of `aggregates`
    /// callable, parents listed before children.
    pub(crate) fn execute_with(
        &self,
        ir: &FunctionIr,
        args: &[(&str, Arg)],
        aggregates: &[AggregateIr],
    ) -> Result<Run, Fault> {
        let mut machine = Machine::new(&self.interner, &self.types);
        for aggregate in aggregates {
            machine.define_aggregate(aggregate);
        }
        let mut owned = Vec::with_capacity(args.len());
        for &(name, arg) in args {
            let value = match arg {
                Arg::Int(i) => machine.owned(Data::Integer(Some(i))),
                Arg::Unset => machine.owned(Data::Integer(None)),
                Arg::Str(s) => machine.owned(Data::String(Some(s.to_owned()))),
                Arg::Bool(b) => machine.owned(Data::Boolean(Some(b))),
                Arg::Null => Value::Null,
            };
            machine.bind_param(self.interner.intern(name), value);
            owned.push(value);
        }

        let outcome = machine.run(&ir.instructions)?;
        let (Outcome::Returned(result) | Outcome::Threw(result)) = outcome;
        let value = machine.display(result);
        machine.release(result)?;
        for arg in owned {
            machine.release(arg)?;
        }
        Ok(Run {
            outcome,
            value,
            trace: machine.trace().to_vec(),
            leaks: machine.live(),
        })
    }

    /// Lower, run, and insist nothing leaked.
    pub(crate) fn run(&self, tree: &TreeArena, function: FunctionId, args: &[(&str, Arg)]) -> Run {
        self.run_with(tree, function, args, &[])
    }

    /// [`run`](Self::run) with aggregate operations available.
    pub(crate) fn run_with(
        &self,
        tree: &TreeArena,
        function: FunctionId,
        args: &[(&str, Arg)],
        aggregates: &[AggregateIr],
    ) -> Run {
        let ir = self.lower(tree, function);
        let run = self.execute_with(&ir, args, aggregates).unwrap_or_else(|fault| {
            panic!("machine fault: {fault}\n{}", self.print(&ir.instructions))
        });
        assert!(
            run.leaks.is_empty(),
            "leaked {:?}\n{}",
            run.leaks,
            self.print(&ir.instructions)
        );
        run
    }
}
