//! Classes and records.
//!
//! One aggregate lowers to a set of operations, each an ordinary
//! [`FunctionIr`] run with `this` bound to the instance:
//!
//! ```text
//! i_init                      every property, in declaration order
//!   SCOPE_ENTER
//!     value (initialiser, or the property type's unset value)
//!     RELEASE this.p  STORE this.p, value  RETAIN this.p
//!   SCOPE_EXIT
//!   RETURN
//!
//! T()                         default constructor
//!   SCOPE_ENTER
//!     CALL (P)super.P()       only with a parent aggregate
//!     CALL (T)this.i_init()
//!   SCOPE_EXIT
//!   RETURN this
//!
//! methods                     as written
//! _isSet _eq _neq ...         the defaulted operators, see [`synthetic`]
//! ```
//!
//! A property holds one reference to its value; the instance releases
//! its properties when it is freed. The constructor hands back the
//! reference the allocation made.

mod synthetic;

use rayon::prelude::*;
use smallvec::SmallVec;

use ek9_ir::{CallDetails, CallKind, CallMeta, Instr, Var};
use ek9_tree::ast::Aggregate;
use ek9_tree::{AggregateId, Name, Span, StringInterner, TreeArena, TypeId};
use ek9_types::{Genus, SideEffects, TypeUniverse};

use self::synthetic::Shape;
use crate::context::FrameKind;
use crate::memory::rebind;
use crate::{generate_function, FunctionIr, GenContext, GenOptions, GenResult, IrLowerer};

/// Every operation of one aggregate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateIr {
    pub ty: TypeId,
    pub name: Name,
    /// Own properties in declaration order.
    pub properties: Vec<(Name, TypeId)>,
    /// `i_init`, the constructor, methods, then defaulted operators.
    pub operations: Vec<FunctionIr>,
}

impl AggregateIr {
    pub fn operation(&self, name: Name) -> Option<&FunctionIr> {
        self.operations.iter().find(|op| op.name == name)
    }
}

/// Lower one aggregate.
pub fn generate_aggregate(
    tree: &TreeArena,
    types: &TypeUniverse,
    interner: &StringInterner,
    aggregate: AggregateId,
    options: GenOptions,
) -> GenResult<AggregateIr> {
    let def = tree.aggregate(aggregate);
    let ctx = GenContext::new(tree, types, interner, options);
    let ty = ctx.declared_type(def.ty, def.span)?;
    let name = types.name(ty);
    let _span = tracing::debug_span!("generate_aggregate", name = interner.lookup(name)).entered();
    let parent = parent_aggregate(types, ty);

    let mut operations = Vec::with_capacity(2 + def.methods.len() + def.defaults.len());
    let mut lowerer = IrLowerer::new(ctx);
    let i_init = lowerer.lower_initialiser(def)?;
    operations.push(finished(lowerer.ctx.names.i_init, i_init, options)?);

    let ctx = GenContext::new(tree, types, interner, options);
    let constructor = IrLowerer::new(ctx).lower_default_constructor(ty, parent, def.span)?;
    operations.push(finished(name, constructor, options)?);

    for &method in &def.methods {
        operations.push(generate_function(tree, types, interner, method, options)?);
    }

    let shape = Shape {
        ty,
        name: interner.lookup(name),
        parent,
        properties: &def.properties,
        span: def.span,
    };
    for &op in &def.defaults {
        let (synthetic, function) = synthetic::synthesize(op, &shape, interner);
        operations.push(generate_function(&synthetic, types, interner, function, options)?);
    }

    tracing::debug!(operations = operations.len(), "generated");
    Ok(AggregateIr {
        ty,
        name,
        properties: def.properties.iter().map(|p| (p.name, p.ty)).collect(),
        operations,
    })
}

/// Lower `aggregates` in parallel; results come back in input order.
pub fn generate_aggregates(
    tree: &TreeArena,
    types: &TypeUniverse,
    interner: &StringInterner,
    aggregates: &[AggregateId],
    options: GenOptions,
) -> Vec<GenResult<AggregateIr>> {
    aggregates
        .par_iter()
        .map(|&aggregate| generate_aggregate(tree, types, interner, aggregate, options))
        .collect()
}

/// Nearest supertype that is itself a class or record, `Any` excluded.
fn parent_aggregate(types: &TypeUniverse, ty: TypeId) -> Option<TypeId> {
    let def = types.get(ty)?;
    def.supers.iter().copied().find(|&sup| {
        sup != TypeId::ANY && matches!(types.genus(sup), Some(Genus::Class | Genus::Record))
    })
}

fn finished(name: Name, instructions: Vec<Instr>, options: GenOptions) -> GenResult<FunctionIr> {
    if options.verify {
        ek9_ir::verify(&instructions)?;
    }
    Ok(FunctionIr {
        name,
        params: Vec::new(),
        instructions,
    })
}

/// Call on an existing instance that produces nothing.
fn initialising_call(target: Var, target_type: TypeId, method: Name, span: Option<Span>) -> Instr {
    let details = CallDetails {
        target: Some(target),
        target_type,
        method,
        parameter_types: SmallVec::new(),
        return_type: TypeId::VOID,
        arguments: SmallVec::new(),
        meta: CallMeta::new(SideEffects::THIS_MUTATION, 1),
        trait_call: false,
    };
    Instr::call(None, CallKind::Call, details, span)
}

impl IrLowerer<'_> {
    fn lower_initialiser(&mut self, def: &Aggregate) -> GenResult<Vec<Instr>> {
        let span = Some(def.span);
        let this = self.ctx.names.this;
        let mut out = self.scoped(FrameKind::Function, span, |lowerer, _| {
            let mut out = Vec::new();
            for property in &def.properties {
                let at = Some(property.span);
                let ty = lowerer.ctx.declared_type(property.ty, property.span)?;
                let value = match property.init {
                    Some(init) => {
                        let (instrs, value, _) = lowerer.eval_managed(init)?;
                        out.extend(instrs);
                        value
                    }
                    None => {
                        let value = lowerer.ctx.temp();
                        out.extend(lowerer.construct(ty, SmallVec::new(), None, value, at)?);
                        value
                    }
                };
                rebind(Var::field(this, property.name), value, at, &mut out);
            }
            Ok(out)
        })?;
        out.push(Instr::ret(None, span));
        Ok(out)
    }

    fn lower_default_constructor(
        &mut self,
        ty: TypeId,
        parent: Option<TypeId>,
        span: Span,
    ) -> GenResult<Vec<Instr>> {
        let at = Some(span);
        let this = Var::Named(self.ctx.names.this);
        let mut out = self.scoped(FrameKind::Function, at, |lowerer, _| {
            let mut out = Vec::new();
            if let Some(parent) = parent {
                let super_ = Var::Named(lowerer.ctx.names.super_);
                out.push(initialising_call(super_, parent, lowerer.ctx.types.name(parent), at));
            }
            out.push(initialising_call(this, ty, lowerer.ctx.names.i_init, at));
            Ok(out)
        })?;
        out.push(Instr::ret(Some(this), at));
        Ok(out)
    }
}
