//! Call resolution and argument promotion.
//!
//! Every call the generators emit, including every operator application,
//! comes through here. A [`CallContext`] names the receiver, method and
//! arguments; resolution picks the cheapest overload from the type
//! universe (or takes the one semantic analysis already recorded), inserts
//! a managed `_promote` call for each argument that needs conversion, and
//! produces the final [`CallDetails`] with purity and complexity metadata.
//!
//! When the universe has no candidate at all and the method is a known
//! operator method, the [`operators`] table supplies the metadata instead.
//! Anything else is a fault: overloads were checked by semantic analysis.
//!
//! Resolution only reads the universe, so the same inputs always give the
//! same instructions.

pub(crate) mod operators;

use smallvec::SmallVec;

use ek9_ir::{CallDetails, CallKind, CallMeta, Instr, ScopeId, Var};
use ek9_tree::{MethodRef, Name, Span, TypeId};
use ek9_types::{MethodDef, ResolveError};

use self::operators::{OperatorInfo, Yields};
use crate::memory::manage_in;
use crate::{GenFault, GenResult, IrLowerer};

/// One call to resolve.
#[derive(Clone, Debug)]
pub(crate) struct CallContext {
    pub kind: CallKind,
    /// `None` for static and constructor calls.
    pub target: Option<Var>,
    pub target_type: TypeId,
    pub method: Name,
    pub arguments: SmallVec<[(Var, TypeId); 2]>,
    /// Scope promotion temporaries are registered to.
    pub scope: ScopeId,
    pub span: Option<Span>,
    /// Method semantic analysis already selected for this call site.
    pub resolved: Option<MethodRef>,
}

impl CallContext {
    pub(crate) fn new(
        kind: CallKind,
        target: Option<Var>,
        target_type: TypeId,
        method: Name,
        scope: ScopeId,
        span: Option<Span>,
    ) -> Self {
        CallContext {
            kind,
            target,
            target_type,
            method,
            arguments: SmallVec::new(),
            scope,
            span,
            resolved: None,
        }
    }

    #[must_use]
    pub(crate) fn argument(mut self, var: Var, ty: TypeId) -> Self {
        self.arguments.push((var, ty));
        self
    }

    #[must_use]
    pub(crate) fn resolved(mut self, method: Option<MethodRef>) -> Self {
        self.resolved = method;
        self
    }
}

/// Promotions to run first, then the call itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ResolvedCall {
    pub promotions: Vec<Instr>,
    pub details: CallDetails,
}

/// A call appended to an instruction list.
#[derive(Clone, Debug)]
pub(crate) struct EmittedCall {
    pub instrs: Vec<Instr>,
    /// `None` when the method returns nothing.
    pub result: Option<Var>,
    pub return_type: TypeId,
}

enum Selected<'t> {
    Method {
        def: &'t MethodDef,
        promotions: SmallVec<[Option<TypeId>; 2]>,
    },
    Operator(&'static OperatorInfo),
}

impl<'a> IrLowerer<'a> {
    /// Pick the callee for `cx` and build its call details.
    pub(crate) fn resolve_call(&mut self, cx: &CallContext) -> GenResult<ResolvedCall> {
        let arg_types: SmallVec<[TypeId; 2]> = cx.arguments.iter().map(|&(_, ty)| ty).collect();
        self.require_known(cx.target_type, cx)?;
        for &ty in &arg_types {
            self.require_known(ty, cx)?;
        }

        let mut promotions = Vec::new();
        let mut arguments: SmallVec<[Var; 2]> = SmallVec::new();
        let (parameter_types, return_type, meta) = match self.select(cx, &arg_types)? {
            Selected::Method {
                def,
                promotions: needed,
            } => {
                for (&(var, from), to) in cx.arguments.iter().zip(needed) {
                    let var = match to {
                        Some(to) => {
                            self.promote(var, from, to, cx.scope, cx.span, &mut promotions)?
                        }
                        None => var,
                    };
                    arguments.push(var);
                }
                (
                    def.params.clone(),
                    def.returns,
                    CallMeta::new(def.effects, def.complexity),
                )
            }
            Selected::Operator(info) => {
                arguments.extend(cx.arguments.iter().map(|&(var, _)| var));
                let returns = match info.yields {
                    Yields::Target => cx.target_type,
                    Yields::Void => TypeId::VOID,
                    Yields::Boolean => TypeId::BOOLEAN,
                    Yields::Integer => TypeId::INTEGER,
                    Yields::String => TypeId::STRING,
                };
                tracing::trace!(method = info.method, "operator map fallback");
                (
                    arg_types.clone(),
                    returns,
                    CallMeta::new(info.effects, info.fallback_complexity()),
                )
            }
        };

        let trait_call = cx.target.is_some() && self.ctx.types.is_trait(cx.target_type);
        Ok(ResolvedCall {
            promotions,
            details: CallDetails {
                target: cx.target,
                target_type: cx.target_type,
                method: cx.method,
                parameter_types,
                return_type,
                arguments,
                meta,
                trait_call,
            },
        })
    }

    /// Resolve and append the call; the result (if any) lands in `dst`, or
    /// a fresh temp when `dst` is `None`.
    pub(crate) fn emit_call(&mut self, cx: CallContext, dst: Option<Var>) -> GenResult<EmittedCall> {
        let ResolvedCall {
            promotions: mut instrs,
            details,
        } = self.resolve_call(&cx)?;
        let return_type = details.return_type;
        let result = if self.ctx.needs_result_variable(return_type) {
            Some(dst.unwrap_or_else(|| self.ctx.temp()))
        } else {
            None
        };
        instrs.push(Instr::call(result, cx.kind, details, cx.span));
        Ok(EmittedCall {
            instrs,
            result,
            return_type,
        })
    }

    /// Operator call on `target` with promotions registered to the current
    /// scope.
    pub(crate) fn operator_context(
        &self,
        target: Var,
        target_type: TypeId,
        method: Name,
        span: Option<Span>,
    ) -> GenResult<CallContext> {
        let scope = self.ctx.current_scope()?;
        Ok(CallContext::new(
            CallKind::Operator,
            Some(target),
            target_type,
            method,
            scope,
            span,
        ))
    }

    /// Ordinary method call on `target`.
    pub(crate) fn method_context(
        &self,
        target: Var,
        target_type: TypeId,
        method: Name,
        span: Option<Span>,
    ) -> GenResult<CallContext> {
        let scope = self.ctx.current_scope()?;
        Ok(CallContext::new(
            CallKind::Call,
            Some(target),
            target_type,
            method,
            scope,
            span,
        ))
    }

    /// Emit a call that must produce a value; the value is left raw.
    pub(crate) fn call_value(
        &mut self,
        cx: CallContext,
        dst: Option<Var>,
    ) -> GenResult<(Vec<Instr>, Var, TypeId)> {
        let method = cx.method;
        let target_type = cx.target_type;
        let span = cx.span;
        let emitted = self.emit_call(cx, dst)?;
        match emitted.result {
            Some(result) => Ok((emitted.instrs, result, emitted.return_type)),
            None => Err(GenFault::malformed(
                format!(
                    "`{}` on `{}` returns nothing but its value is used",
                    self.ctx.text(method),
                    self.ctx.type_label(target_type)
                ),
                span.unwrap_or(Span::DUMMY),
            )),
        }
    }

    /// [`call_value`](Self::call_value), then retain + register the result
    /// to the current scope.
    pub(crate) fn call_managed(
        &mut self,
        cx: CallContext,
        dst: Option<Var>,
    ) -> GenResult<(Vec<Instr>, Var, TypeId)> {
        let span = cx.span;
        let (mut instrs, result, ty) = self.call_value(cx, dst)?;
        self.manage(result, span, &mut instrs)?;
        Ok((instrs, result, ty))
    }

    /// `var._true()`: the primitive boolean a backend branches on. Never
    /// managed.
    pub(crate) fn primitive_of(
        &mut self,
        var: Var,
        ty: TypeId,
        span: Option<Span>,
    ) -> GenResult<(Vec<Instr>, Var)> {
        let cx = self.operator_context(var, ty, self.ctx.names.true_, span)?;
        let (instrs, primitive, _) = self.call_value(cx, None)?;
        Ok((instrs, primitive))
    }

    // ── Selection ───────────────────────────────────────────────────

    fn select(&self, cx: &CallContext, arg_types: &[TypeId]) -> GenResult<Selected<'a>> {
        let types = self.ctx.types;
        if let Some(method) = cx.resolved {
            let def = types
                .method(method)
                .ok_or_else(|| self.unknown_method(cx, arg_types))?;
            if def.params.len() != arg_types.len() {
                return Err(self.unknown_method(cx, arg_types));
            }
            let mut promotions = SmallVec::new();
            for (&from, &to) in arg_types.iter().zip(&def.params) {
                match types.match_cost(from, to) {
                    Some((_, promotion)) => promotions.push(promotion),
                    None => return Err(self.promotion_mismatch(from, to, cx.span)),
                }
            }
            return Ok(Selected::Method { def, promotions });
        }

        let resolution = if cx.kind == CallKind::Constructor {
            types.resolve_constructor(cx.target_type, arg_types)
        } else {
            types.resolve_method(cx.target_type, cx.method, arg_types)
        };
        match resolution {
            Ok(resolution) => {
                let def = types
                    .method(resolution.method)
                    .ok_or_else(|| self.unknown_method(cx, arg_types))?;
                Ok(Selected::Method {
                    def,
                    promotions: resolution.promotions,
                })
            }
            Err(ResolveError::Ambiguous { .. }) => Err(GenFault::AmbiguousCall {
                ty: self.ctx.type_label(cx.target_type),
                method: self.ctx.text(cx.method).to_owned(),
                span: cx.span,
            }
            .logged()),
            Err(ResolveError::NotFound { .. }) => {
                match operators::by_method(self.ctx.text(cx.method)) {
                    Some(info)
                        if cx.kind != CallKind::Constructor
                            && usize::from(info.takes_argument()) == arg_types.len() =>
                    {
                        Ok(Selected::Operator(info))
                    }
                    _ => Err(self.unknown_method(cx, arg_types)),
                }
            }
        }
    }

    /// `arg._promote()` into a managed temp, checked to yield `to`.
    fn promote(
        &mut self,
        arg: Var,
        from: TypeId,
        to: TypeId,
        scope: ScopeId,
        span: Option<Span>,
        out: &mut Vec<Instr>,
    ) -> GenResult<Var> {
        let types = self.ctx.types;
        let method = self.ctx.names.promote;
        let def = types
            .resolve_method(from, method, &[])
            .ok()
            .and_then(|resolution| types.method(resolution.method))
            .ok_or_else(|| self.promotion_mismatch(from, to, span))?;
        if def.returns != to && !types.is_assignable(def.returns, to) {
            return Err(self.promotion_mismatch(from, to, span));
        }

        let dst = self.ctx.temp();
        let details = CallDetails {
            target: Some(arg),
            target_type: from,
            method,
            parameter_types: SmallVec::new(),
            return_type: def.returns,
            arguments: SmallVec::new(),
            meta: CallMeta::new(def.effects, def.complexity),
            trait_call: false,
        };
        out.push(Instr::call(Some(dst), CallKind::Operator, details, span));
        manage_in(dst, scope, span, out);
        Ok(dst)
    }

    // ── Faults ──────────────────────────────────────────────────────

    fn require_known(&self, ty: TypeId, cx: &CallContext) -> GenResult<()> {
        if ty.is_resolved() && self.ctx.types.get(ty).is_some() {
            Ok(())
        } else {
            Err(GenFault::unresolved("call operand", cx.span.unwrap_or(Span::DUMMY)))
        }
    }

    fn unknown_method(&self, cx: &CallContext, arg_types: &[TypeId]) -> GenFault {
        let args = arg_types
            .iter()
            .map(|&ty| self.ctx.type_label(ty))
            .collect::<Vec<_>>()
            .join(", ");
        GenFault::UnknownMethod {
            ty: self.ctx.type_label(cx.target_type),
            method: self.ctx.text(cx.method).to_owned(),
            args,
            span: cx.span,
        }
        .logged()
    }

    fn promotion_mismatch(&self, from: TypeId, to: TypeId, span: Option<Span>) -> GenFault {
        GenFault::PromotionMismatch {
            from: self.ctx.type_label(from),
            to: self.ctx.type_label(to),
            span,
        }
        .logged()
    }
}
