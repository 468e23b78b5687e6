//! `for i in start ... end [by step]`.
//!
//! The direction is unknown until runtime, so the block computes
//! `direction = start <=> end` once and dispatches on it. Ascending and
//! descending share one builder that differs only in the methods it
//! calls:
//!
//! | | direction | condition | step | `by` sign |
//! |---|---|---|---|---|
//! | ascending | `_lt` | `_lteq` | `_inc` | `_gt` |
//! | descending | `_gt` | `_gteq` | `_dec` | `_lt` |
//!
//! With `by`, a direction case also requires `(start + by) <=> start` to
//! point the same way, so a step of the wrong sign runs nothing, and the
//! increment is `current + by` in both directions. Each check, condition
//! and increment runs in its own scope; `current` is rebound on every
//! step so exactly one value is live at a time.

use ek9_ir::{
    DirectionalCase, DispatchCases, EqualCase, ForRangePolymorphic, Instr, LoopMetadata,
    OperandEvaluation, ScopeMetadata, Var,
};
use ek9_tree::ast::{ForRangeFlow, LogicalOp};
use ek9_tree::{ExprId, Name, Span, TypeId};

use crate::context::FrameKind;
use crate::memory::{manage_in, rebind};
use crate::{GenResult, IrLowerer};

/// Methods that tell ascending from descending.
#[derive(Clone, Copy)]
struct Direction {
    /// `direction <op> 0` selecting this case.
    selects: Name,
    /// `(current <=> end) <op> 0` continuing the loop.
    continues: Name,
    /// Unit step without `by`.
    step: Name,
    /// `((start + by) <=> start) <op> 0` for a usable `by`.
    by_sign: Name,
}

/// Values every dispatch case reads.
#[derive(Clone, Copy)]
struct Bounds {
    start: Var,
    end: Var,
    by: Option<(Var, TypeId)>,
    range_type: TypeId,
    direction: Var,
    current: Var,
    loop_var: Var,
}

impl IrLowerer<'_> {
    pub(crate) fn lower_for_range(
        &mut self,
        flow: &ForRangeFlow,
        escape: Option<Var>,
    ) -> GenResult<Vec<Instr>> {
        let span = Some(flow.span);
        let outer = self.open_outer(flow.guard.as_ref(), flow.returning.as_ref(), flow.span)?;
        let loop_scope = self.ctx.enter_scope(FrameKind::Loop);

        let range_type = self.ctx.expr_type(flow.start)?;
        let loop_var = Var::Named(flow.var);
        let mut inner = vec![
            Instr::enter(loop_scope, span),
            Instr::reference(loop_var, range_type, span),
            Instr::register(loop_var, loop_scope, span),
        ];

        let mut initialization = Vec::new();
        let start = self.set_bound(flow.start, "start", &mut initialization)?;
        let end = self.set_bound(flow.end, "end", &mut initialization)?;
        let by = match flow.by {
            Some(by) => {
                let value = self.set_bound(by, "by", &mut initialization)?;
                Some((value, self.ctx.expr_type(by)?))
            }
            None => None,
        };

        let cx = self
            .operator_context(start, range_type, self.ctx.names.cmp, span)?
            .argument(end, range_type);
        let (cmp_instrs, direction, _) = self.call_managed(cx, None)?;
        initialization.extend(cmp_instrs);

        let current = self.ctx.temp();
        initialization.push(Instr::load(current, start, span));
        manage_in(current, loop_scope, span, &mut initialization);

        let bounds = Bounds {
            start,
            end,
            by,
            range_type,
            direction,
            current,
            loop_var,
        };
        let names = &self.ctx.names;
        let ascending = Direction {
            selects: names.lt,
            continues: names.lteq,
            step: names.inc,
            by_sign: names.gt,
        };
        let descending = Direction {
            selects: names.gt,
            continues: names.gteq,
            step: names.dec,
            by_sign: names.lt,
        };
        let dispatch = DispatchCases {
            ascending: self.directional_case(&bounds, ascending, span)?,
            descending: self.directional_case(&bounds, descending, span)?,
            equal: self.equal_case(&bounds, span)?,
        };

        let (body_scope, body) = self.lower_scoped_block(flow.body, FrameKind::Block, span)?;
        self.ctx.exit_scope(loop_scope)?;

        let block = ForRangePolymorphic {
            initialization,
            direction,
            current,
            loop_var,
            dispatch,
            body,
            metadata: LoopMetadata {
                start,
                end,
                by: by.map(|(var, _)| var),
                range_type,
                by_type: by.map(|(_, ty)| ty),
            },
            scopes: ScopeMetadata {
                outer: outer.scope(),
                loop_scope,
                body_scope,
            },
            span,
        };
        inner.push(Instr::for_range(block, span));
        inner.push(Instr::exit(loop_scope, span));
        self.close_outer(outer, inner, escape)
    }

    /// Evaluate a bound, managed, and assert it is set.
    fn set_bound(
        &mut self,
        bound: ExprId,
        label: &str,
        out: &mut Vec<Instr>,
    ) -> GenResult<Var> {
        let span = self.span_of(bound);
        let (instrs, value, ty) = self.eval_managed(bound)?;
        out.extend(instrs);
        let cx = self.operator_context(value, ty, self.ctx.names.is_set, span)?;
        let (is_set_instrs, is_set, is_set_type) = self.call_managed(cx, None)?;
        out.extend(is_set_instrs);
        let (true_instrs, primitive) = self.primitive_of(is_set, is_set_type, span)?;
        out.extend(true_instrs);
        out.push(Instr::assert(
            primitive,
            &format!("For-range '{label}' value must be set"),
            span,
        ));
        Ok(value)
    }

    fn directional_case(
        &mut self,
        bounds: &Bounds,
        direction: Direction,
        span: Option<Span>,
    ) -> GenResult<DirectionalCase> {
        let (direction_check, direction_primitive) =
            self.check_scope(span, |this| this.direction_check(bounds, direction, span))?;

        let (condition, condition_primitive) = self.check_scope(span, |this| {
            let cx = this
                .operator_context(bounds.current, bounds.range_type, this.ctx.names.cmp, span)?
                .argument(bounds.end, bounds.range_type);
            let (mut out, cmp, cmp_type) = this.call_managed(cx, None)?;
            let (against_zero, result) = this.against_zero(cmp, cmp_type, direction.continues, span)?;
            out.extend(against_zero);
            Ok((out, result))
        })?;

        let mut body_setup = Vec::new();
        rebind(bounds.loop_var, bounds.current, span, &mut body_setup);

        let increment = self.scoped(FrameKind::Block, span, |this, _| {
            let cx = match bounds.by {
                Some((by, by_type)) => this
                    .operator_context(bounds.current, bounds.range_type, this.ctx.names.add, span)?
                    .argument(by, by_type),
                None => this.operator_context(
                    bounds.current,
                    bounds.range_type,
                    direction.step,
                    span,
                )?,
            };
            let (mut out, next, _) = this.call_value(cx, None)?;
            rebind(bounds.current, next, span, &mut out);
            Ok(out)
        })?;

        Ok(DirectionalCase {
            direction_check,
            direction_primitive,
            condition,
            condition_primitive,
            body_setup,
            increment,
        })
    }

    /// `direction <selects> 0`, and with `by` also the sign of the step.
    fn direction_check(
        &mut self,
        bounds: &Bounds,
        direction: Direction,
        span: Option<Span>,
    ) -> GenResult<(Vec<Instr>, Var)> {
        let (selected, selects) =
            self.against_zero(bounds.direction, TypeId::INTEGER, direction.selects, span)?;
        let Some((by, by_type)) = bounds.by else {
            return Ok((selected, selects));
        };

        let cx = self
            .operator_context(bounds.start, bounds.range_type, self.ctx.names.add, span)?
            .argument(by, by_type);
        let (mut stepped, first, first_type) = self.call_managed(cx, None)?;
        let cx = self
            .operator_context(first, first_type, self.ctx.names.cmp, span)?
            .argument(bounds.start, bounds.range_type);
        let (cmp_instrs, cmp, cmp_type) = self.call_managed(cx, None)?;
        stepped.extend(cmp_instrs);
        let (sign_instrs, sign) = self.against_zero(cmp, cmp_type, direction.by_sign, span)?;
        stepped.extend(sign_instrs);

        let result = self.ctx.temp();
        let block = self.logical_block(
            LogicalOp::And,
            (
                OperandEvaluation {
                    instructions: selected,
                    value: selects,
                },
                TypeId::BOOLEAN,
            ),
            (
                OperandEvaluation {
                    instructions: stepped,
                    value: sign,
                },
                TypeId::BOOLEAN,
            ),
            result,
            span,
        )?;
        let mut out = vec![Instr::logical(block, span)];
        self.manage(result, span, &mut out)?;
        Ok((out, result))
    }

    fn equal_case(&mut self, bounds: &Bounds, span: Option<Span>) -> GenResult<EqualCase> {
        let (direction_check, direction_primitive) = self.check_scope(span, |this| {
            this.against_zero(bounds.direction, TypeId::INTEGER, this.ctx.names.eq, span)
        })?;
        let mut body_setup = Vec::new();
        rebind(bounds.loop_var, bounds.current, span, &mut body_setup);
        Ok(EqualCase {
            direction_check,
            direction_primitive,
            body_setup,
        })
    }

    /// `value <op> 0` as a managed Boolean.
    fn against_zero(
        &mut self,
        value: Var,
        ty: TypeId,
        op: Name,
        span: Option<Span>,
    ) -> GenResult<(Vec<Instr>, Var)> {
        let zero = self.ctx.temp();
        let text = self.ctx.names.zero;
        let mut out = self.managed(zero, span, |_| {
            Ok(vec![Instr::literal(zero, text, TypeId::INTEGER, span)])
        })?;
        let cx = self
            .operator_context(value, ty, op, span)?
            .argument(zero, TypeId::INTEGER);
        let (instrs, result, _) = self.call_managed(cx, None)?;
        out.extend(instrs);
        Ok((out, result))
    }

    /// Run a Boolean-producing check in its own scope and extract the
    /// primitive before leaving it.
    fn check_scope(
        &mut self,
        span: Option<Span>,
        check: impl FnOnce(&mut Self) -> GenResult<(Vec<Instr>, Var)>,
    ) -> GenResult<(Vec<Instr>, Var)> {
        let (_, out, primitive) = self.in_scope(FrameKind::Block, span, |this, _| {
            let (mut out, result) = check(this)?;
            let (true_instrs, primitive) = this.primitive_of(result, TypeId::BOOLEAN, span)?;
            out.extend(true_instrs);
            Ok((out, primitive))
        })?;
        Ok((out, primitive))
    }
}
