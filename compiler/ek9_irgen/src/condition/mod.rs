//! Guarded condition evaluator.
//!
//! `if`, `while`, `switch`, `for` and `try` accept a guard (`v <- expr`)
//! and/or a condition. Four shapes normalise into one instruction sequence
//! producing a managed Boolean plus the primitive a backend branches on:
//!
//! | guard | condition | check | emitted |
//! |---|---|---|---|
//! | yes | yes | yes | `v? and condition`, short-circuit |
//! | yes | yes | no | `condition` |
//! | no | yes | - | `condition` |
//! | yes | no | yes | `v?` |
//!
//! Anything else is a fault. Guard *setup* (binding `v`) is emitted by the
//! construct itself, before the evaluation produced here.

use ek9_ir::{Instr, OperandEvaluation, Var};
use ek9_tree::ast::{Guard, GuardOp, LogicalOp};
use ek9_tree::{ExprId, Span, TypeId};

use crate::memory::rebind;
use crate::{GenFault, GenResult, IrLowerer};

/// Evaluated condition: `result` is a managed Boolean, `primitive` its
/// `_true()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GuardedCondition {
    pub instrs: Vec<Instr>,
    pub result: Var,
    pub primitive: Var,
}

impl IrLowerer<'_> {
    pub(crate) fn evaluate_guarded_condition(
        &mut self,
        guard: Option<&Guard>,
        condition: Option<ExprId>,
        span: Span,
    ) -> GenResult<GuardedCondition> {
        let at = Some(span);
        let (mut instrs, result, ty) = match (guard, condition) {
            (Some(guard), Some(condition)) if guard.op.requires_check() => {
                let (left, left_type) = self.guard_check(guard)?;
                let (right_instrs, right, right_type) = self.eval_managed(condition)?;
                let right = OperandEvaluation {
                    instructions: right_instrs,
                    value: right,
                };
                let result = self.ctx.temp();
                let block = self.logical_block(
                    LogicalOp::And,
                    (left, left_type),
                    (right, right_type),
                    result,
                    at,
                )?;
                let mut instrs = vec![Instr::logical(block, at)];
                self.manage(result, at, &mut instrs)?;
                (instrs, result, TypeId::BOOLEAN)
            }
            (_, Some(condition)) => self.eval_managed(condition)?,
            (Some(guard), None) if guard.op.requires_check() => {
                let (check, ty) = self.guard_check(guard)?;
                (check.instructions, check.value, ty)
            }
            _ => {
                return Err(GenFault::malformed(
                    "Control flow must have either a condition or a guard variable",
                    span,
                ))
            }
        };
        let (true_instrs, primitive) = self.primitive_of(result, ty, at)?;
        instrs.extend(true_instrs);
        Ok(GuardedCondition {
            instrs,
            result,
            primitive,
        })
    }

    /// `v?` for the guard variable, managed.
    fn guard_check(&mut self, guard: &Guard) -> GenResult<(OperandEvaluation, TypeId)> {
        let span = Some(guard.span);
        let ty = self.ctx.declared_type(guard.ty, guard.span)?;
        let value = self.ctx.temp();
        let mut instructions = self.question_for_variable(Var::Named(guard.name), ty, value, span)?;
        self.manage(value, span, &mut instructions)?;
        Ok((
            OperandEvaluation {
                instructions,
                value,
            },
            TypeId::BOOLEAN,
        ))
    }

    /// Bind the guard variable in the current scope.
    ///
    /// - `<-` declares it like a variable declaration.
    /// - `?=` declares it, registers it, then rebinds it to the value.
    /// - `:=`, `=` and `:=?` assign an existing variable.
    pub(crate) fn guard_setup(&mut self, guard: &Guard) -> GenResult<Vec<Instr>> {
        let span = Some(guard.span);
        let ty = self.ctx.declared_type(guard.ty, guard.span)?;
        let var = Var::Named(guard.name);
        match guard.op {
            GuardOp::Declare => self.declare_variable(var, ty, guard.value, span),
            GuardOp::GuardAssign => {
                let scope = self.ctx.current_scope()?;
                let mut out = vec![
                    Instr::reference(var, ty, span),
                    Instr::register(var, scope, span),
                ];
                let (value_instrs, value, _) = self.eval_managed(guard.value)?;
                out.extend(value_instrs);
                rebind(var, value, span, &mut out);
                Ok(out)
            }
            GuardOp::Assign | GuardOp::Blind => self.assign_variable(var, guard.value, span),
            GuardOp::IfUnset => self.guarded_assignment(var, ty, guard.value, span),
        }
    }
}

#[cfg(test)]
mod tests;
