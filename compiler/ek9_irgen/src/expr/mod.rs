//! Expression generator.
//!
//! [`IrLowerer::lower_expr`] evaluates an expression into a caller-chosen
//! destination and leaves that value raw; sub-expressions it evaluates on
//! the way are managed in the current scope. [`IrLowerer::lower_expr_managed`]
//! additionally retains and registers the destination, except for
//! expressions that do so themselves (constructor calls, list literals,
//! expression-form control flow) and self references.

mod calls;
mod collections;
mod operators;

use ek9_ir::{Instr, Var};
use ek9_stack::ensure_sufficient_stack;
use ek9_tree::ast::{Callee, ExprKind};
use ek9_tree::{ExprId, Name, TypeId};

use crate::{GenFault, GenResult, IrLowerer};

impl IrLowerer<'_> {
    /// Evaluate `id` into `dst` without managing `dst`.
    pub(crate) fn lower_expr(&mut self, id: ExprId, dst: Var) -> GenResult<Vec<Instr>> {
        ensure_sufficient_stack(|| self.lower_expr_inner(id, dst))
    }

    fn lower_expr_inner(&mut self, id: ExprId, dst: Var) -> GenResult<Vec<Instr>> {
        let ty = self.ctx.expr_type(id)?;
        let expr = self.ctx.expr(id);
        let span = Some(expr.span);

        match expr.kind {
            // ── Values ─────────────────────────────────────────────
            ExprKind::Literal(text) => Ok(vec![Instr::literal(dst, text, ty, span)]),
            ExprKind::Ident(name) => Ok(vec![Instr::load(dst, Var::Named(name), span)]),
            ExprKind::This => Ok(vec![Instr::load(dst, Var::Named(self.ctx.names.this), span)]),
            ExprKind::Super => Ok(vec![Instr::load(
                dst,
                Var::Named(self.ctx.names.super_),
                span,
            )]),
            ExprKind::Property { object, name } => {
                let object = self.property_owner(object)?;
                Ok(vec![Instr::load(dst, Var::field(object, name), span)])
            }
            ExprKind::Paren(inner) => self.lower_expr(inner, dst),

            // ── Operators ──────────────────────────────────────────
            ExprKind::Unary {
                op,
                operand,
                method,
            } => self.lower_unary(op, operand, method, dst, span),
            ExprKind::Binary {
                op,
                left,
                right,
                method,
            } => self.lower_binary(op, left, right, method, dst, span),
            ExprKind::Logical { op, left, right } => {
                let block = self.logical_expr(op, left, right, dst, span)?;
                Ok(vec![Instr::logical(block, span)])
            }
            ExprKind::Question(operand) => self.lower_question(operand, dst, span),

            // ── Calls ──────────────────────────────────────────────
            ExprKind::Call {
                callee,
                args,
                method,
            } => match callee {
                Callee::Function(function) => {
                    self.lower_function_call(function, args, method, dst, span)
                }
                Callee::Constructor(owner) => self.lower_constructor(owner, args, method, dst, span),
            },
            ExprKind::MethodCall {
                receiver,
                name,
                args,
                method,
            } => self.lower_method_call(receiver, name, args, method, dst, span),

            // ── Collections ────────────────────────────────────────
            ExprKind::List(elements) => self.lower_list(elements, ty, dst, span),
            ExprKind::Dict(_) => Err(GenFault::not_implemented("Dictionary literal", expr.span)),

            // ── Known gaps ─────────────────────────────────────────
            ExprKind::Coalescing { .. } => {
                Err(GenFault::not_implemented("Coalescing operator", expr.span))
            }
            ExprKind::DynamicFunction => Err(GenFault::not_implemented(
                "Dynamic function declaration",
                expr.span,
            )),
            ExprKind::Stream(_) => Err(GenFault::not_implemented("Stream expression", expr.span)),

            // ── Control flow ───────────────────────────────────────
            ExprKind::Flow(flow) => self.lower_flow(flow, Some(dst)),
        }
    }

    /// Evaluate `id` into `dst`, then retain + register `dst` to the
    /// current scope unless the expression manages itself or yields
    /// nothing.
    pub(crate) fn lower_expr_managed(&mut self, id: ExprId, dst: Var) -> GenResult<Vec<Instr>> {
        let mut out = self.lower_expr(id, dst)?;
        let ty = self.ctx.expr_type(id)?;
        if !self.manages_itself(id) && self.ctx.needs_result_variable(ty) {
            self.manage(dst, self.span_of(id), &mut out)?;
        }
        Ok(out)
    }

    /// [`lower_expr_managed`](Self::lower_expr_managed) into a fresh temp.
    pub(crate) fn eval_managed(&mut self, id: ExprId) -> GenResult<(Vec<Instr>, Var, TypeId)> {
        let ty = self.ctx.expr_type(id)?;
        let dst = self.ctx.temp();
        let instrs = self.lower_expr_managed(id, dst)?;
        Ok((instrs, dst, ty))
    }

    /// Variable whose object a property is read from.
    fn property_owner(&self, object: ExprId) -> GenResult<Name> {
        let expr = self.ctx.expr(object);
        match expr.kind {
            ExprKind::This => Ok(self.ctx.names.this),
            ExprKind::Super => Ok(self.ctx.names.super_),
            ExprKind::Ident(name) => Ok(name),
            ExprKind::Paren(inner) => self.property_owner(inner),
            _ => Err(GenFault::not_implemented(
                "Property of a computed object",
                expr.span,
            )),
        }
    }

    fn manages_itself(&self, id: ExprId) -> bool {
        match self.ctx.expr(id).kind {
            ExprKind::Call {
                callee: Callee::Constructor(_),
                ..
            }
            | ExprKind::List(_)
            | ExprKind::Flow(_)
            | ExprKind::This
            | ExprKind::Super => true,
            ExprKind::Paren(inner) => self.manages_itself(inner),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests;
