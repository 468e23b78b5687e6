//! Unary, binary and short-circuit operators.
//!
//! Operators are method calls on the left operand: `a + b` becomes
//! `CALL_OPERATOR a._add(b)`, so user-defined overloads and promotions go
//! through the same resolution as ordinary calls.

use ek9_ir::{ConditionEvaluation, Instr, LogicalBlock, OperandEvaluation, Var};
use ek9_tree::ast::LogicalOp;
use ek9_tree::{ExprId, MethodRef, Name, Span, TypeId};

use crate::calls::operators;
use crate::{GenFault, GenResult, IrLowerer};

impl IrLowerer<'_> {
    pub(super) fn lower_unary(
        &mut self,
        op: Name,
        operand: ExprId,
        method: Option<MethodRef>,
        dst: Var,
        span: Option<Span>,
    ) -> GenResult<Vec<Instr>> {
        let info =
            operators::unary(self.ctx.text(op)).ok_or_else(|| self.unknown_operator(op, span))?;
        let (mut out, target, target_type) = self.eval_managed(operand)?;
        let method_name = self.ctx.interner.intern(info.method);
        let cx = self
            .operator_context(target, target_type, method_name, span)?
            .resolved(method);
        let (instrs, _, _) = self.call_value(cx, Some(dst))?;
        out.extend(instrs);
        Ok(out)
    }

    pub(super) fn lower_binary(
        &mut self,
        op: Name,
        left: ExprId,
        right: ExprId,
        method: Option<MethodRef>,
        dst: Var,
        span: Option<Span>,
    ) -> GenResult<Vec<Instr>> {
        let info =
            operators::binary(self.ctx.text(op)).ok_or_else(|| self.unknown_operator(op, span))?;
        let (mut out, target, target_type) = self.eval_managed(left)?;
        let (right_instrs, argument, argument_type) = self.eval_managed(right)?;
        out.extend(right_instrs);

        let method_name = self.ctx.interner.intern(info.method);
        let cx = self
            .operator_context(target, target_type, method_name, span)?
            .argument(argument, argument_type)
            .resolved(method);
        let (instrs, _, _) = self.call_value(cx, Some(dst))?;
        out.extend(instrs);
        Ok(out)
    }

    /// `left and right` / `left or right` as a short-circuit block writing
    /// `dst` raw.
    pub(crate) fn logical_expr(
        &mut self,
        op: LogicalOp,
        left: ExprId,
        right: ExprId,
        dst: Var,
        span: Option<Span>,
    ) -> GenResult<LogicalBlock> {
        let (left_instrs, left_value, left_type) = self.eval_managed(left)?;
        let (right_instrs, right_value, right_type) = self.eval_managed(right)?;
        self.logical_block(
            op,
            (
                OperandEvaluation {
                    instructions: left_instrs,
                    value: left_value,
                },
                left_type,
            ),
            (
                OperandEvaluation {
                    instructions: right_instrs,
                    value: right_value,
                },
                right_type,
            ),
            dst,
            span,
        )
    }

    /// Assemble a short-circuit block from two managed operand evaluations.
    ///
    /// The condition extracts `left._true()`; the result computation is
    /// `left._and(right)` or `left._or(right)` into `dst`.
    pub(crate) fn logical_block(
        &mut self,
        op: LogicalOp,
        left: (OperandEvaluation, TypeId),
        right: (OperandEvaluation, TypeId),
        dst: Var,
        span: Option<Span>,
    ) -> GenResult<LogicalBlock> {
        let (left, left_type) = left;
        let (right, right_type) = right;
        let scope = self.ctx.current_scope()?;

        let (condition_instrs, primitive) = self.primitive_of(left.value, left_type, span)?;
        let method = match op {
            LogicalOp::And => self.ctx.names.and,
            LogicalOp::Or => self.ctx.names.or,
        };
        let cx = self
            .operator_context(left.value, left_type, method, span)?
            .argument(right.value, right_type);
        let (result_instrs, result, _) = self.call_value(cx, Some(dst))?;

        Ok(LogicalBlock {
            op,
            result,
            left,
            condition: ConditionEvaluation {
                instructions: condition_instrs,
                primitive,
            },
            right,
            result_computation: OperandEvaluation {
                instructions: result_instrs,
                value: result,
            },
            scope,
        })
    }

    fn unknown_operator(&self, op: Name, span: Option<Span>) -> GenFault {
        GenFault::UnknownOperator {
            op: self.ctx.text(op).to_owned(),
            span: span.unwrap_or(Span::DUMMY),
        }
        .logged()
    }
}
