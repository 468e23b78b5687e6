//! The null-safe `?` operator and guarded assignment.
//!
//! `x?` is a two-case chain: a `NullCheck` case whose body yields a managed
//! `false`, and a default that yields `x._isSet()`. `_isSet` never runs on
//! a null receiver. The chain result is raw; the consumer manages it.
//!
//! `x :=? e` inverts that result with `_negate` and uses it as the single
//! case of a `GuardedAssignment` chain whose body performs the assignment.

use ek9_ir::{
    CaseKind, ChainKind, ConditionCase, ControlFlowChain, DefaultCase, Instr, Var,
};
use ek9_tree::{ExprId, Span, TypeId};

use crate::memory::rebind;
use crate::{GenResult, IrLowerer};

impl IrLowerer<'_> {
    /// `operand?` into `dst`.
    pub(crate) fn lower_question(
        &mut self,
        operand: ExprId,
        dst: Var,
        span: Option<Span>,
    ) -> GenResult<Vec<Instr>> {
        let (prefix, subject, ty) = self.eval_managed(operand)?;
        let chain = self.question_chain(prefix, subject, ty, dst, span)?;
        Ok(vec![Instr::chain(chain, span)])
    }

    /// `var?` for a variable already in scope, into `dst`.
    pub(crate) fn question_for_variable(
        &mut self,
        var: Var,
        ty: TypeId,
        dst: Var,
        span: Option<Span>,
    ) -> GenResult<Vec<Instr>> {
        let chain = self.question_chain(Vec::new(), var, ty, dst, span)?;
        Ok(vec![Instr::chain(chain, span)])
    }

    /// Question chain over `subject`; `prefix` produces it.
    fn question_chain(
        &mut self,
        prefix: Vec<Instr>,
        subject: Var,
        ty: TypeId,
        dst: Var,
        span: Option<Span>,
    ) -> GenResult<ControlFlowChain> {
        let scope = self.ctx.current_scope()?;

        let is_null = self.ctx.temp();
        let mut condition = prefix;
        condition.push(Instr::is_null(is_null, subject, span));

        let unset = self.ctx.temp();
        let false_ = self.ctx.names.false_;
        let body = self.managed(unset, span, |_| {
            Ok(vec![Instr::literal(unset, false_, TypeId::BOOLEAN, span)])
        })?;

        let cx = self.operator_context(subject, ty, self.ctx.names.is_set, span)?;
        let (default_body, is_set, _) = self.call_managed(cx, None)?;

        let mut chain = ControlFlowChain::new(ChainKind::QuestionOperator, scope, span);
        chain.result = Some(dst);
        chain.cases.push(ConditionCase {
            kind: CaseKind::NullCheck,
            case_scope: scope,
            condition,
            condition_result: None,
            primitive: Some(is_null),
            body,
            body_result: Some(unset),
            exception: None,
        });
        chain.default = Some(DefaultCase {
            body: default_body,
            result: Some(is_set),
        });
        Ok(chain)
    }

    /// `target :=? value`: assign only when `target` is null or unset.
    pub(crate) fn guarded_assignment(
        &mut self,
        target: Var,
        ty: TypeId,
        value: ExprId,
        span: Option<Span>,
    ) -> GenResult<Vec<Instr>> {
        let scope = self.ctx.current_scope()?;

        // (target?)._negate()._true()
        let question = self.ctx.temp();
        let mut condition = self.question_for_variable(target, ty, question, span)?;
        self.manage(question, span, &mut condition)?;
        let cx = self.operator_context(question, TypeId::BOOLEAN, self.ctx.names.negate, span)?;
        let (negate_instrs, negated, negated_type) = self.call_managed(cx, None)?;
        condition.extend(negate_instrs);
        let (true_instrs, primitive) = self.primitive_of(negated, negated_type, span)?;
        condition.extend(true_instrs);

        let (mut body, assigned, _) = self.eval_managed(value)?;
        rebind(target, assigned, span, &mut body);

        let mut chain = ControlFlowChain::new(ChainKind::GuardedAssignment, scope, span);
        chain.cases.push(ConditionCase {
            kind: CaseKind::Expression,
            case_scope: scope,
            condition,
            condition_result: Some(negated),
            primitive: Some(primitive),
            body,
            body_result: None,
            exception: None,
        });
        Ok(vec![Instr::chain(chain, span)])
    }
}
