//! `switch` (statement form).
//!
//! ```text
//! SCOPE_ENTER s
//!   subject evaluated once, managed          (preamble)
//!   CONTROL_FLOW_CHAIN SWITCH s evaluation=_tN
//!     case: SCOPE_ENTER c  comparisons  primitive  SCOPE_EXIT c
//!           body: SCOPE_ENTER b ... SCOPE_EXIT b
//!     default: ...
//! SCOPE_EXIT s
//! ```
//!
//! A case with several match values is a short-circuit OR over the
//! comparisons. Each comparison loads the subject into a managed temp and
//! calls `_eq`, or the operator written in the case (`case < 12`). A guard
//! wraps the whole switch with the loop-guard entry check.

use ek9_ir::{
    CaseKind, ChainKind, ConditionCase, ControlFlowChain, DefaultCase, Instr, OperandEvaluation,
    Var,
};
use ek9_tree::ast::{CaseMatch, LogicalOp, SwitchFlow};
use ek9_tree::{Span, TypeId};

use super::{render_chain, ChainDetails};
use crate::calls::operators;
use crate::context::FrameKind;
use crate::{GenFault, GenResult, IrLowerer};

impl IrLowerer<'_> {
    pub(crate) fn lower_switch(&mut self, flow: &SwitchFlow) -> GenResult<Vec<Instr>> {
        if flow.returning.is_some() {
            return Err(GenFault::not_implemented("Switch expression form", flow.span));
        }
        match &flow.guard {
            Some(guard) => {
                let outer = self.open_outer(Some(guard), None, flow.span)?;
                let inner = self.switch_chain(flow, ChainKind::SwitchWithGuards)?;
                self.close_outer(outer, inner, None)
            }
            None => self.switch_chain(flow, ChainKind::Switch),
        }
    }

    fn switch_chain(&mut self, flow: &SwitchFlow, kind: ChainKind) -> GenResult<Vec<Instr>> {
        let span = Some(flow.span);
        let scope = self.ctx.enter_scope(FrameKind::Block);
        let (preamble, subject, subject_type) = self.eval_managed(flow.subject)?;

        let mut chain = ControlFlowChain::new(kind, scope, span);
        chain.evaluation = Some(subject);
        if let Some(guard) = &flow.guard {
            chain.guard_variables.push(Var::Named(guard.name));
        }

        for case in &flow.cases {
            let case_span = Some(case.span);
            let case_scope = self.ctx.enter_scope(FrameKind::Block);
            let mut condition = vec![Instr::enter(case_scope, case_span)];
            let (matched, result) =
                self.case_matches(subject, subject_type, &case.matches, case.span)?;
            condition.extend(matched);
            let (true_instrs, primitive) = self.primitive_of(result, TypeId::BOOLEAN, case_span)?;
            condition.extend(true_instrs);
            condition.push(Instr::exit(case_scope, case_span));
            self.ctx.exit_scope(case_scope)?;

            let body = self.lower_block(case.body, FrameKind::Block, case_span)?;
            chain.cases.push(ConditionCase {
                kind: CaseKind::Expression,
                case_scope,
                condition,
                condition_result: Some(result),
                primitive: Some(primitive),
                body,
                body_result: None,
                exception: None,
            });
        }

        if let Some(default) = flow.default {
            chain.default = Some(DefaultCase {
                body: self.lower_block(default, FrameKind::Block, span)?,
                result: None,
            });
        }

        self.ctx.exit_scope(scope)?;
        let mut details = ChainDetails::new(chain);
        details.condition_scope = Some(scope);
        details.preamble = preamble;
        Ok(render_chain(details))
    }

    /// OR over the comparisons of one case, as a managed Boolean.
    fn case_matches(
        &mut self,
        subject: Var,
        subject_type: TypeId,
        matches: &[CaseMatch],
        span: Span,
    ) -> GenResult<(Vec<Instr>, Var)> {
        match matches {
            [] => Err(GenFault::malformed("Switch case has no match values", span)),
            [only] => self.comparison(subject, subject_type, only),
            [first, rest @ ..] => {
                let (left_instrs, left) = self.comparison(subject, subject_type, first)?;
                let (right_instrs, right) =
                    self.case_matches(subject, subject_type, rest, span)?;
                let result = self.ctx.temp();
                let block = self.logical_block(
                    LogicalOp::Or,
                    (
                        OperandEvaluation {
                            instructions: left_instrs,
                            value: left,
                        },
                        TypeId::BOOLEAN,
                    ),
                    (
                        OperandEvaluation {
                            instructions: right_instrs,
                            value: right,
                        },
                        TypeId::BOOLEAN,
                    ),
                    result,
                    Some(first.span),
                )?;
                let mut out = vec![Instr::logical(block, Some(first.span))];
                self.manage(result, Some(first.span), &mut out)?;
                Ok((out, result))
            }
        }
    }

    /// `subject op value` (default `==`), managed.
    fn comparison(
        &mut self,
        subject: Var,
        subject_type: TypeId,
        case: &CaseMatch,
    ) -> GenResult<(Vec<Instr>, Var)> {
        let span = Some(case.span);
        let method = match case.op {
            None => self.ctx.names.eq,
            Some(op) => {
                let info = operators::binary(self.ctx.text(op)).ok_or_else(|| {
                    GenFault::UnknownOperator {
                        op: self.ctx.text(op).to_owned(),
                        span: case.span,
                    }
                    .logged()
                })?;
                self.ctx.interner.intern(info.method)
            }
        };

        let loaded = self.ctx.temp();
        let mut out = vec![Instr::load(loaded, subject, span)];
        self.manage(loaded, span, &mut out)?;
        let (value_instrs, value, value_type) = self.eval_managed(case.value)?;
        out.extend(value_instrs);

        let cx = self
            .operator_context(loaded, subject_type, method, span)?
            .argument(value, value_type)
            .resolved(case.method);
        let (call_instrs, result, _) = self.call_managed(cx, None)?;
        out.extend(call_instrs);
        Ok((out, result))
    }
}
