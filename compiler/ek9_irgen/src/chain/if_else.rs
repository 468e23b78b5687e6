//! `if` / `else if` / `else`.
//!
//! ```text
//! SCOPE_ENTER chain            guard variables live here
//! CONTROL_FLOW_CHAIN IF_ELSE chain
//!   case:  [guard setup] SCOPE_ENTER c1 ... primitive SCOPE_EXIT c1
//!          body: SCOPE_ENTER b1 ... SCOPE_EXIT b1
//!   ...
//!   default: SCOPE_ENTER e ... SCOPE_EXIT e
//! SCOPE_EXIT chain
//! ```
//!
//! A branch's guard is set up at the head of its own condition, so later
//! guards are only bound when the earlier branches did not match.

use ek9_ir::{CaseKind, ChainKind, ConditionCase, ControlFlowChain, DefaultCase, Instr, Var};
use ek9_tree::ast::IfFlow;

use super::{render_chain, ChainDetails};
use crate::context::FrameKind;
use crate::{GenResult, IrLowerer};

impl IrLowerer<'_> {
    pub(crate) fn lower_if(&mut self, flow: &IfFlow) -> GenResult<Vec<Instr>> {
        let span = Some(flow.span);
        let guarded = flow.branches.iter().any(|branch| branch.guard.is_some());
        let kind = if guarded {
            ChainKind::IfElseWithGuards
        } else {
            ChainKind::IfElse
        };

        let chain_scope = self.ctx.enter_scope(FrameKind::Block);
        let mut chain = ControlFlowChain::new(kind, chain_scope, span);

        for branch in &flow.branches {
            let branch_span = Some(branch.span);
            let mut condition = Vec::new();
            if let Some(guard) = &branch.guard {
                condition.extend(self.guard_setup(guard)?);
                chain.guard_variables.push(Var::Named(guard.name));
            }

            let case_scope = self.ctx.enter_scope(FrameKind::Block);
            condition.push(Instr::enter(case_scope, branch_span));
            let evaluated =
                self.evaluate_guarded_condition(branch.guard.as_ref(), branch.condition, branch.span)?;
            condition.extend(evaluated.instrs);
            condition.push(Instr::exit(case_scope, branch_span));
            self.ctx.exit_scope(case_scope)?;

            let body = self.lower_block(branch.body, FrameKind::Block, branch_span)?;
            chain.cases.push(ConditionCase {
                kind: CaseKind::Expression,
                case_scope,
                condition,
                condition_result: Some(evaluated.result),
                primitive: Some(evaluated.primitive),
                body,
                body_result: None,
                exception: None,
            });
        }

        if let Some(else_body) = flow.else_body {
            chain.default = Some(DefaultCase {
                body: self.lower_block(else_body, FrameKind::Block, span)?,
                result: None,
            });
        }

        self.ctx.exit_scope(chain_scope)?;
        let mut details = ChainDetails::new(chain);
        details.condition_scope = Some(chain_scope);
        Ok(render_chain(details))
    }
}
