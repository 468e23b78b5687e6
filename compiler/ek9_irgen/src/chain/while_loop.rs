//! `while` and `do ... while`.
//!
//! ```text
//! SCOPE_ENTER outer                 guard + returning variable
//!   SCOPE_ENTER loop
//!     CONTROL_FLOW_CHAIN WHILE_LOOP loop
//!       case: SCOPE_ENTER c ... primitive SCOPE_EXIT c   (every iteration)
//!       body: SCOPE_ENTER b ... SCOPE_EXIT b
//!   SCOPE_EXIT loop
//! SCOPE_EXIT outer
//! ```
//!
//! The condition scope is entered and left on every iteration, so the
//! temporaries a condition creates never accumulate across iterations.

use ek9_ir::{CaseKind, ChainKind, ConditionCase, ControlFlowChain, Instr, Var};
use ek9_tree::ast::WhileFlow;

use super::{render_chain, ChainDetails};
use crate::context::FrameKind;
use crate::{GenResult, IrLowerer};

impl IrLowerer<'_> {
    pub(crate) fn lower_while(
        &mut self,
        flow: &WhileFlow,
        escape: Option<Var>,
    ) -> GenResult<Vec<Instr>> {
        let span = Some(flow.span);
        let outer = self.open_outer(flow.guard.as_ref(), flow.returning.as_ref(), flow.span)?;

        let loop_scope = self.ctx.enter_scope(FrameKind::Loop);
        let kind = if flow.do_while {
            ChainKind::DoWhileLoop
        } else {
            ChainKind::WhileLoop
        };
        let mut chain = ControlFlowChain::new(kind, loop_scope, span);
        chain.return_variable = outer.return_variable();
        if let Some(guard) = &flow.guard {
            chain.guard_variables.push(Var::Named(guard.name));
        }

        // A guard alone is re-checked each iteration; with a condition it
        // only gates entry.
        let guard = match flow.condition {
            Some(_) => None,
            None => flow.guard.as_ref(),
        };
        let case_scope = self.ctx.enter_scope(FrameKind::Block);
        let mut condition = vec![Instr::enter(case_scope, span)];
        let evaluated = self.evaluate_guarded_condition(guard, flow.condition, flow.span)?;
        condition.extend(evaluated.instrs);
        condition.push(Instr::exit(case_scope, span));
        self.ctx.exit_scope(case_scope)?;

        let body = self.lower_block(flow.body, FrameKind::Block, span)?;
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

        self.ctx.exit_scope(loop_scope)?;
        let mut details = ChainDetails::new(chain);
        details.condition_scope = Some(loop_scope);
        let inner = render_chain(details);
        self.close_outer(outer, inner, escape)
    }
}
