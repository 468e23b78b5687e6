//! `for item in source`.
//!
//! ```text
//! SCOPE_ENTER outer
//!   SCOPE_ENTER loop
//!     source, managed
//!     _it = source.iterator()        managed; skipped when source is an iterator
//!     REFERENCE item
//!     SCOPE_REGISTER item, loop
//!     CONTROL_FLOW_CHAIN WHILE_LOOP loop
//!       case: SCOPE_ENTER c  _it.hasNext()  primitive  SCOPE_EXIT c
//!       body: SCOPE_ENTER b  _n = _it.next()  rebind item  ...  SCOPE_EXIT b
//!   SCOPE_EXIT loop
//! SCOPE_EXIT outer
//! ```

use ek9_ir::{CaseKind, ChainKind, ConditionCase, ControlFlowChain, Instr, Var};
use ek9_tree::ast::ForInFlow;
use ek9_tree::{Name, TypeId};

use crate::chain::{render_chain, ChainDetails};
use crate::context::FrameKind;
use crate::memory::rebind;
use crate::{GenFault, GenResult, IrLowerer};

impl IrLowerer<'_> {
    pub(crate) fn lower_for_in(
        &mut self,
        flow: &ForInFlow,
        escape: Option<Var>,
    ) -> GenResult<Vec<Instr>> {
        let span = Some(flow.span);
        let outer = self.open_outer(flow.guard.as_ref(), flow.returning.as_ref(), flow.span)?;
        let loop_scope = self.ctx.enter_scope(FrameKind::Loop);

        let (mut preamble, source, source_type) = self.eval_managed(flow.source)?;
        let (iterator, iterator_type) = if self.is_iterator(source_type) {
            (source, source_type)
        } else if self.has_nullary(source_type, self.ctx.names.iterator) {
            let cx = self.method_context(source, source_type, self.ctx.names.iterator, span)?;
            let (instrs, iterator, iterator_type) = self.call_managed(cx, None)?;
            preamble.extend(instrs);
            (iterator, iterator_type)
        } else {
            return Err(GenFault::malformed(
                format!(
                    "`{}` cannot be iterated: it has neither `iterator()` nor `hasNext()`/`next()`",
                    self.ctx.type_label(source_type)
                ),
                flow.span,
            ));
        };

        let item_type = self.ctx.declared_type(flow.var_ty, flow.span)?;
        let item = Var::Named(flow.var);
        preamble.push(Instr::reference(item, item_type, span));
        preamble.push(Instr::register(item, loop_scope, span));

        let case_scope = self.ctx.enter_scope(FrameKind::Block);
        let mut condition = vec![Instr::enter(case_scope, span)];
        let cx = self.method_context(iterator, iterator_type, self.ctx.names.has_next, span)?;
        let (has_next_instrs, has_next, has_next_type) = self.call_managed(cx, None)?;
        condition.extend(has_next_instrs);
        let (true_instrs, primitive) = self.primitive_of(has_next, has_next_type, span)?;
        condition.extend(true_instrs);
        condition.push(Instr::exit(case_scope, span));
        self.ctx.exit_scope(case_scope)?;

        let body = self.scoped(FrameKind::Block, span, |this, _| {
            let cx = this.method_context(iterator, iterator_type, this.ctx.names.next, span)?;
            let (mut out, next, _) = this.call_managed(cx, None)?;
            rebind(item, next, span, &mut out);
            out.extend(this.lower_statements(flow.body)?);
            Ok(out)
        })?;

        let mut chain = ControlFlowChain::new(ChainKind::WhileLoop, loop_scope, span);
        chain.return_variable = outer.return_variable();
        if let Some(guard) = &flow.guard {
            chain.guard_variables.push(Var::Named(guard.name));
        }
        chain.cases.push(ConditionCase {
            kind: CaseKind::Expression,
            case_scope,
            condition,
            condition_result: Some(has_next),
            primitive: Some(primitive),
            body,
            body_result: None,
            exception: None,
        });

        self.ctx.exit_scope(loop_scope)?;
        let mut details = ChainDetails::new(chain);
        details.condition_scope = Some(loop_scope);
        details.preamble = preamble;
        let inner = render_chain(details);
        self.close_outer(outer, inner, escape)
    }

    fn is_iterator(&self, ty: TypeId) -> bool {
        self.has_nullary(ty, self.ctx.names.has_next) && self.has_nullary(ty, self.ctx.names.next)
    }

    fn has_nullary(&self, ty: TypeId, method: Name) -> bool {
        self.ctx.types.has_method(ty, method, 0)
    }
}
