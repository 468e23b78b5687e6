//! `try` / `catch` / `finally`, with resources.
//!
//! ```text
//! SCOPE_ENTER outer                    guard + returning variable
//!   SCOPE_ENTER resources              only with resources
//!     REFERENCE r  init  STORE r  RETAIN r  SCOPE_REGISTER r, resources
//!     SCOPE_ENTER flow
//!       CONTROL_FLOW_CHAIN TRY_CATCH_FINALLY flow
//!         try:     SCOPE_ENTER t ... SCOPE_EXIT t
//!         handler: SCOPE_ENTER k  REFERENCE e  SCOPE_REGISTER e, k ... SCOPE_EXIT k
//!         finally: SCOPE_ENTER f ... r.close() (reverse order)  SCOPE_EXIT f
//!     SCOPE_EXIT flow
//!   SCOPE_EXIT resources
//! SCOPE_EXIT outer
//! ```
//!
//! The caught exception arrives retained by its thrower, so the handler
//! only registers it. One catch clause is supported.

use ek9_ir::{
    CaseKind, ChainKind, ConditionCase, ControlFlowChain, ExceptionBinding, Instr, TryBlock, Var,
};
use ek9_tree::ast::{CatchClause, Resource, TryFlow};

use crate::chain::{render_chain, ChainDetails};
use crate::context::FrameKind;
use crate::{GenFault, GenResult, IrLowerer};

impl IrLowerer<'_> {
    pub(crate) fn lower_try(&mut self, flow: &TryFlow, escape: Option<Var>) -> GenResult<Vec<Instr>> {
        if flow.catches.len() > 1 {
            return Err(GenFault::malformed(
                "Multiple catch clauses are not supported",
                flow.span,
            ));
        }
        let span = Some(flow.span);
        let outer = self.open_outer(flow.guard.as_ref(), flow.returning.as_ref(), flow.span)?;

        let return_variable = outer.return_variable();
        let inner = if flow.resources.is_empty() {
            self.try_chain(flow, return_variable)?
        } else {
            self.scoped(FrameKind::Try, span, |this, _| {
                let mut out = Vec::new();
                for resource in &flow.resources {
                    out.extend(this.open_resource(resource)?);
                }
                out.extend(this.try_chain(flow, return_variable)?);
                Ok(out)
            })?
        };
        self.close_outer(outer, inner, escape)
    }

    /// Declare a resource like a variable, owned by the resource scope.
    fn open_resource(&mut self, resource: &Resource) -> GenResult<Vec<Instr>> {
        let ty = self.ctx.declared_type(resource.ty, resource.span)?;
        self.declare_variable(Var::Named(resource.name), ty, resource.init, Some(resource.span))
    }

    fn try_chain(&mut self, flow: &TryFlow, return_variable: Option<Var>) -> GenResult<Vec<Instr>> {
        let span = Some(flow.span);
        let scope = self.ctx.enter_scope(FrameKind::Try);
        let mut chain = ControlFlowChain::new(ChainKind::TryCatchFinally, scope, span);
        chain.return_variable = return_variable;
        if let Some(guard) = &flow.guard {
            chain.guard_variables.push(Var::Named(guard.name));
        }

        let (try_scope, body) = self.lower_scoped_block(flow.body, FrameKind::Try, span)?;
        chain.try_block = Some(TryBlock {
            scope: try_scope,
            body,
        });

        if let Some(catch) = flow.catches.first() {
            chain.cases.push(self.handler(catch)?);
        }

        if flow.finally.is_some() || !flow.resources.is_empty() {
            chain.finally = Some(self.finally_block(flow)?);
        }

        self.ctx.exit_scope(scope)?;
        let mut details = ChainDetails::new(chain);
        details.condition_scope = Some(scope);
        Ok(render_chain(details))
    }

    fn handler(&mut self, catch: &CatchClause) -> GenResult<ConditionCase> {
        let span = Some(catch.span);
        let ty = self.ctx.declared_type(catch.ty, catch.span)?;
        let var = Var::Named(catch.name);
        let (case_scope, body, ()) = self.in_scope(FrameKind::Block, span, |this, scope| {
            let mut out = vec![
                Instr::reference(var, ty, span),
                Instr::register(var, scope, span),
            ];
            out.extend(this.lower_statements(catch.body)?);
            Ok((out, ()))
        })?;
        Ok(ConditionCase {
            kind: CaseKind::ExceptionHandler,
            case_scope,
            condition: Vec::new(),
            condition_result: None,
            primitive: None,
            body,
            body_result: None,
            exception: Some(ExceptionBinding { var, ty }),
        })
    }

    /// User `finally` statements, then `close()` on each resource, last
    /// declared first.
    fn finally_block(&mut self, flow: &TryFlow) -> GenResult<Vec<Instr>> {
        let span = Some(flow.span);
        self.scoped(FrameKind::Block, span, |this, _| {
            let mut out = match flow.finally {
                Some(finally) => this.lower_statements(finally)?,
                None => Vec::new(),
            };
            for resource in flow.resources.iter().rev() {
                out.extend(this.close_resource(resource)?);
            }
            Ok(out)
        })
    }

    fn close_resource(&mut self, resource: &Resource) -> GenResult<Vec<Instr>> {
        let span = Some(resource.span);
        let ty = self.ctx.declared_type(resource.ty, resource.span)?;
        let cx = self.method_context(Var::Named(resource.name), ty, self.ctx.names.close, span)?;
        let emitted = self.emit_call(cx, None)?;
        let mut out = emitted.instrs;
        if let Some(result) = emitted.result {
            self.manage(result, span, &mut out)?;
        }
        Ok(out)
    }
}
