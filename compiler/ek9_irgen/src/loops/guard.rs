//! The outer scope around guarded and expression-form constructs.
//!
//! ```text
//! SCOPE_ENTER outer
//!   guard setup                  v <- expr
//!   REFERENCE rtn                returning variable, owned by outer
//!   SCOPE_REGISTER rtn, outer
//!   [rtn init]
//!   CONTROL_FLOW_CHAIN IF_ELSE_WITH_GUARDS outer      only if v must be checked
//!     case: SCOPE_ENTER c  v?  primitive  SCOPE_EXIT c
//!     body: the construct
//!   _tN = LOAD rtn               expression form: escape into the parent
//!   RETAIN _tN
//!   SCOPE_REGISTER _tN, parent
//! SCOPE_EXIT outer
//! ```

use ek9_ir::{CaseKind, ChainKind, ConditionCase, ControlFlowChain, Instr, ScopeId, Var};
use ek9_tree::ast::{Guard, ReturningParam};
use ek9_tree::{Span, TypeId};

use crate::chain::{render_chain, ChainDetails};
use crate::context::FrameKind;
use crate::{GenResult, IrLowerer};

/// An entered outer scope, waiting for the construct it wraps.
pub(crate) struct OuterScope {
    scope: ScopeId,
    guard: Option<Guard>,
    setup: Vec<Instr>,
    return_setup: Vec<Instr>,
    returning: Option<Var>,
    span: Option<Span>,
}

impl OuterScope {
    pub(crate) fn scope(&self) -> ScopeId {
        self.scope
    }

    pub(crate) fn return_variable(&self) -> Option<Var> {
        self.returning
    }
}

impl IrLowerer<'_> {
    /// Enter the outer scope and bind the guard and returning variables.
    pub(crate) fn open_outer(
        &mut self,
        guard: Option<&Guard>,
        returning: Option<&ReturningParam>,
        span: Span,
    ) -> GenResult<OuterScope> {
        let scope = self.ctx.enter_scope(FrameKind::Guard);
        let setup = match guard {
            Some(guard) => self.guard_setup(guard)?,
            None => Vec::new(),
        };
        let mut return_setup = Vec::new();
        let returning = match returning {
            Some(param) => {
                let at = Some(param.span);
                let ty = self.ctx.declared_type(param.ty, param.span)?;
                let var = Var::Named(param.name);
                return_setup.push(Instr::reference(var, ty, at));
                return_setup.push(Instr::register(var, scope, at));
                if let Some(init) = param.init {
                    let (instrs, value, _) = self.eval_managed(init)?;
                    return_setup.extend(instrs);
                    return_setup.push(Instr::store(var, value, at));
                    return_setup.push(Instr::retain(var, at));
                }
                Some(var)
            }
            None => None,
        };
        Ok(OuterScope {
            scope,
            guard: guard.copied(),
            setup,
            return_setup,
            returning,
            span: Some(span),
        })
    }

    /// Wrap `inner` in the entry check (when the guard needs one), escape
    /// the returning variable into `escape`, and leave the outer scope.
    pub(crate) fn close_outer(
        &mut self,
        outer: OuterScope,
        inner: Vec<Instr>,
        escape: Option<Var>,
    ) -> GenResult<Vec<Instr>> {
        let OuterScope {
            scope,
            guard,
            setup,
            return_setup,
            returning,
            span,
        } = outer;

        let mut epilogue = Vec::new();
        if let (Some(dst), Some(rtn)) = (escape, returning) {
            let parent = self.ctx.parent_scope()?;
            epilogue.push(Instr::load(dst, rtn, span));
            epilogue.push(Instr::retain(dst, span));
            epilogue.push(Instr::register(dst, parent, span));
        }

        let out = match guard.filter(|guard| guard.op.requires_check()) {
            Some(guard) => {
                let chain = self.entry_check(&guard, scope, inner)?;
                let mut details = ChainDetails::new(chain);
                details.guard_scope = Some(scope);
                details.guard_setup = setup;
                details.return_setup = return_setup;
                details.epilogue = epilogue;
                render_chain(details)
            }
            None => {
                let mut out = Vec::with_capacity(inner.len() + setup.len() + 8);
                out.push(Instr::enter(scope, span));
                out.extend(setup);
                out.extend(return_setup);
                out.extend(inner);
                out.extend(epilogue);
                out.push(Instr::exit(scope, span));
                out
            }
        };
        self.ctx.exit_scope(scope)?;
        Ok(out)
    }

    /// `if v? { inner }` as a single-case chain.
    fn entry_check(
        &mut self,
        guard: &Guard,
        scope: ScopeId,
        inner: Vec<Instr>,
    ) -> GenResult<ControlFlowChain> {
        let span = Some(guard.span);
        let ty = self.ctx.declared_type(guard.ty, guard.span)?;
        let var = Var::Named(guard.name);

        let case_scope = self.ctx.enter_scope(FrameKind::Block);
        let mut condition = vec![Instr::enter(case_scope, span)];
        let check = self.ctx.temp();
        condition.extend(self.question_for_variable(var, ty, check, span)?);
        self.manage(check, span, &mut condition)?;
        let (true_instrs, primitive) = self.primitive_of(check, TypeId::BOOLEAN, span)?;
        condition.extend(true_instrs);
        condition.push(Instr::exit(case_scope, span));
        self.ctx.exit_scope(case_scope)?;

        let mut chain = ControlFlowChain::new(ChainKind::IfElseWithGuards, scope, span);
        chain.guard_variables.push(var);
        chain.cases.push(ConditionCase {
            kind: CaseKind::Expression,
            case_scope,
            condition,
            condition_result: Some(check),
            primitive: Some(primitive),
            body: inner,
            body_result: None,
            exception: None,
        });
        Ok(chain)
    }
}
