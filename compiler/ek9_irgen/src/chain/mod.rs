//! Control-flow-chain generator.
//!
//! Every conditional and looping construct is built as a
//! [`ChainDetails`]: the chain instruction plus the scaffolding around it.
//! [`render_chain`] lays the scaffolding out in one fixed order:
//!
//! ```text
//! SCOPE_ENTER guard_scope        (optional)
//!   guard setup
//!   return-variable setup
//!   SCOPE_ENTER condition_scope  (optional)
//!     preamble                   (e.g. the switch subject)
//!     CONTROL_FLOW_CHAIN ...
//!   SCOPE_EXIT condition_scope
//!   epilogue                     (escape of an expression-form result)
//! SCOPE_EXIT guard_scope
//! ```
//!
//! The specialised builders live in the sub-modules: [`if_else`],
//! [`switch`], [`while_loop`] and [`question`].

mod if_else;
mod question;
mod switch;
mod while_loop;

use ek9_ir::{ControlFlowChain, Instr, ScopeId, Var};
use ek9_stack::ensure_sufficient_stack;
use ek9_tree::ast::Flow;
use ek9_tree::{FlowId, Span};

use crate::{GenFault, GenResult, IrLowerer};

/// A chain and everything rendered around it.
pub(crate) struct ChainDetails {
    pub chain: ControlFlowChain,
    pub guard_scope: Option<ScopeId>,
    pub guard_setup: Vec<Instr>,
    pub return_setup: Vec<Instr>,
    pub condition_scope: Option<ScopeId>,
    pub preamble: Vec<Instr>,
    pub epilogue: Vec<Instr>,
    pub span: Option<Span>,
}

impl ChainDetails {
    pub(crate) fn new(chain: ControlFlowChain) -> Self {
        let span = chain.span;
        ChainDetails {
            chain,
            guard_scope: None,
            guard_setup: Vec::new(),
            return_setup: Vec::new(),
            condition_scope: None,
            preamble: Vec::new(),
            epilogue: Vec::new(),
            span,
        }
    }
}

/// Lay out `details` as a flat instruction sequence.
///
/// Only emits instructions; callers enter and exit the scopes on the
/// generation context while building the parts.
pub(crate) fn render_chain(details: ChainDetails) -> Vec<Instr> {
    let ChainDetails {
        chain,
        guard_scope,
        guard_setup,
        return_setup,
        condition_scope,
        preamble,
        epilogue,
        span,
    } = details;

    let mut out = Vec::with_capacity(guard_setup.len() + return_setup.len() + preamble.len() + 5);
    if let Some(scope) = guard_scope {
        out.push(Instr::enter(scope, span));
    }
    out.extend(guard_setup);
    out.extend(return_setup);
    if let Some(scope) = condition_scope {
        out.push(Instr::enter(scope, span));
    }
    out.extend(preamble);
    out.push(Instr::chain(chain, span));
    if let Some(scope) = condition_scope {
        out.push(Instr::exit(scope, span));
    }
    out.extend(epilogue);
    if let Some(scope) = guard_scope {
        out.push(Instr::exit(scope, span));
    }
    out
}

impl IrLowerer<'_> {
    /// Lower a control-flow construct.
    ///
    /// `escape` receives the returning variable's value for the expression
    /// form; `None` is the statement form.
    pub(crate) fn lower_flow(&mut self, id: FlowId, escape: Option<Var>) -> GenResult<Vec<Instr>> {
        ensure_sufficient_stack(|| {
            let tree = self.ctx.tree;
            let flow = tree.flow(id);
            if escape.is_some() && flow.returning().is_none() {
                return Err(GenFault::malformed(
                    "Expression-form control flow requires a returning variable",
                    flow.span(),
                ));
            }
            match flow {
                Flow::If(flow) => self.lower_if(flow),
                Flow::Switch(flow) => self.lower_switch(flow),
                Flow::While(flow) => self.lower_while(flow, escape),
                Flow::ForIn(flow) => self.lower_for_in(flow, escape),
                Flow::ForRange(flow) => self.lower_for_range(flow, escape),
                Flow::Try(flow) => self.lower_try(flow, escape),
            }
        })
    }
}
