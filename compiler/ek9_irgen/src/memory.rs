//! Retain + scope-register bookkeeping.
//!
//! A value produced by a literal, a call or a load becomes owned by the
//! innermost scope: `RETAIN v` then `SCOPE_REGISTER v, scope`. The scope's
//! exit releases it. Primitive booleans, `this`/`super` loads and values
//! handed on by `THROW`/`RETURN` are not managed here.

use ek9_ir::{Instr, ScopeId, Var};
use ek9_tree::Span;

use crate::{GenResult, IrLowerer};

impl IrLowerer<'_> {
    /// Retain `var` and register it to the current scope.
    pub(crate) fn manage(
        &self,
        var: Var,
        span: Option<Span>,
        out: &mut Vec<Instr>,
    ) -> GenResult<()> {
        let scope = self.ctx.current_scope()?;
        manage_in(var, scope, span, out);
        Ok(())
    }

    /// Run `supplier`, then manage `var`, which it must have written.
    pub(crate) fn managed(
        &mut self,
        var: Var,
        span: Option<Span>,
        supplier: impl FnOnce(&mut Self) -> GenResult<Vec<Instr>>,
    ) -> GenResult<Vec<Instr>> {
        let mut out = supplier(self)?;
        self.manage(var, span, &mut out)?;
        Ok(out)
    }
}

/// Retain `var` and register it to `scope`.
pub(crate) fn manage_in(var: Var, scope: ScopeId, span: Option<Span>, out: &mut Vec<Instr>) {
    out.push(Instr::retain(var, span));
    out.push(Instr::register(var, scope, span));
}

/// Point `target` at `value`: release the old value (a no-op when null),
/// store, retain the new one. `target` keeps whatever scope registration
/// it already has.
pub(crate) fn rebind(target: Var, value: Var, span: Option<Span>, out: &mut Vec<Instr>) {
    out.push(Instr::release(target, span));
    out.push(Instr::store(target, value, span));
    out.push(Instr::retain(target, span));
}
