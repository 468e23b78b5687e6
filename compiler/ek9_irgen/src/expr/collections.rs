//! Collection literals.

use ek9_ir::{Instr, Var};
use ek9_tree::{ExprRange, Span, TypeId};

use super::calls::Arguments;
use crate::{GenResult, IrLowerer};

impl IrLowerer<'_> {
    /// `[a, b, c]`: construct an empty list, manage it, then for each
    /// element evaluate it managed and call the mutating `_addAss`. The
    /// list and its element temps share the current scope.
    pub(super) fn lower_list(
        &mut self,
        elements: ExprRange,
        list_ty: TypeId,
        dst: Var,
        span: Option<Span>,
    ) -> GenResult<Vec<Instr>> {
        let mut out = self.construct(list_ty, Arguments::new(), None, dst, span)?;
        let tree = self.ctx.tree;
        for &element in tree.expr_list(elements) {
            let (instrs, value, ty) = self.eval_managed(element)?;
            out.extend(instrs);
            let cx = self
                .operator_context(dst, list_ty, self.ctx.names.add_assign, span)?
                .argument(value, ty);
            out.extend(self.emit_call(cx, None)?.instrs);
        }
        Ok(out)
    }
}
