//! The lowering struct every generator hangs off.
//!
//! Expression, statement, chain, loop and try generators are `impl
//! IrLowerer` blocks in their own modules; mutual recursion between them is
//! plain method recursion through `&mut self`.

use ek9_tree::{ExprId, Span};

use crate::GenContext;

pub(crate) struct IrLowerer<'a> {
    pub(crate) ctx: GenContext<'a>,
}

impl<'a> IrLowerer<'a> {
    pub(crate) fn new(ctx: GenContext<'a>) -> Self {
        IrLowerer { ctx }
    }
}

impl IrLowerer<'_> {
    #[inline]
    pub(crate) fn span_of(&self, id: ExprId) -> Option<Span> {
        Some(self.ctx.expr(id).span)
    }
}
