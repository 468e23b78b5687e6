//! Function, method and constructor calls.

use smallvec::SmallVec;

use ek9_ir::{CallKind, Instr, Var};
use ek9_tree::{ExprId, ExprRange, MethodRef, Name, Span, TypeId};

use crate::calls::CallContext;
use crate::{GenResult, IrLowerer};

pub(super) type Arguments = SmallVec<[(Var, TypeId); 2]>;

impl IrLowerer<'_> {
    /// Evaluate each argument, left to right, into a managed temp.
    fn eval_arguments(&mut self, args: ExprRange) -> GenResult<(Vec<Instr>, Arguments)> {
        let mut out = Vec::new();
        let mut values = Arguments::new();
        let tree = self.ctx.tree;
        for &arg in tree.expr_list(args) {
            let (instrs, value, ty) = self.eval_managed(arg)?;
            out.extend(instrs);
            values.push((value, ty));
        }
        Ok((out, values))
    }

    /// `f(args)`: a static call of the function type's `_call`.
    pub(super) fn lower_function_call(
        &mut self,
        function: TypeId,
        args: ExprRange,
        method: Option<MethodRef>,
        dst: Var,
        span: Option<Span>,
    ) -> GenResult<Vec<Instr>> {
        let (mut out, arguments) = self.eval_arguments(args)?;
        let scope = self.ctx.current_scope()?;
        let mut cx = CallContext::new(
            CallKind::Static,
            None,
            function,
            self.ctx.names.call,
            scope,
            span,
        )
        .resolved(method);
        cx.arguments = arguments;
        out.extend(self.emit_call(cx, Some(dst))?.instrs);
        Ok(out)
    }

    /// `T(args)`. Manages its own result: the new instance is retained and
    /// registered right after construction.
    pub(super) fn lower_constructor(
        &mut self,
        owner: TypeId,
        args: ExprRange,
        method: Option<MethodRef>,
        dst: Var,
        span: Option<Span>,
    ) -> GenResult<Vec<Instr>> {
        let (mut out, arguments) = self.eval_arguments(args)?;
        let instance = self.construct(owner, arguments, method, dst, span)?;
        out.extend(instance);
        Ok(out)
    }

    /// Constructor call into `dst`, then retain + register `dst`.
    pub(crate) fn construct(
        &mut self,
        owner: TypeId,
        arguments: Arguments,
        method: Option<MethodRef>,
        dst: Var,
        span: Option<Span>,
    ) -> GenResult<Vec<Instr>> {
        let scope = self.ctx.current_scope()?;
        let type_name = self.ctx.types.name(owner);
        let mut cx = CallContext::new(CallKind::Constructor, None, owner, type_name, scope, span)
            .resolved(method);
        cx.arguments = arguments;
        self.managed(dst, span, |this| {
            let (instrs, _, _) = this.call_value(cx, Some(dst))?;
            Ok(instrs)
        })
    }

    /// `receiver.name(args)`.
    pub(super) fn lower_method_call(
        &mut self,
        receiver: ExprId,
        name: Name,
        args: ExprRange,
        method: Option<MethodRef>,
        dst: Var,
        span: Option<Span>,
    ) -> GenResult<Vec<Instr>> {
        let (mut out, target, target_type) = self.eval_managed(receiver)?;
        let (arg_instrs, arguments) = self.eval_arguments(args)?;
        out.extend(arg_instrs);

        let scope = self.ctx.current_scope()?;
        let mut cx = CallContext::new(
            CallKind::Call,
            Some(target),
            target_type,
            name,
            scope,
            span,
        )
        .resolved(method);
        cx.arguments = arguments;
        out.extend(self.emit_call(cx, Some(dst))?.instrs);
        Ok(out)
    }
}
