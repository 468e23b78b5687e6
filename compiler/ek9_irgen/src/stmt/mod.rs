//! Statement generator.
//!
//! Statements lower into the current scope; only blocks open one. Named
//! variables follow one pattern: `REFERENCE` declares the slot, the value
//! is stored, and the variable itself is retained and registered so the
//! declaring scope releases whatever it holds at exit. Assignment never
//! re-registers: it releases the old value and retains the new one.
//! Properties assign the same way; their object owns what they hold.

use ek9_ir::{Instr, ScopeId, Var};
use ek9_stack::ensure_sufficient_stack;
use ek9_tree::ast::{AssignOp, AssignTarget, StmtKind};
use ek9_tree::{ExprId, MethodRef, Name, Span, StmtId, StmtRange, TypeId};

use crate::calls::operators;
use crate::context::FrameKind;
use crate::memory::rebind;
use crate::{GenFault, GenResult, IrLowerer};

impl IrLowerer<'_> {
    pub(crate) fn lower_stmt(&mut self, id: StmtId) -> GenResult<Vec<Instr>> {
        ensure_sufficient_stack(|| self.lower_stmt_inner(id))
    }

    fn lower_stmt_inner(&mut self, id: StmtId) -> GenResult<Vec<Instr>> {
        let tree = self.ctx.tree;
        let stmt = tree.stmt(id);
        let span = Some(stmt.span);

        match stmt.kind {
            StmtKind::VarDecl { name, ty, init } => {
                let ty = self.ctx.declared_type(ty, stmt.span)?;
                self.declare_variable(Var::Named(name), ty, init, span)
            }
            StmtKind::VarOnly { name, ty } => {
                let ty = self.ctx.declared_type(ty, stmt.span)?;
                let scope = self.ctx.current_scope()?;
                let var = Var::Named(name);
                Ok(vec![
                    Instr::reference(var, ty, span),
                    Instr::register(var, scope, span),
                ])
            }
            StmtKind::Assign {
                op,
                target,
                ty,
                value,
                method,
            } => {
                let target = match target {
                    AssignTarget::Variable(name) => Var::Named(name),
                    AssignTarget::Property { object, field } => Var::field(object, field),
                };
                match op {
                    AssignOp::Assign | AssignOp::Blind => self.assign_variable(target, value, span),
                    AssignOp::IfUnset => {
                        let ty = self.ctx.declared_type(ty, stmt.span)?;
                        self.guarded_assignment(target, ty, value, span)
                    }
                    AssignOp::Compound(op) => {
                        let ty = self.ctx.declared_type(ty, stmt.span)?;
                        self.compound_assignment(op, target, ty, value, method, stmt.span)
                    }
                }
            }
            StmtKind::Expr(expr) => {
                let dst = self.ctx.temp();
                self.lower_expr_managed(expr, dst)
            }
            StmtKind::Throw(expr) => {
                let (mut out, value, _) = self.eval_managed(expr)?;
                out.push(Instr::retain(value, span));
                out.push(Instr::throw(value, span));
                Ok(out)
            }
            StmtKind::Block(body) => self.lower_block(body, FrameKind::Block, span),
            StmtKind::Flow(flow) => self.lower_flow(flow, None),
        }
    }

    /// Lower `range` into the current scope.
    pub(crate) fn lower_statements(&mut self, range: StmtRange) -> GenResult<Vec<Instr>> {
        let tree = self.ctx.tree;
        let mut out = Vec::new();
        for &stmt in tree.stmt_list(range) {
            out.extend(self.lower_stmt(stmt)?);
        }
        Ok(out)
    }

    /// Lower `range` inside a scope of its own.
    pub(crate) fn lower_block(
        &mut self,
        range: StmtRange,
        kind: FrameKind,
        span: Option<Span>,
    ) -> GenResult<Vec<Instr>> {
        self.scoped(kind, span, |this, _| this.lower_statements(range))
    }

    /// [`lower_block`](Self::lower_block), also returning the scope it
    /// opened.
    pub(crate) fn lower_scoped_block(
        &mut self,
        range: StmtRange,
        kind: FrameKind,
        span: Option<Span>,
    ) -> GenResult<(ScopeId, Vec<Instr>)> {
        let (scope, out, ()) =
            self.in_scope(kind, span, |this, _| Ok((this.lower_statements(range)?, ())))?;
        Ok((scope, out))
    }

    /// `var <- init`: declare, store, retain, register to the current
    /// scope.
    pub(crate) fn declare_variable(
        &mut self,
        var: Var,
        ty: TypeId,
        init: ExprId,
        span: Option<Span>,
    ) -> GenResult<Vec<Instr>> {
        let scope = self.ctx.current_scope()?;
        let mut out = vec![Instr::reference(var, ty, span)];
        let (instrs, value, _) = self.eval_managed(init)?;
        out.extend(instrs);
        out.push(Instr::store(var, value, span));
        out.push(Instr::retain(var, span));
        out.push(Instr::register(var, scope, span));
        Ok(out)
    }

    /// `var := value`: release the old value, store, retain the new one.
    pub(crate) fn assign_variable(
        &mut self,
        var: Var,
        value: ExprId,
        span: Option<Span>,
    ) -> GenResult<Vec<Instr>> {
        let (mut out, assigned, _) = self.eval_managed(value)?;
        rebind(var, assigned, span, &mut out);
        Ok(out)
    }

    /// `var += value` and friends: a mutating operator call on the
    /// current value of `var`.
    fn compound_assignment(
        &mut self,
        op: Name,
        target: Var,
        ty: TypeId,
        value: ExprId,
        method: Option<MethodRef>,
        span: Span,
    ) -> GenResult<Vec<Instr>> {
        let at = Some(span);
        let info = operators::binary(self.ctx.text(op)).ok_or_else(|| {
            GenFault::UnknownOperator {
                op: self.ctx.text(op).to_owned(),
                span,
            }
            .logged()
        })?;

        let current = self.ctx.temp();
        let mut out = vec![Instr::load(current, target, at)];
        self.manage(current, at, &mut out)?;
        let (value_instrs, argument, argument_type) = self.eval_managed(value)?;
        out.extend(value_instrs);

        let method_name = self.ctx.interner.intern(info.method);
        let cx = self
            .operator_context(current, ty, method_name, at)?
            .argument(argument, argument_type)
            .resolved(method);
        let emitted = self.emit_call(cx, None)?;
        if emitted.result.is_some() {
            return Err(GenFault::malformed(
                format!(
                    "compound assignment `{}` on `{}` must not produce a value",
                    info.op,
                    self.ctx.type_label(ty)
                ),
                span,
            ));
        }
        out.extend(emitted.instrs);
        Ok(out)
    }
}
