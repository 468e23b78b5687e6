//! Convenience construction of annotated trees.
//!
//! Semantic analysis (or a test) states every resolved type explicitly;
//! the builder only takes care of arena bookkeeping and hands out a fresh
//! span per node so instructions can be traced back to their source node.
//! An [`anchored`](TreeBuilder::anchored) builder gives every node the same
//! span instead, for code the compiler writes on behalf of a declaration.

use crate::ast::{
    Aggregate, AssignOp, AssignTarget, Callee, CaseMatch, DefaultOperator, Expr, ExprKind, Flow,
    Function, Guard, GuardOp, LogicalOp, Param, Property, ReturningParam, Stmt, StmtKind,
};
use crate::{
    AggregateId, ExprId, FlowId, FunctionId, MethodRef, Name, Span, StmtId, StmtRange,
    StringInterner, TreeArena, TypeId,
};

pub struct TreeBuilder<'i> {
    arena: TreeArena,
    interner: &'i StringInterner,
    cursor: u32,
    anchor: Option<Span>,
}

impl<'i> TreeBuilder<'i> {
    pub fn new(interner: &'i StringInterner) -> Self {
        TreeBuilder {
            arena: TreeArena::new(),
            interner,
            cursor: 1,
            anchor: None,
        }
    }

    /// A builder whose nodes all carry `span`.
    pub fn anchored(interner: &'i StringInterner, span: Span) -> Self {
        TreeBuilder {
            anchor: Some(span),
            ..Self::new(interner)
        }
    }

    pub fn finish(self) -> TreeArena {
        self.arena
    }

    pub fn arena(&self) -> &TreeArena {
        &self.arena
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    fn next_span(&mut self) -> Span {
        if let Some(span) = self.anchor {
            return span;
        }
        let start = self.cursor;
        self.cursor += 2;
        Span::new(start, start + 1)
    }

    fn expr(&mut self, kind: ExprKind, ty: TypeId) -> ExprId {
        let span = self.next_span();
        self.arena.alloc_expr(Expr::new(kind, ty, span))
    }

    fn stmt(&mut self, kind: StmtKind) -> StmtId {
        let span = self.next_span();
        self.arena.alloc_stmt(Stmt::new(kind, span))
    }

    // ── Expressions ─────────────────────────────────────────────────

    pub fn literal(&mut self, text: &str, ty: TypeId) -> ExprId {
        let text = self.name(text);
        self.expr(ExprKind::Literal(text), ty)
    }

    pub fn int(&mut self, value: i64) -> ExprId {
        self.literal(&value.to_string(), TypeId::INTEGER)
    }

    pub fn string(&mut self, value: &str) -> ExprId {
        self.literal(&format!("\"{value}\""), TypeId::STRING)
    }

    pub fn boolean(&mut self, value: bool) -> ExprId {
        self.literal(if value { "true" } else { "false" }, TypeId::BOOLEAN)
    }

    pub fn ident(&mut self, name: &str, ty: TypeId) -> ExprId {
        let name = self.name(name);
        self.expr(ExprKind::Ident(name), ty)
    }

    pub fn this(&mut self, ty: TypeId) -> ExprId {
        self.expr(ExprKind::This, ty)
    }

    pub fn super_ref(&mut self, ty: TypeId) -> ExprId {
        self.expr(ExprKind::Super, ty)
    }

    /// `object.name` of type `ty`.
    pub fn property(&mut self, object: ExprId, name: &str, ty: TypeId) -> ExprId {
        let name = self.name(name);
        self.expr(ExprKind::Property { object, name }, ty)
    }

    pub fn paren(&mut self, inner: ExprId) -> ExprId {
        let ty = self.arena.expr(inner).ty;
        self.expr(ExprKind::Paren(inner), ty)
    }

    pub fn unary(&mut self, op: &str, operand: ExprId, ty: TypeId) -> ExprId {
        let op = self.name(op);
        self.expr(
            ExprKind::Unary {
                op,
                operand,
                method: None,
            },
            ty,
        )
    }

    pub fn binary(&mut self, op: &str, left: ExprId, right: ExprId, ty: TypeId) -> ExprId {
        self.binary_resolved(op, left, right, ty, None)
    }

    pub fn binary_resolved(
        &mut self,
        op: &str,
        left: ExprId,
        right: ExprId,
        ty: TypeId,
        method: Option<MethodRef>,
    ) -> ExprId {
        let op = self.name(op);
        self.expr(
            ExprKind::Binary {
                op,
                left,
                right,
                method,
            },
            ty,
        )
    }

    pub fn and(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.expr(
            ExprKind::Logical {
                op: LogicalOp::And,
                left,
                right,
            },
            TypeId::BOOLEAN,
        )
    }

    pub fn or(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.expr(
            ExprKind::Logical {
                op: LogicalOp::Or,
                left,
                right,
            },
            TypeId::BOOLEAN,
        )
    }

    pub fn question(&mut self, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Question(operand), TypeId::BOOLEAN)
    }

    pub fn call_function(&mut self, function: TypeId, args: &[ExprId], ty: TypeId) -> ExprId {
        let args = self.arena.alloc_expr_list(args.iter().copied());
        self.expr(
            ExprKind::Call {
                callee: Callee::Function(function),
                args,
                method: None,
            },
            ty,
        )
    }

    pub fn construct(&mut self, ty: TypeId, args: &[ExprId]) -> ExprId {
        let args = self.arena.alloc_expr_list(args.iter().copied());
        self.expr(
            ExprKind::Call {
                callee: Callee::Constructor(ty),
                args,
                method: None,
            },
            ty,
        )
    }

    pub fn method_call(
        &mut self,
        receiver: ExprId,
        name: &str,
        args: &[ExprId],
        ty: TypeId,
    ) -> ExprId {
        let name = self.name(name);
        let args = self.arena.alloc_expr_list(args.iter().copied());
        self.expr(
            ExprKind::MethodCall {
                receiver,
                name,
                args,
                method: None,
            },
            ty,
        )
    }

    pub fn list(&mut self, elements: &[ExprId], list_ty: TypeId) -> ExprId {
        let elements = self.arena.alloc_expr_list(elements.iter().copied());
        self.expr(ExprKind::List(elements), list_ty)
    }

    pub fn dict(&mut self, pairs: &[ExprId], dict_ty: TypeId) -> ExprId {
        let pairs = self.arena.alloc_expr_list(pairs.iter().copied());
        self.expr(ExprKind::Dict(pairs), dict_ty)
    }

    pub fn coalescing(&mut self, op: &str, left: ExprId, right: ExprId, ty: TypeId) -> ExprId {
        let op = self.name(op);
        self.expr(ExprKind::Coalescing { op, left, right }, ty)
    }

    pub fn dynamic_function(&mut self, ty: TypeId) -> ExprId {
        self.expr(ExprKind::DynamicFunction, ty)
    }

    pub fn stream(&mut self, source: ExprId, ty: TypeId) -> ExprId {
        self.expr(ExprKind::Stream(source), ty)
    }

    /// Expression-form control flow; `ty` is the returning variable's type.
    pub fn flow_expr(&mut self, flow: Flow, ty: TypeId) -> ExprId {
        let flow = self.arena.alloc_flow(flow);
        self.expr(ExprKind::Flow(flow), ty)
    }

    // ── Statements ──────────────────────────────────────────────────

    pub fn var_decl(&mut self, name: &str, ty: TypeId, init: ExprId) -> StmtId {
        let name = self.name(name);
        self.stmt(StmtKind::VarDecl { name, ty, init })
    }

    pub fn var_only(&mut self, name: &str, ty: TypeId) -> StmtId {
        let name = self.name(name);
        self.stmt(StmtKind::VarOnly { name, ty })
    }

    pub fn assign(&mut self, op: AssignOp, target: &str, ty: TypeId, value: ExprId) -> StmtId {
        let target = AssignTarget::Variable(self.name(target));
        self.assign_to(op, target, ty, value)
    }

    /// `object.field op value`.
    pub fn assign_property(
        &mut self,
        op: AssignOp,
        object: &str,
        field: &str,
        ty: TypeId,
        value: ExprId,
    ) -> StmtId {
        let target = AssignTarget::Property {
            object: self.name(object),
            field: self.name(field),
        };
        self.assign_to(op, target, ty, value)
    }

    fn assign_to(&mut self, op: AssignOp, target: AssignTarget, ty: TypeId, value: ExprId) -> StmtId {
        self.stmt(StmtKind::Assign {
            op,
            target,
            ty,
            value,
            method: None,
        })
    }

    /// `target op= value`, e.g. `compound("+=", "total", ..)`.
    pub fn compound(&mut self, op: &str, target: &str, ty: TypeId, value: ExprId) -> StmtId {
        let op = self.name(op);
        self.assign(AssignOp::Compound(op), target, ty, value)
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn throw(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Throw(expr))
    }

    pub fn block(&mut self, stmts: &[StmtId]) -> StmtId {
        let body = self.body(stmts);
        self.stmt(StmtKind::Block(body))
    }

    pub fn flow_stmt(&mut self, flow: Flow) -> StmtId {
        let flow = self.arena.alloc_flow(flow);
        self.stmt(StmtKind::Flow(flow))
    }

    pub fn alloc_flow(&mut self, flow: Flow) -> FlowId {
        self.arena.alloc_flow(flow)
    }

    pub fn body(&mut self, stmts: &[StmtId]) -> StmtRange {
        self.arena.alloc_stmt_list(stmts.iter().copied())
    }

    // ── Flow parts ──────────────────────────────────────────────────

    pub fn guard(&mut self, op: GuardOp, name: &str, ty: TypeId, value: ExprId) -> Guard {
        Guard {
            op,
            name: self.name(name),
            ty,
            value,
            span: self.next_span(),
        }
    }

    pub fn returning(&mut self, name: &str, ty: TypeId, init: Option<ExprId>) -> ReturningParam {
        ReturningParam {
            name: self.name(name),
            ty,
            init,
            span: self.next_span(),
        }
    }

    /// `==` comparison against `value`.
    pub fn case_eq(&mut self, value: ExprId) -> CaseMatch {
        CaseMatch {
            op: None,
            value,
            method: None,
            span: self.next_span(),
        }
    }

    /// Comparison with an explicit operator, e.g. `case < 12`.
    pub fn case_op(&mut self, op: &str, value: ExprId) -> CaseMatch {
        CaseMatch {
            op: Some(self.name(op)),
            value,
            method: None,
            span: self.next_span(),
        }
    }

    pub fn span(&mut self) -> Span {
        self.next_span()
    }

    // ── Items ───────────────────────────────────────────────────────

    pub fn function(
        &mut self,
        name: &str,
        params: &[(&str, TypeId)],
        returning: Option<ReturningParam>,
        body: &[StmtId],
    ) -> FunctionId {
        let params = params
            .iter()
            .map(|&(name, ty)| Param {
                name: self.name(name),
                ty,
            })
            .collect();
        let body = self.body(body);
        let function = Function {
            name: self.name(name),
            params,
            returning,
            body,
            span: self.next_span(),
        };
        self.arena.alloc_function(function)
    }

    pub fn property_decl(&mut self, name: &str, ty: TypeId, init: Option<ExprId>) -> Property {
        Property {
            name: self.name(name),
            ty,
            init,
            span: self.next_span(),
        }
    }

    /// Class or record `ty`; its name is the type's declared name.
    pub fn aggregate(
        &mut self,
        ty: TypeId,
        properties: Vec<Property>,
        methods: &[FunctionId],
        defaults: &[DefaultOperator],
    ) -> AggregateId {
        let aggregate = Aggregate {
            ty,
            properties,
            methods: methods.to_vec(),
            defaults: defaults.to_vec(),
            span: self.next_span(),
        };
        self.arena.alloc_aggregate(aggregate)
    }
}
