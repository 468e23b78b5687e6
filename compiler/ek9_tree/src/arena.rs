//! Flat storage for the annotated tree.

use crate::ast::{Aggregate, Expr, Flow, Function, Stmt};
use crate::{AggregateId, ExprId, ExprRange, FlowId, FunctionId, StmtId, StmtRange};

/// Owns every node of one compiled module.
///
/// Read-only once semantic analysis hands it over, so a shared reference
/// can be given to any number of generator threads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    flows: Vec<Flow>,
    functions: Vec<Function>,
    aggregates: Vec<Aggregate>,
    expr_lists: Vec<ExprId>,
    stmt_lists: Vec<StmtId>,
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "a module with over 4 billion nodes is not representable"
)]
impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(self.stmts.len() as u32);
        self.stmts.push(stmt);
        id
    }

    pub fn alloc_flow(&mut self, flow: Flow) -> FlowId {
        let id = FlowId::new(self.flows.len() as u32);
        self.flows.push(flow);
        id
    }

    pub fn alloc_function(&mut self, function: Function) -> FunctionId {
        let id = FunctionId::new(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    pub fn alloc_aggregate(&mut self, aggregate: Aggregate) -> AggregateId {
        let id = AggregateId::new(self.aggregates.len() as u32);
        self.aggregates.push(aggregate);
        id
    }

    pub fn alloc_expr_list(&mut self, ids: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = self.expr_lists.len() as u32;
        self.expr_lists.extend(ids);
        ExprRange {
            start,
            len: self.expr_lists.len() as u32 - start,
        }
    }

    pub fn alloc_stmt_list(&mut self, ids: impl IntoIterator<Item = StmtId>) -> StmtRange {
        let start = self.stmt_lists.len() as u32;
        self.stmt_lists.extend(ids);
        StmtRange {
            start,
            len: self.stmt_lists.len() as u32 - start,
        }
    }
}

impl TreeArena {
    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn flow(&self, id: FlowId) -> &Flow {
        &self.flows[id.index()]
    }

    #[inline]
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }

    #[inline]
    pub fn aggregate(&self, id: AggregateId) -> &Aggregate {
        &self.aggregates[id.index()]
    }

    #[inline]
    pub fn expr_list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len()]
    }

    #[inline]
    pub fn stmt_list(&self, range: StmtRange) -> &[StmtId] {
        let start = range.start as usize;
        &self.stmt_lists[start..start + range.len()]
    }

    /// Every function in allocation order.
    pub fn function_ids(&self) -> impl ExactSizeIterator<Item = FunctionId> + '_ {
        (0..self.functions.len()).map(|i| FunctionId::new(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }
}
