//! Annotated syntax tree nodes.
//!
//! Every node arrives from semantic analysis with its resolved type (and,
//! for call sites, optionally the resolved overload). The generator never
//! resolves names itself; a node still typed [`TypeId::UNRESOLVED`] is a
//! defect in an earlier phase.
//!
//! [`TypeId::UNRESOLVED`]: crate::TypeId::UNRESOLVED

mod expr;
mod flow;
mod item;
mod stmt;

pub use expr::{Callee, Expr, ExprKind, LogicalOp};
pub use flow::{
    CaseMatch, CatchClause, Flow, ForInFlow, ForRangeFlow, Guard, GuardOp, IfBranch, IfFlow,
    Resource, ReturningParam, SwitchCase, SwitchFlow, TryFlow, WhileFlow,
};
pub use item::{Aggregate, DefaultOperator, Function, Param, Property};
pub use stmt::{AssignOp, AssignTarget, Stmt, StmtKind};
