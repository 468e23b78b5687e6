use crate::{ExprId, FlowId, MethodRef, Name, Span, StmtRange, TypeId};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

/// Assignment operator of an assignment statement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum AssignOp {
    /// `:=` and `:`.
    Assign,
    /// `=`.
    Blind,
    /// `:=?`, assign only when the target is null or unset.
    IfUnset,
    /// `+=`, `-=`, `:^:`, `:~:` and friends; the operator text.
    Compound(Name),
}

/// What an assignment writes to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum AssignTarget {
    Variable(Name),
    /// `object.field`, where `object` is `this` or a named variable.
    Property { object: Name, field: Name },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum StmtKind {
    /// `name <- init`.
    VarDecl {
        name: Name,
        ty: TypeId,
        init: ExprId,
    },
    /// `name as T?`.
    VarOnly { name: Name, ty: TypeId },
    Assign {
        op: AssignOp,
        target: AssignTarget,
        /// Resolved type of the target.
        ty: TypeId,
        value: ExprId,
        /// Pre-resolved operator overload for compound assignment.
        method: Option<MethodRef>,
    },
    /// Expression evaluated for its effect, normally a call.
    Expr(ExprId),
    Throw(ExprId),
    /// Nested block with its own scope.
    Block(StmtRange),
    /// Statement-form control flow.
    Flow(FlowId),
}
