//! Control-flow constructs.
//!
//! These carry vectors so they live in their own arena and are referenced
//! from statements and expressions through a [`FlowId`](crate::FlowId).

use smallvec::SmallVec;

use crate::{ExprId, MethodRef, Name, Span, StmtRange, TypeId};

/// Operator binding a guard variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum GuardOp {
    /// `<-`, declares a new variable.
    Declare,
    /// `?=`, declares and binds only a usable value.
    GuardAssign,
    /// `:=?`, assigns an existing variable when it is unset.
    IfUnset,
    /// `:=`, plain assignment to an existing variable.
    Assign,
    /// `=`, blind assignment.
    Blind,
}

impl GuardOp {
    /// Whether the bound value must be checked (null, then `_isSet`) before
    /// the guarded construct runs.
    #[inline]
    pub const fn requires_check(self) -> bool {
        matches!(
            self,
            GuardOp::Declare | GuardOp::GuardAssign | GuardOp::IfUnset
        )
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            GuardOp::Declare => "<-",
            GuardOp::GuardAssign => "?=",
            GuardOp::IfUnset => ":=?",
            GuardOp::Assign => ":=",
            GuardOp::Blind => "=",
        }
    }
}

/// Variable bound immediately before a control-flow construct.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Guard {
    pub op: GuardOp,
    pub name: Name,
    pub ty: TypeId,
    pub value: ExprId,
    pub span: Span,
}

/// The `<- rtn as T: init` variable of an expression-form construct.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ReturningParam {
    pub name: Name,
    pub ty: TypeId,
    pub init: Option<ExprId>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct IfBranch {
    pub guard: Option<Guard>,
    pub condition: Option<ExprId>,
    pub body: StmtRange,
    pub span: Span,
}

/// `if` / `else if` / `else`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct IfFlow {
    pub branches: SmallVec<[IfBranch; 2]>,
    pub else_body: Option<StmtRange>,
    pub span: Span,
}

/// One comparison inside a `case`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct CaseMatch {
    /// Comparison operator text; `None` means `==`.
    pub op: Option<Name>,
    pub value: ExprId,
    pub method: Option<MethodRef>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct SwitchCase {
    /// Alternatives joined with `or`.
    pub matches: SmallVec<[CaseMatch; 2]>,
    pub body: StmtRange,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct SwitchFlow {
    pub guard: Option<Guard>,
    pub subject: ExprId,
    pub cases: Vec<SwitchCase>,
    pub default: Option<StmtRange>,
    pub returning: Option<ReturningParam>,
    pub span: Span,
}

/// `while` and `do ... while`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct WhileFlow {
    pub do_while: bool,
    pub guard: Option<Guard>,
    pub condition: Option<ExprId>,
    pub body: StmtRange,
    pub returning: Option<ReturningParam>,
    pub span: Span,
}

/// `for item in collection`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ForInFlow {
    pub guard: Option<Guard>,
    pub var: Name,
    pub var_ty: TypeId,
    pub source: ExprId,
    pub body: StmtRange,
    pub returning: Option<ReturningParam>,
    pub span: Span,
}

/// `for i in start ... end by step`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ForRangeFlow {
    pub guard: Option<Guard>,
    pub var: Name,
    pub start: ExprId,
    pub end: ExprId,
    pub by: Option<ExprId>,
    pub body: StmtRange,
    pub returning: Option<ReturningParam>,
    pub span: Span,
}

/// Resource declared in a `try` header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Resource {
    pub name: Name,
    pub ty: TypeId,
    pub init: ExprId,
    pub span: Span,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct CatchClause {
    pub name: Name,
    pub ty: TypeId,
    pub body: StmtRange,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct TryFlow {
    pub guard: Option<Guard>,
    pub resources: SmallVec<[Resource; 2]>,
    pub body: StmtRange,
    pub catches: SmallVec<[CatchClause; 1]>,
    pub finally: Option<StmtRange>,
    pub returning: Option<ReturningParam>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Flow {
    If(IfFlow),
    Switch(SwitchFlow),
    While(WhileFlow),
    ForIn(ForInFlow),
    ForRange(ForRangeFlow),
    Try(TryFlow),
}

impl Flow {
    pub fn span(&self) -> Span {
        match self {
            Flow::If(f) => f.span,
            Flow::Switch(f) => f.span,
            Flow::While(f) => f.span,
            Flow::ForIn(f) => f.span,
            Flow::ForRange(f) => f.span,
            Flow::Try(f) => f.span,
        }
    }

    /// Returning variable of the expression form, if any.
    pub fn returning(&self) -> Option<&ReturningParam> {
        match self {
            Flow::If(_) => None,
            Flow::Switch(f) => f.returning.as_ref(),
            Flow::While(f) => f.returning.as_ref(),
            Flow::ForIn(f) => f.returning.as_ref(),
            Flow::ForRange(f) => f.returning.as_ref(),
            Flow::Try(f) => f.returning.as_ref(),
        }
    }
}
