use crate::{ExprId, ExprRange, FlowId, MethodRef, Name, Span, TypeId};

/// Expression node.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Expr {
    pub kind: ExprKind,
    /// Resolved type of the value this expression produces.
    pub ty: TypeId,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: TypeId, span: Span) -> Self {
        Expr { kind, ty, span }
    }
}

/// Short-circuit logical operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum LogicalOp {
    And,
    Or,
}

/// What a call expression invokes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Callee {
    /// A function type; invoked through its `_call` method.
    Function(TypeId),
    /// Construction of a new instance of the type.
    Constructor(TypeId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprKind {
    /// Literal source text, e.g. `42`, `"hi"`, `true`, `3.5`.
    Literal(Name),
    /// Variable, parameter or returning-variable reference.
    Ident(Name),
    This,
    Super,
    /// `object.name`; the object is `this`, `super` or a named variable.
    Property { object: ExprId, name: Name },
    Paren(ExprId),
    /// Prefix or postfix operator (`-x`, `not b`, `#?x`, `abs x`).
    Unary {
        op: Name,
        operand: ExprId,
        method: Option<MethodRef>,
    },
    /// Infix operator other than `and`/`or`.
    Binary {
        op: Name,
        left: ExprId,
        right: ExprId,
        method: Option<MethodRef>,
    },
    /// `and` / `or` with short-circuit evaluation.
    Logical {
        op: LogicalOp,
        left: ExprId,
        right: ExprId,
    },
    /// Null-safe `x?`: false for null, otherwise `x._isSet()`.
    Question(ExprId),
    Call {
        callee: Callee,
        args: ExprRange,
        method: Option<MethodRef>,
    },
    /// `receiver.name(args)`.
    MethodCall {
        receiver: ExprId,
        name: Name,
        args: ExprRange,
        method: Option<MethodRef>,
    },
    /// `[a, b, c]`; the expression type is the list type.
    List(ExprRange),
    /// `{k: v, ...}`; keys and values interleaved.
    Dict(ExprRange),
    /// `??`, `?:`, `<?`, `<=?`, `>?`, `>=?`.
    Coalescing {
        op: Name,
        left: ExprId,
        right: ExprId,
    },
    /// Nested dynamic function declaration.
    DynamicFunction,
    /// `cat x | ...` pipeline rooted at the source expression.
    Stream(ExprId),
    /// Expression-form control flow producing its returning variable.
    Flow(FlowId),
}
