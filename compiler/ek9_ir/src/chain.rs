//! The control-flow chain: one instruction for every conditional shape.
//!
//! `if`/`else if`/`else`, `switch`, `while`, `do`/`while`,
//! `try`/`catch`/`finally`, the null-safe `?` operator and guarded
//! assignment all become an ordered list of [`ConditionCase`]s plus an
//! optional default.
//!
//! # Execution
//!
//! - **Selection kinds** (everything except loops and try): cases are
//!   tried in order. The first case whose primitive is true runs its body
//!   and the rest are skipped. If none matches the default runs, if any.
//!   A matched body's `body_result` (or the default's `result`) becomes the
//!   chain `result`.
//! - **Loop kinds**: the single case is re-evaluated before each iteration
//!   (`WhileLoop`) or after each iteration (`DoWhileLoop`).
//! - **`TryCatchFinally`**: `try_block` runs; an exception escaping it runs
//!   the exception-handler case, whose body's `Reference` of the handler
//!   variable binds the caught exception (already owned: the thrower
//!   retained it). `finally` runs on every path.

use smallvec::SmallVec;

use ek9_tree::{Span, TypeId};

use crate::{Instr, ScopeId, Var};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ChainKind {
    IfElse,
    IfElseWithGuards,
    Switch,
    SwitchWithGuards,
    WhileLoop,
    DoWhileLoop,
    TryCatchFinally,
    GuardedAssignment,
    QuestionOperator,
}

impl ChainKind {
    #[inline]
    pub fn is_loop(self) -> bool {
        matches!(self, ChainKind::WhileLoop | ChainKind::DoWhileLoop)
    }

    pub fn label(self) -> &'static str {
        match self {
            ChainKind::IfElse => "IF_ELSE",
            ChainKind::IfElseWithGuards => "IF_ELSE_WITH_GUARDS",
            ChainKind::Switch => "SWITCH",
            ChainKind::SwitchWithGuards => "SWITCH_WITH_GUARDS",
            ChainKind::WhileLoop => "WHILE_LOOP",
            ChainKind::DoWhileLoop => "DO_WHILE_LOOP",
            ChainKind::TryCatchFinally => "TRY_CATCH_FINALLY",
            ChainKind::GuardedAssignment => "GUARDED_ASSIGNMENT",
            ChainKind::QuestionOperator => "QUESTION_OPERATOR",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum CaseKind {
    NullCheck,
    Expression,
    Literal,
    ExceptionHandler,
}

impl CaseKind {
    pub fn label(self) -> &'static str {
        match self {
            CaseKind::NullCheck => "NULL_CHECK",
            CaseKind::Expression => "EXPRESSION",
            CaseKind::Literal => "LITERAL",
            CaseKind::ExceptionHandler => "EXCEPTION_HANDLER",
        }
    }
}

/// Exception variable bound on entry to a handler case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ExceptionBinding {
    pub var: Var,
    pub ty: TypeId,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionCase {
    pub kind: CaseKind,
    pub case_scope: ScopeId,
    /// Produces `condition_result` and extracts `primitive`. Empty for
    /// exception handlers.
    pub condition: Vec<Instr>,
    /// Object-level boolean (`NullCheck` cases have none).
    pub condition_result: Option<Var>,
    /// Primitive boolean the backend branches on.
    pub primitive: Option<Var>,
    pub body: Vec<Instr>,
    pub body_result: Option<Var>,
    pub exception: Option<ExceptionBinding>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct DefaultCase {
    pub body: Vec<Instr>,
    pub result: Option<Var>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct TryBlock {
    pub scope: ScopeId,
    pub body: Vec<Instr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlFlowChain {
    pub kind: ChainKind,
    /// Value of an expression-form chain.
    pub result: Option<Var>,
    /// Guard variables, already bound before the chain.
    pub guard_variables: SmallVec<[Var; 1]>,
    /// Switch subject, evaluated once before the chain.
    pub evaluation: Option<Var>,
    /// Returning variable of an expression-form construct.
    pub return_variable: Option<Var>,
    pub try_block: Option<TryBlock>,
    pub cases: Vec<ConditionCase>,
    pub default: Option<DefaultCase>,
    pub finally: Option<Vec<Instr>>,
    pub scope: ScopeId,
    pub span: Option<Span>,
}

impl ControlFlowChain {
    pub fn new(kind: ChainKind, scope: ScopeId, span: Option<Span>) -> Self {
        ControlFlowChain {
            kind,
            result: None,
            guard_variables: SmallVec::new(),
            evaluation: None,
            return_variable: None,
            try_block: None,
            cases: Vec::new(),
            default: None,
            finally: None,
            scope,
            span,
        }
    }

    pub fn sequences(&self) -> Vec<&[Instr]> {
        let mut out: Vec<&[Instr]> = Vec::with_capacity(2 * self.cases.len() + 3);
        if let Some(try_block) = &self.try_block {
            out.push(&try_block.body);
        }
        for case in &self.cases {
            out.push(&case.condition);
            out.push(&case.body);
        }
        if let Some(default) = &self.default {
            out.push(&default.body);
        }
        if let Some(finally) = &self.finally {
            out.push(finally);
        }
        out
    }

    pub fn handler(&self) -> Option<&ConditionCase> {
        self.cases
            .iter()
            .find(|case| case.kind == CaseKind::ExceptionHandler)
    }
}
