//! Internal consistency faults.
//!
//! Semantic analysis reports user errors before generation starts, so every
//! fault here means an earlier phase handed over an incomplete tree or the
//! generator met a construct it does not cover. Faults are not recoverable:
//! the current unit is abandoned and nothing partial is returned.

use ek9_ir::{ScopeId, VerifyError};
use ek9_tree::Span;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GenFault {
    #[error("{what} at {span:?} has no resolved type")]
    Unresolved { what: &'static str, span: Span },

    #[error("no scope is active")]
    EmptyScopeStack,

    #[error("{scope} has no enclosing scope")]
    NoParentScope { scope: ScopeId },

    #[error("exiting {found} while {expected:?} is the innermost scope")]
    ScopeMismatch {
        expected: Option<ScopeId>,
        found: ScopeId,
    },

    #[error("{construct} not yet implemented")]
    NotImplemented { construct: &'static str, span: Span },

    #[error("unknown operator `{op}`")]
    UnknownOperator { op: String, span: Span },

    #[error("`{ty}` has no method `{method}` accepting ({args})")]
    UnknownMethod {
        ty: String,
        method: String,
        args: String,
        span: Option<Span>,
    },

    #[error("call to `{method}` on `{ty}` is ambiguous")]
    AmbiguousCall {
        ty: String,
        method: String,
        span: Option<Span>,
    },

    #[error("cannot promote `{from}` to `{to}`")]
    PromotionMismatch {
        from: String,
        to: String,
        span: Option<Span>,
    },

    #[error("{message}")]
    Malformed { message: String, span: Span },

    #[error("generated IR failed verification: {0}")]
    Verification(#[from] VerifyError),
}

pub type GenResult<T> = Result<T, GenFault>;

impl GenFault {
    /// Log at `debug` and hand the fault back for returning.
    #[must_use]
    pub(crate) fn logged(self) -> Self {
        tracing::debug!(fault = %self, "generation fault");
        self
    }

    pub(crate) fn unresolved(what: &'static str, span: Span) -> Self {
        GenFault::Unresolved { what, span }.logged()
    }

    pub(crate) fn not_implemented(construct: &'static str, span: Span) -> Self {
        GenFault::NotImplemented { construct, span }.logged()
    }

    pub(crate) fn malformed(message: impl Into<String>, span: Span) -> Self {
        GenFault::Malformed {
            message: message.into(),
            span,
        }
        .logged()
    }
}
