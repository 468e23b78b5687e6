//! The instruction model.
//!
//! A function body lowers to a `Vec<Instr>`. Control flow does not use
//! labels or jumps: the three structured instructions (`Logical`,
//! `ControlFlowChain`, `ForRange`) own nested instruction sequences, so a
//! backend can emit either bytecode branches or SSA blocks from the same
//! tree.

use smallvec::SmallVec;

use ek9_tree::{Name, Span, TypeId};
use ek9_types::SideEffects;

use crate::{ControlFlowChain, ForRangePolymorphic, LogicalBlock, ScopeId, Var};

// ── Calls ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum CallKind {
    /// Method call on a receiver.
    Call,
    /// Function call; no receiver.
    Static,
    Constructor,
    /// Operator method on a receiver (`_add`, `_true`, `_isSet` ...).
    Operator,
}

/// Metadata optimizers read off a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct CallMeta {
    pub pure: bool,
    pub complexity: u32,
    pub effects: SideEffects,
}

impl CallMeta {
    pub fn new(effects: SideEffects, complexity: u32) -> Self {
        CallMeta {
            pure: effects.is_pure(),
            complexity,
            effects,
        }
    }
}

/// Fully resolved call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct CallDetails {
    /// Receiver; `None` for static and constructor calls.
    pub target: Option<Var>,
    pub target_type: TypeId,
    pub method: Name,
    pub parameter_types: SmallVec<[TypeId; 2]>,
    pub return_type: TypeId,
    pub arguments: SmallVec<[Var; 2]>,
    pub meta: CallMeta,
    /// Receiver is trait-typed and needs interface dispatch.
    pub trait_call: bool,
}

impl CallDetails {
    #[inline]
    pub fn returns_void(&self) -> bool {
        self.return_type.is_void()
    }
}

// ── Instructions ────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum InstrKind {
    /// Declare `var` of `ty`, initially null.
    Reference { var: Var, ty: TypeId },
    /// `dst = src`, copying the reference.
    Load { dst: Var, src: Var },
    /// `dst = src` into a declared variable.
    Store { dst: Var, src: Var },
    Retain { var: Var },
    /// No-op when `var` is null.
    Release { var: Var },
    /// `dst` (primitive boolean) = `var` is null.
    IsNull { dst: Var, var: Var },

    ScopeEnter { scope: ScopeId },
    /// Releases everything registered to `scope`, newest first.
    ScopeExit { scope: ScopeId },
    ScopeRegister { var: Var, scope: ScopeId },

    /// Void calls have no destination.
    Call {
        dst: Option<Var>,
        kind: CallKind,
        details: Box<CallDetails>,
    },
    /// `dst` = literal `text` of `ty`.
    Literal { dst: Var, text: Name, ty: TypeId },

    Return { value: Option<Var> },
    /// Abort with `message` unless the primitive `condition` holds.
    Assert { condition: Var, message: Box<str> },
    Throw { value: Var },

    Logical(Box<LogicalBlock>),
    ControlFlowChain(Box<ControlFlowChain>),
    ForRange(Box<ForRangePolymorphic>),
}

/// One instruction plus optional debug position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Instr {
    pub kind: InstrKind,
    pub span: Option<Span>,
}

impl Instr {
    #[inline]
    pub fn new(kind: InstrKind, span: Option<Span>) -> Self {
        Instr { kind, span }
    }

    pub fn reference(var: Var, ty: TypeId, span: Option<Span>) -> Self {
        Self::new(InstrKind::Reference { var, ty }, span)
    }

    pub fn load(dst: Var, src: Var, span: Option<Span>) -> Self {
        Self::new(InstrKind::Load { dst, src }, span)
    }

    pub fn store(dst: Var, src: Var, span: Option<Span>) -> Self {
        Self::new(InstrKind::Store { dst, src }, span)
    }

    pub fn retain(var: Var, span: Option<Span>) -> Self {
        Self::new(InstrKind::Retain { var }, span)
    }

    pub fn release(var: Var, span: Option<Span>) -> Self {
        Self::new(InstrKind::Release { var }, span)
    }

    pub fn is_null(dst: Var, var: Var, span: Option<Span>) -> Self {
        Self::new(InstrKind::IsNull { dst, var }, span)
    }

    pub fn enter(scope: ScopeId, span: Option<Span>) -> Self {
        Self::new(InstrKind::ScopeEnter { scope }, span)
    }

    pub fn exit(scope: ScopeId, span: Option<Span>) -> Self {
        Self::new(InstrKind::ScopeExit { scope }, span)
    }

    pub fn register(var: Var, scope: ScopeId, span: Option<Span>) -> Self {
        Self::new(InstrKind::ScopeRegister { var, scope }, span)
    }

    pub fn call(dst: Option<Var>, kind: CallKind, details: CallDetails, span: Option<Span>) -> Self {
        Self::new(
            InstrKind::Call {
                dst,
                kind,
                details: Box::new(details),
            },
            span,
        )
    }

    pub fn literal(dst: Var, text: Name, ty: TypeId, span: Option<Span>) -> Self {
        Self::new(InstrKind::Literal { dst, text, ty }, span)
    }

    pub fn ret(value: Option<Var>, span: Option<Span>) -> Self {
        Self::new(InstrKind::Return { value }, span)
    }

    pub fn assert(condition: Var, message: &str, span: Option<Span>) -> Self {
        Self::new(
            InstrKind::Assert {
                condition,
                message: message.into(),
            },
            span,
        )
    }

    pub fn throw(value: Var, span: Option<Span>) -> Self {
        Self::new(InstrKind::Throw { value }, span)
    }

    pub fn logical(block: LogicalBlock, span: Option<Span>) -> Self {
        Self::new(InstrKind::Logical(Box::new(block)), span)
    }

    pub fn chain(chain: ControlFlowChain, span: Option<Span>) -> Self {
        Self::new(InstrKind::ControlFlowChain(Box::new(chain)), span)
    }

    pub fn for_range(block: ForRangePolymorphic, span: Option<Span>) -> Self {
        Self::new(InstrKind::ForRange(Box::new(block)), span)
    }

    /// Variable written by this instruction, if any.
    pub fn defined_var(&self) -> Option<Var> {
        match &self.kind {
            InstrKind::Reference { var, .. } => Some(*var),
            InstrKind::Load { dst, .. }
            | InstrKind::Store { dst, .. }
            | InstrKind::IsNull { dst, .. }
            | InstrKind::Literal { dst, .. } => Some(*dst),
            InstrKind::Call { dst, .. } => *dst,
            InstrKind::Logical(block) => Some(block.result),
            InstrKind::ControlFlowChain(chain) => chain.result,
            InstrKind::Retain { .. }
            | InstrKind::Release { .. }
            | InstrKind::ScopeEnter { .. }
            | InstrKind::ScopeExit { .. }
            | InstrKind::ScopeRegister { .. }
            | InstrKind::Return { .. }
            | InstrKind::Assert { .. }
            | InstrKind::Throw { .. }
            | InstrKind::ForRange(_) => None,
        }
    }

    /// Nested instruction sequences, in execution-listing order.
    pub fn nested(&self) -> Vec<&[Instr]> {
        match &self.kind {
            InstrKind::Logical(block) => block.sequences(),
            InstrKind::ControlFlowChain(chain) => chain.sequences(),
            InstrKind::ForRange(block) => block.sequences(),
            _ => Vec::new(),
        }
    }
}
