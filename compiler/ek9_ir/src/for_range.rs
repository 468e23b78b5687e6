//! Polymorphic `for i in start ... end by step`.
//!
//! The direction is only known at runtime (`start <=> end`), so the block
//! carries three dispatch cases that share one copy of the loop body.
//!
//! # Execution
//!
//! 1. `initialization` evaluates the bounds, asserts they are set and
//!    computes `direction` and `current`.
//! 2. The first dispatch case whose `direction_check` primitive is true is
//!    taken:
//!    - ascending / descending: loop { `condition`; stop when false;
//!      `body_setup`; `body`; `increment` }
//!    - equal: `body_setup`; `body` once.
//! 3. No case matching (a step pointing the wrong way) runs nothing.

use ek9_tree::{Span, TypeId};

use crate::{Instr, ScopeId, Var};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectionalCase {
    pub direction_check: Vec<Instr>,
    pub direction_primitive: Var,
    pub condition: Vec<Instr>,
    pub condition_primitive: Var,
    /// Rebinds the loop variable from `current`.
    pub body_setup: Vec<Instr>,
    /// Advances `current`.
    pub increment: Vec<Instr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct EqualCase {
    pub direction_check: Vec<Instr>,
    pub direction_primitive: Var,
    pub body_setup: Vec<Instr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct DispatchCases {
    pub ascending: DirectionalCase,
    pub descending: DirectionalCase,
    pub equal: EqualCase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopMetadata {
    pub start: Var,
    pub end: Var,
    pub by: Option<Var>,
    pub range_type: TypeId,
    pub by_type: Option<TypeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ScopeMetadata {
    /// Wraps guards and the returning variable.
    pub outer: ScopeId,
    /// Owns the loop variable, `current`, `direction` and the bounds.
    pub loop_scope: ScopeId,
    pub body_scope: ScopeId,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ForRangePolymorphic {
    pub initialization: Vec<Instr>,
    /// Integer result of `start <=> end`.
    pub direction: Var,
    pub current: Var,
    pub loop_var: Var,
    pub dispatch: DispatchCases,
    /// Stored once, shared by all three cases.
    pub body: Vec<Instr>,
    pub metadata: LoopMetadata,
    pub scopes: ScopeMetadata,
    pub span: Option<Span>,
}

impl ForRangePolymorphic {
    pub fn sequences(&self) -> Vec<&[Instr]> {
        let DispatchCases {
            ascending,
            descending,
            equal,
        } = &self.dispatch;
        vec![
            self.initialization.as_slice(),
            ascending.direction_check.as_slice(),
            ascending.condition.as_slice(),
            ascending.body_setup.as_slice(),
            ascending.increment.as_slice(),
            descending.direction_check.as_slice(),
            descending.condition.as_slice(),
            descending.body_setup.as_slice(),
            descending.increment.as_slice(),
            equal.direction_check.as_slice(),
            equal.body_setup.as_slice(),
            self.body.as_slice(),
        ]
    }
}
