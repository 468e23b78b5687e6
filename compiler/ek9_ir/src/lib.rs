//! EK9 IR: scope-structured, backend-agnostic instructions.
//!
//! The output contract of the IR generator.
//!
//! # Architecture
//!
//! - **[`Instr`]**: one instruction (memory, scope, call, literal, return,
//!   assert, throw) with an optional source span
//! - **[`LogicalBlock`]**: short-circuit `and` / `or`
//! - **[`ControlFlowChain`]**: every conditional and looping shape as an
//!   ordered list of guarded cases
//! - **[`ForRangePolymorphic`]**: `for ... in a ... b` whose direction is
//!   decided at runtime
//!
//! Memory is managed by scope: a value joins a scope through
//! `ScopeRegister` after being retained and is released when that scope
//! exits. [`verify`] checks both the nesting and the ownership balance
//! statically; [`print::IrPrinter`] renders the tree for debugging and
//! golden tests.

#[cfg(feature = "cache")]
pub mod cache;
mod chain;
mod for_range;
mod ids;
mod instr;
mod logical;
pub mod print;
pub mod verify;
pub mod walk;

pub use chain::{
    CaseKind, ChainKind, ConditionCase, ControlFlowChain, DefaultCase, ExceptionBinding, TryBlock,
};
pub use for_range::{
    DirectionalCase, DispatchCases, EqualCase, ForRangePolymorphic, LoopMetadata, ScopeMetadata,
};
pub use ids::{ScopeId, TempId, Var};
pub use instr::{CallDetails, CallKind, CallMeta, Instr, InstrKind};
pub use logical::{ConditionEvaluation, LogicalBlock, OperandEvaluation};
pub use verify::{verify, VerifyError};

#[cfg(test)]
mod tests;
