//! EK9 annotated syntax tree.
//!
//! The input contract of the IR generator. Earlier phases (parsing and
//! semantic analysis, not part of this workspace) hand over:
//! - Names for interned identifiers and operator text
//! - Spans for source positions
//! - A flat arena of expressions, statements and control-flow constructs,
//!   each annotated with its resolved `TypeId`
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: Strings → Name(u32), Types → TypeId(u32)
//! - **Flatten Everything**: No `Box<Expr>`, nodes refer to `ExprId(u32)`
//! - **Resolved, not resolving**: nothing here performs lookup; a node left
//!   `TypeId::UNRESOLVED` is reported by the generator as a fault.

pub mod ast;
mod arena;
mod builder;
mod ids;
mod interner;
mod name;
mod span;

pub use arena::TreeArena;
pub use builder::TreeBuilder;
pub use ids::{AggregateId, ExprId, ExprRange, FlowId, FunctionId, MethodRef, StmtId, StmtRange, TypeId};
pub use interner::{InternError, StringInterner};
pub use name::Name;
pub use span::Span;
