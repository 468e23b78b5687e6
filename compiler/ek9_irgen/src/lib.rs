//! EK9 IR generation.
//!
//! Lowers a resolved [`ek9_tree`] function body into [`ek9_ir`]
//! instructions: scope-structured, with explicit reference counting and
//! every conditional shape expressed as a control-flow chain.
//!
//! # Architecture
//!
//! ```text
//! generate_function / generate_aggregate
//!     └── IrLowerer (one GenContext per function)
//!           ├── stmt        statements, blocks, declarations
//!           ├── expr        operators, calls, literals, collections
//!           ├── chain       if / switch / while / `?` / :=?
//!           ├── loops       for-in, for-range, outer guard scope
//!           ├── try_catch   try / catch / finally with resources
//!           ├── condition   guard + condition normalisation
//!           ├── calls       overload selection, promotion, metadata
//!           ├── aggregate   i_init, default constructor, defaulted operators
//!           └── memory      retain + scope-register
//! ```
//!
//! Generators are `impl IrLowerer` blocks spread across the modules and
//! call each other through `&mut self`. Inputs (tree, type universe,
//! interner) are shared read-only, so [`generate_functions`] lowers
//! independent functions on a rayon pool.
//!
//! # Debugging
//!
//! - `RUST_LOG=ek9_irgen=debug`: one span per function plus every fault.
//! - `RUST_LOG=ek9_irgen=trace`: temp allocation and, with
//!   `EK9_IR_TRACE_SCOPES=1`, every scope push and pop.

mod aggregate;
mod calls;
mod chain;
mod condition;
mod context;
mod expr;
mod fault;
mod function;
mod loops;
mod lowerer;
mod memory;
mod options;
mod stmt;
mod try_catch;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

pub use aggregate::{generate_aggregate, generate_aggregates, AggregateIr};
pub use context::{Frame, FrameKind, GenContext};
pub use fault::{GenFault, GenResult};
pub use function::{generate_function, generate_functions, FunctionIr};
pub use options::{GenOptions, OptionOverrides, TRACE_SCOPES_VAR, VERIFY_VAR};

pub(crate) use lowerer::IrLowerer;

static TRACING_INIT: Once = Once::new();

/// Install a hierarchical tracing subscriber.
///
/// Only when `RUST_LOG` is set, and only once per process.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .with(filter)
                .init();
        }
    });
}
