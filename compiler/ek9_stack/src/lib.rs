//! Stack growth for the recursive IR generators.
//!
//! Expression lowering calls statement lowering which calls expression
//! lowering again; a deeply nested source construct turns into an equally
//! deep Rust call stack. Every recursive entry point in `ek9_irgen` goes
//! through [`ensure_sufficient_stack`] so a pathological input grows the
//! stack instead of overflowing it.
//!
//! # Platform Support
//!
//! - **Native targets**: `stacker` allocates a new segment on demand.
//! - **WASM targets**: passthrough.

/// Remaining stack below which a new segment is allocated (128KB).
///
/// Lowering a single construct can build several instruction vectors on
/// the stack before recursing, so the red zone is a little wider than a
/// parser would need.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment (2MB).
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
///
/// ```text
/// pub(crate) fn lower_expr(&mut self, id: ExprId, dst: Var) -> GenResult<Vec<Instr>> {
///     ensure_sufficient_stack(|| self.lower_expr_inner(id, dst))
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
