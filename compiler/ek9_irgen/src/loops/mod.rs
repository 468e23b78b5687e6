//! Looping constructs that need more than a single chain.
//!
//! `for ... in collection` is a `WHILE_LOOP` chain over an iterator;
//! `for ... in a ... b` is a [`ForRangePolymorphic`](ek9_ir::ForRangePolymorphic)
//! block. Both, plus `while`, `switch` and `try`, share the outer scope from
//! [`guard`] that holds guard and returning variables.

mod for_in;
mod for_range;
mod guard;
