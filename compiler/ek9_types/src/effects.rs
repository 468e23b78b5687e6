//! Side-effect metadata carried on every callable.

use bitflags::bitflags;

bitflags! {
    /// What a call may mutate.
    ///
    /// Empty means the call is pure. Optimizers read this from the call
    /// details of each generated call instruction.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    #[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
    pub struct SideEffects: u8 {
        /// Returns an object the caller may go on to mutate.
        const RETURN_MUTATION = 1 << 0;
        /// Mutates the receiver (`+=`, `:~:`, `:=:` ...).
        const THIS_MUTATION = 1 << 1;
        /// Calls through something whose effects are unknown.
        const POSSIBLE_MUTATION = 1 << 2;
    }
}

impl SideEffects {
    #[inline]
    pub const fn is_pure(self) -> bool {
        self.is_empty()
    }
}
