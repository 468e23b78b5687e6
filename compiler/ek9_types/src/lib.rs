//! EK9 resolved type universe.
//!
//! The second half of the generator's input contract: every type the
//! annotated tree mentions, with its genus, supertypes, promotion and the
//! signature and side-effect metadata of each method.
//!
//! Nothing here type-checks. Semantic analysis builds the universe; the IR
//! generator only asks it to pick overloads and report metadata.

mod def;
mod effects;
mod universe;

pub use def::{Genus, MethodDef, TypeDef};
pub use effects::SideEffects;
pub use universe::{MatchCost, Resolution, ResolveError, TypeUniverse};
