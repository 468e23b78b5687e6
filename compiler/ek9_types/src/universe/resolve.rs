//! Cost-based overload selection.
//!
//! Each argument is scored against the parameter it would bind to:
//!
//! | Match | Cost |
//! |---|---|
//! | identical type | 0 |
//! | supertype, per edge | 5 |
//! | `Any` | 20 |
//! | promotion (`_promote`) | 50 |
//!
//! A candidate's cost is the sum over its arguments. The cheapest
//! candidate wins; two different signatures at the same lowest cost are
//! ambiguous.

use std::cmp::Ordering;

use smallvec::SmallVec;

use ek9_tree::{MethodRef, Name, TypeId};

use super::TypeUniverse;
use crate::MethodDef;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MatchCost(u32);

impl MatchCost {
    pub const EXACT: MatchCost = MatchCost(0);
    pub const SUPERTYPE_STEP: MatchCost = MatchCost(5);
    pub const ANY: MatchCost = MatchCost(20);
    pub const PROMOTION: MatchCost = MatchCost(50);

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn plus(self, other: MatchCost) -> MatchCost {
        MatchCost(self.0.saturating_add(other.0))
    }
}

/// Selected overload plus the promotions its arguments need.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub method: MethodRef,
    pub cost: MatchCost,
    /// Per argument: `Some(target)` when it must be promoted first.
    pub promotions: SmallVec<[Option<TypeId>; 2]>,
}

impl Resolution {
    pub fn needs_promotion(&self) -> bool {
        self.promotions.iter().any(Option::is_some)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no overload of {name:?} on {owner:?} accepts {args:?}")]
    NotFound {
        owner: TypeId,
        name: Name,
        args: Vec<TypeId>,
    },
    #[error("call to {name:?} on {owner:?} is ambiguous between {candidates:?}")]
    Ambiguous {
        owner: TypeId,
        name: Name,
        candidates: Vec<MethodRef>,
    },
}

impl TypeUniverse {
    /// Cost of passing a `from` value where `to` is expected, plus the
    /// promotion target when a conversion is required.
    pub fn match_cost(&self, from: TypeId, to: TypeId) -> Option<(MatchCost, Option<TypeId>)> {
        if from == to {
            return Some((MatchCost::EXACT, None));
        }
        if let Some(distance) = self.super_distance(from, to) {
            let cost = MatchCost(MatchCost::SUPERTYPE_STEP.0.saturating_mul(distance));
            return Some((cost, None));
        }
        if to == TypeId::ANY && self.is_managed(from) {
            return Some((MatchCost::ANY, None));
        }
        let promoted = self.get(from)?.promotes_to?;
        if promoted == to {
            return Some((MatchCost::PROMOTION, Some(to)));
        }
        None
    }

    /// Whether a `from` value can be stored in a `to` variable without
    /// conversion.
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        self.match_cost(from, to)
            .is_some_and(|(_, promotion)| promotion.is_none())
    }

    /// Best method `name` on `owner` (or its supertypes) for `args`.
    pub fn resolve_method(
        &self,
        owner: TypeId,
        name: Name,
        args: &[TypeId],
    ) -> Result<Resolution, ResolveError> {
        let candidates = self.methods_named(owner, name);
        self.select(owner, name, args, candidates)
    }

    /// Best constructor of `owner` for `args`.
    pub fn resolve_constructor(
        &self,
        owner: TypeId,
        args: &[TypeId],
    ) -> Result<Resolution, ResolveError> {
        let name = self.name(owner);
        let candidates = self
            .get(owner)
            .map(|def| {
                def.methods
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| m.constructor)
                    .map(|(slot, m)| {
                        let slot = u32::try_from(slot).unwrap_or(u32::MAX);
                        (MethodRef::new(owner, slot), m)
                    })
                    .collect()
            })
            .unwrap_or_default();
        self.select(owner, name, args, candidates)
    }

    /// Score of `method` for `args`, `None` when some argument cannot bind.
    pub fn score(
        &self,
        method: &MethodDef,
        args: &[TypeId],
    ) -> Option<(MatchCost, SmallVec<[Option<TypeId>; 2]>)> {
        if method.params.len() != args.len() {
            return None;
        }
        let mut total = MatchCost::EXACT;
        let mut promotions = SmallVec::new();
        for (&arg, &param) in args.iter().zip(&method.params) {
            let (cost, promotion) = self.match_cost(arg, param)?;
            total = total.plus(cost);
            promotions.push(promotion);
        }
        Some((total, promotions))
    }

    fn select(
        &self,
        owner: TypeId,
        name: Name,
        args: &[TypeId],
        candidates: Vec<(MethodRef, &MethodDef)>,
    ) -> Result<Resolution, ResolveError> {
        let mut seen: Vec<&[TypeId]> = Vec::new();
        let mut best: Option<Resolution> = None;
        let mut tied: Vec<MethodRef> = Vec::new();

        for (method_ref, method) in candidates {
            // An override hides the inherited method with the same signature.
            if seen.contains(&method.params.as_slice()) {
                continue;
            }
            seen.push(method.params.as_slice());

            let Some((cost, promotions)) = self.score(method, args) else {
                continue;
            };
            match best.as_ref().map(|current| cost.cmp(&current.cost)) {
                Some(Ordering::Greater) => {}
                Some(Ordering::Equal) => tied.push(method_ref),
                Some(Ordering::Less) | None => {
                    tied.clear();
                    best = Some(Resolution {
                        method: method_ref,
                        cost,
                        promotions,
                    });
                }
            }
        }

        match best {
            None => Err(ResolveError::NotFound {
                owner,
                name,
                args: args.to_vec(),
            }),
            Some(best) if !tied.is_empty() => {
                let mut candidates = vec![best.method];
                candidates.extend(tied);
                tracing::debug!(?owner, ?name, ?candidates, "ambiguous overload");
                Err(ResolveError::Ambiguous {
                    owner,
                    name,
                    candidates,
                })
            }
            Some(best) => Ok(best),
        }
    }
}
