//! Structural checks on generated IR.
//!
//! - **Scopes**: within every sequence, enters and exits nest properly and
//!   balance; no scope id is entered twice; registration only targets a
//!   scope that is open at that point.
//! - **Ownership**: per compiler temporary, retains equal registrations
//!   plus releases plus transfers (`Throw`, `Return`). Named variables may
//!   be registered without a retain (parameters, caught exceptions), so for
//!   them retains must not exceed that sum. Properties (`object.field`)
//!   belong to their object and are not counted.
//!
//! Both checks are static: they count instructions, they do not execute
//! them.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::walk::walk;
use crate::{Instr, InstrKind, ScopeId, Var};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("{scope} exited while {innermost:?} is the innermost open scope")]
    MismatchedExit {
        scope: ScopeId,
        innermost: Option<ScopeId>,
    },
    #[error("{scope} entered but never exited")]
    UnclosedScope { scope: ScopeId },
    #[error("{scope} entered more than once")]
    ReenteredScope { scope: ScopeId },
    #[error("{var:?} registered to {scope}, which is not open")]
    RegisterOutsideScope { var: Var, scope: ScopeId },
    #[error(
        "{var:?} retained {retains} times but registered {registers}, \
         released {releases}, transferred {transfers}"
    )]
    UnbalancedOwnership {
        var: Var,
        retains: u32,
        registers: u32,
        releases: u32,
        transfers: u32,
    },
}

/// Run every check.
pub fn verify(instrs: &[Instr]) -> Result<(), VerifyError> {
    verify_scopes(instrs)?;
    verify_ownership(instrs)
}

pub fn verify_scopes(instrs: &[Instr]) -> Result<(), VerifyError> {
    let mut open = Vec::new();
    let mut seen = FxHashSet::default();
    check_sequence(instrs, &mut open, &mut seen)
}

fn check_sequence(
    instrs: &[Instr],
    open: &mut Vec<ScopeId>,
    seen: &mut FxHashSet<ScopeId>,
) -> Result<(), VerifyError> {
    let base = open.len();
    for instr in instrs {
        match instr.kind {
            InstrKind::ScopeEnter { scope } => {
                if !seen.insert(scope) {
                    return Err(VerifyError::ReenteredScope { scope });
                }
                open.push(scope);
            }
            InstrKind::ScopeExit { scope } => {
                if open.len() > base && open.last() == Some(&scope) {
                    open.pop();
                } else {
                    return Err(VerifyError::MismatchedExit {
                        scope,
                        innermost: open.last().copied(),
                    });
                }
            }
            InstrKind::ScopeRegister { var, scope } => {
                if !open.contains(&scope) {
                    return Err(VerifyError::RegisterOutsideScope { var, scope });
                }
            }
            _ => {}
        }
        for nested in instr.nested() {
            check_sequence(nested, open, seen)?;
        }
    }
    if open.len() > base {
        return Err(VerifyError::UnclosedScope { scope: open[base] });
    }
    Ok(())
}

#[derive(Default)]
struct Tally {
    retains: u32,
    registers: u32,
    releases: u32,
    transfers: u32,
}

pub fn verify_ownership(instrs: &[Instr]) -> Result<(), VerifyError> {
    let mut tallies: FxHashMap<Var, Tally> = FxHashMap::default();
    walk(instrs, &mut |instr| match instr.kind {
        InstrKind::Retain { var } => tallies.entry(var).or_default().retains += 1,
        InstrKind::Release { var } => tallies.entry(var).or_default().releases += 1,
        InstrKind::ScopeRegister { var, .. } => tallies.entry(var).or_default().registers += 1,
        InstrKind::Throw { value } | InstrKind::Return { value: Some(value) } => {
            tallies.entry(value).or_default().transfers += 1;
        }
        _ => {}
    });

    let mut vars: Vec<_> = tallies.into_iter().collect();
    vars.sort_by_key(|(var, _)| *var);
    for (var, t) in vars {
        if var.is_field() {
            continue;
        }
        let accounted = t.registers + t.releases + t.transfers;
        let balanced = if var.is_temp() {
            t.retains == accounted
        } else {
            t.retains <= accounted
        };
        if !balanced {
            return Err(VerifyError::UnbalancedOwnership {
                var,
                retains: t.retains,
                registers: t.registers,
                releases: t.releases,
                transfers: t.transfers,
            });
        }
    }
    Ok(())
}
