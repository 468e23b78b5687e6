use ek9_tree::{Name, TypeId};
use pretty_assertions::assert_eq;

use crate::walk::{count, walk};

use super::*;

fn t(n: u32) -> Var {
    Var::Temp(TempId::new(n))
}

#[test]
fn ids_print_with_prefixes() {
    assert_eq!(ScopeId::new(3).to_string(), "_scope_3");
    assert_eq!(TempId::new(12).to_string(), "_temp12");
    assert!(t(1).is_temp());
    assert!(!Var::Named(Name::from_raw(1)).is_temp());
}

#[test]
fn defined_var_of_memory_ops() {
    let x = Var::Named(Name::from_raw(4));
    assert_eq!(Instr::reference(x, TypeId::INTEGER, None).defined_var(), Some(x));
    assert_eq!(Instr::load(t(1), x, None).defined_var(), Some(t(1)));
    assert_eq!(Instr::retain(x, None).defined_var(), None);
    assert_eq!(Instr::is_null(t(2), x, None).defined_var(), Some(t(2)));
}

#[test]
fn walk_descends_into_chains() {
    let mut chain = ControlFlowChain::new(ChainKind::WhileLoop, ScopeId::new(1), None);
    chain.cases.push(ConditionCase {
        kind: CaseKind::Expression,
        case_scope: ScopeId::new(2),
        condition: vec![
            Instr::enter(ScopeId::new(2), None),
            Instr::exit(ScopeId::new(2), None),
        ],
        condition_result: Some(t(1)),
        primitive: Some(t(2)),
        body: vec![Instr::retain(t(3), None)],
        body_result: None,
        exception: None,
    });
    let instrs = vec![Instr::chain(chain, None), Instr::ret(None, None)];
    assert_eq!(count(&instrs), 5);

    let mut order = Vec::new();
    walk(&instrs, &mut |instr| {
        order.push(std::mem::discriminant(&instr.kind));
    });
    assert_eq!(
        order[1],
        std::mem::discriminant(&InstrKind::ScopeEnter {
            scope: ScopeId::new(0)
        })
    );
}

#[test]
fn loop_kinds() {
    assert!(ChainKind::WhileLoop.is_loop());
    assert!(ChainKind::DoWhileLoop.is_loop());
    assert!(!ChainKind::TryCatchFinally.is_loop());
    assert_eq!(ChainKind::GuardedAssignment.label(), "GUARDED_ASSIGNMENT");
}

#[cfg(feature = "cache")]
#[test]
fn cache_round_trip() {
    let instrs = vec![
        Instr::enter(ScopeId::new(1), None),
        Instr::literal(t(1), Name::from_raw(2), TypeId::STRING, Some(ek9_tree::Span::new(3, 9))),
        Instr::exit(ScopeId::new(1), None),
    ];
    let bytes = crate::cache::encode(&instrs).unwrap_or_else(|e| panic!("{e}"));
    let back = crate::cache::decode(&bytes).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(back, instrs);
}
