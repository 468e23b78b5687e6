use pretty_assertions::assert_eq;
use smallvec::smallvec;

use ek9_ir::{ChainKind, InstrKind, Var};
use ek9_tree::ast::{Flow, Guard, GuardOp, IfBranch, IfFlow};
use ek9_tree::{ExprId, FunctionId, Span, TreeArena, TreeBuilder, TypeId};

use crate::test_helpers::{Arg, Fault, Fixture};
use crate::{FrameKind, GenContext, GenFault, GenOptions, IrLowerer};

const INT: TypeId = TypeId::INTEGER;
const BOOL: TypeId = TypeId::BOOLEAN;

/// Build the guard and condition, then hand them to `f` with a lowerer
/// inside a function scope over the resulting tree.
fn with_parts<R>(
    fx: &Fixture,
    build: impl FnOnce(&mut TreeBuilder<'_>) -> (Option<Guard>, Option<ExprId>),
    f: impl FnOnce(&mut IrLowerer<'_>, Option<Guard>, Option<ExprId>) -> R,
) -> R {
    let mut b = fx.builder();
    let (guard, condition) = build(&mut b);
    let tree = b.finish();
    let ctx = GenContext::new(&tree, &fx.types, &fx.interner, GenOptions::default());
    let mut lowerer = IrLowerer::new(ctx);
    lowerer.ctx.enter_scope(FrameKind::Function);
    f(&mut lowerer, guard, condition)
}

fn guard_and_condition(
    t: &mut TreeBuilder<'_>,
    op: GuardOp,
) -> (Option<Guard>, Option<ExprId>) {
    let n = t.ident("n", INT);
    let guard = t.guard(op, "v", INT, n);
    let v = t.ident("v", INT);
    let two = t.int(2);
    (Some(guard), Some(t.binary(">", v, two, BOOL)))
}

fn is_logical(kind: &InstrKind) -> bool {
    matches!(kind, InstrKind::Logical(_))
}

#[test]
fn checked_guard_with_condition_is_short_circuit_and() {
    let fx = Fixture::new();
    with_parts(
        &fx,
        |t| guard_and_condition(t, GuardOp::Declare),
        |l, guard, condition| {
            let evaluated = l
                .evaluate_guarded_condition(guard.as_ref(), condition, Span::DUMMY)
                .unwrap_or_else(|fault| panic!("{fault}"));
            assert!(is_logical(&evaluated.instrs[0].kind));
            let InstrKind::Logical(block) = &evaluated.instrs[0].kind else {
                unreachable!()
            };
            assert_eq!(block.result, evaluated.result);
            // The left operand is the null-safe `v?` chain.
            assert!(block.left.instructions.iter().any(|instr| matches!(
                &instr.kind,
                InstrKind::ControlFlowChain(chain) if chain.kind == ChainKind::QuestionOperator
            )));
        },
    );
}

#[test]
fn unchecked_guard_uses_condition_alone() {
    let fx = Fixture::new();
    with_parts(
        &fx,
        |t| guard_and_condition(t, GuardOp::Assign),
        |l, guard, condition| {
            let evaluated = l
                .evaluate_guarded_condition(guard.as_ref(), condition, Span::DUMMY)
                .unwrap_or_else(|fault| panic!("{fault}"));
            assert!(!evaluated.instrs.iter().any(|i| is_logical(&i.kind)));
            assert!(!evaluated.instrs.iter().any(|i| matches!(i.kind, InstrKind::ControlFlowChain(_))));
        },
    );
}

#[test]
fn guard_alone_is_null_safe_check() {
    let fx = Fixture::new();
    with_parts(
        &fx,
        |t| {
            let (guard, _) = guard_and_condition(t, GuardOp::GuardAssign);
            (guard, None)
        },
        |l, guard, condition| {
            let evaluated = l
                .evaluate_guarded_condition(guard.as_ref(), condition, Span::DUMMY)
                .unwrap_or_else(|fault| panic!("{fault}"));
            let InstrKind::ControlFlowChain(chain) = &evaluated.instrs[0].kind else {
                panic!("expected the `v?` chain, got {:?}", evaluated.instrs[0]);
            };
            assert_eq!(chain.kind, ChainKind::QuestionOperator);
            assert_eq!(chain.result, Some(evaluated.result));
        },
    );
}

#[test]
fn unchecked_guard_without_condition_is_malformed() {
    let fx = Fixture::new();
    for op in [GuardOp::Assign, GuardOp::Blind] {
        with_parts(
            &fx,
            |t| {
                let (guard, _) = guard_and_condition(t, op);
                (guard, None)
            },
            |l, guard, condition| {
                assert!(matches!(
                    l.evaluate_guarded_condition(guard.as_ref(), condition, Span::DUMMY),
                    Err(GenFault::Malformed { .. })
                ));
            },
        );
    }
    with_parts(
        &fx,
        |_| (None, None),
        |l, guard, condition| {
            assert!(l
                .evaluate_guarded_condition(guard.as_ref(), condition, Span::DUMMY)
                .is_err());
        },
    );
}

#[test]
fn guard_setup_forms() {
    let fx = Fixture::new();
    let v = Var::Named(fx.interner.intern("v"));

    with_parts(
        &fx,
        |t| guard_and_condition(t, GuardOp::GuardAssign),
        |l, guard, _| {
            let Some(guard) = guard else { unreachable!() };
            let setup = l.guard_setup(&guard).unwrap_or_else(|fault| panic!("{fault}"));
            assert!(matches!(setup[0].kind, InstrKind::Reference { var, .. } if var == v));
            assert!(matches!(setup[1].kind, InstrKind::ScopeRegister { var, .. } if var == v));
            let tail: Vec<_> = setup[setup.len() - 3..].iter().map(|i| &i.kind).collect();
            assert!(matches!(tail[0], InstrKind::Release { var } if *var == v));
            assert!(matches!(tail[1], InstrKind::Store { dst, .. } if *dst == v));
            assert!(matches!(tail[2], InstrKind::Retain { var } if *var == v));
        },
    );

    with_parts(
        &fx,
        |t| guard_and_condition(t, GuardOp::IfUnset),
        |l, guard, _| {
            let Some(guard) = guard else { unreachable!() };
            let setup = l.guard_setup(&guard).unwrap_or_else(|fault| panic!("{fault}"));
            assert_eq!(setup.len(), 1);
            assert!(matches!(
                &setup[0].kind,
                InstrKind::ControlFlowChain(chain) if chain.kind == ChainKind::GuardedAssignment
            ));
        },
    );
}

/// `[v <- Integer()]` then `if v <op> n [then v > 2] { Observe(v) }`.
fn guarded_observe(
    fx: &Fixture,
    op: GuardOp,
    with_condition: bool,
    predeclare: bool,
) -> (TreeArena, FunctionId) {
    fx.procedure(&[("n", INT)], |t| {
        let mut stmts = Vec::new();
        if predeclare {
            let unset = t.construct(INT, &[]);
            stmts.push(t.var_decl("v", INT, unset));
        }
        let (guard, condition) = guard_and_condition(t, op);
        let v = t.ident("v", INT);
        let seen = fx.observe(t, v);
        let body = t.body(&[seen]);
        let branch = IfBranch {
            guard,
            condition: condition.filter(|_| with_condition),
            body,
            span: t.span(),
        };
        let flow = IfFlow {
            branches: smallvec![branch],
            else_body: None,
            span: t.span(),
        };
        stmts.push(t.flow_stmt(Flow::If(flow)));
        stmts
    })
}

#[test]
fn guard_assign_skips_null() {
    let fx = Fixture::new();
    let (tree, f) = guarded_observe(&fx, GuardOp::GuardAssign, false, false);
    assert_eq!(fx.run(&tree, f, &[("n", Arg::Int(3))]).trace, vec!["Observe(3)"]);
    assert!(fx.run(&tree, f, &[("n", Arg::Null)]).trace.is_empty());
    assert!(fx.run(&tree, f, &[("n", Arg::Unset)]).trace.is_empty());
}

#[test]
fn if_unset_guard_only_assigns_unset_target() {
    let fx = Fixture::new();
    let (tree, f) = guarded_observe(&fx, GuardOp::IfUnset, true, true);
    assert_eq!(fx.run(&tree, f, &[("n", Arg::Int(9))]).trace, vec!["Observe(9)"]);
    assert!(fx.run(&tree, f, &[("n", Arg::Int(1))]).trace.is_empty());
    assert!(fx.run(&tree, f, &[("n", Arg::Null)]).trace.is_empty());
}

#[test]
fn unchecked_guard_lets_condition_see_null() {
    let fx = Fixture::new();
    let (tree, f) = guarded_observe(&fx, GuardOp::Assign, true, true);
    assert_eq!(fx.run(&tree, f, &[("n", Arg::Int(4))]).trace, vec!["Observe(4)"]);

    let ir = fx.lower(&tree, f);
    let fault = fx.execute(&ir, &[("n", Arg::Null)]).err();
    assert!(matches!(fault, Some(Fault::NullReceiver(ref method)) if method == "_gt"));
}
