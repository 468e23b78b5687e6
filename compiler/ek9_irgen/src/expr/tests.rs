use pretty_assertions::assert_eq;

use ek9_tree::TypeId;

use crate::test_helpers::{Arg, Fixture};
use crate::GenFault;

const INT: TypeId = TypeId::INTEGER;

#[test]
fn binary_operator_golden() {
    let fx = Fixture::new();
    let (tree, f) = fx.returning(&[("a", INT), ("b", INT)], INT, |t| {
        let a = t.ident("a", INT);
        let b = t.ident("b", INT);
        t.binary("+", a, b, INT)
    });
    let ir = fx.lower(&tree, f);
    assert_eq!(
        fx.print(&ir.instructions),
        "\
SCOPE_ENTER _scope_1
REFERENCE a, Integer
REFERENCE b, Integer
REFERENCE rtn, Integer
SCOPE_REGISTER rtn, _scope_1
_temp2 = LOAD a
RETAIN _temp2
SCOPE_REGISTER _temp2, _scope_1
_temp3 = LOAD b
RETAIN _temp3
SCOPE_REGISTER _temp3, _scope_1
_temp1 = CALL_OPERATOR (Integer)_temp2._add(_temp3) -> Integer [pure=true, complexity=1]
RETAIN _temp1
SCOPE_REGISTER _temp1, _scope_1
STORE rtn, _temp1
RETAIN rtn
RETAIN rtn
SCOPE_EXIT _scope_1
RETURN rtn
"
    );
}

#[test]
fn nested_arithmetic_evaluates_left_to_right() {
    let fx = Fixture::new();
    let (tree, f) = fx.returning(&[("a", INT), ("b", INT)], INT, |t| {
        let a = t.ident("a", INT);
        let b = t.ident("b", INT);
        let two = t.int(2);
        let scaled = t.binary("*", b, two, INT);
        let sum = t.binary("+", a, scaled, INT);
        t.paren(sum)
    });
    let run = fx.run(&tree, f, &[("a", Arg::Int(1)), ("b", Arg::Int(3))]);
    assert_eq!(run.value, "7");
}

#[test]
fn integer_operand_is_promoted_to_float() {
    let fx = Fixture::new();
    let (tree, f) = fx.returning(&[], TypeId::FLOAT, |t| {
        let half = t.literal("1.5", TypeId::FLOAT);
        let two = t.int(2);
        t.binary("+", half, two, TypeId::FLOAT)
    });
    let ir = fx.lower(&tree, f);
    assert!(fx.print(&ir.instructions).contains("._promote() -> Float"));
    let run = fx.run(&tree, f, &[]);
    assert_eq!(run.value, "3.5");
}

#[test]
fn unary_negation() {
    let fx = Fixture::new();
    let (tree, f) = fx.returning(&[("a", INT)], INT, |t| {
        let a = t.ident("a", INT);
        t.unary("-", a, INT)
    });
    assert_eq!(fx.run(&tree, f, &[("a", Arg::Int(4))]).value, "-4");
}

#[test]
fn and_skips_right_operand_when_left_is_false() {
    let fx = Fixture::new();
    // `n < 5` would fault on a null `n` if it ran.
    let (tree, f) = fx.returning(&[("flag", TypeId::BOOLEAN), ("n", INT)], TypeId::BOOLEAN, |t| {
        let flag = t.ident("flag", TypeId::BOOLEAN);
        let n = t.ident("n", INT);
        let five = t.int(5);
        let small = t.binary("<", n, five, TypeId::BOOLEAN);
        t.and(flag, small)
    });
    let run = fx.run(&tree, f, &[("flag", Arg::Bool(false)), ("n", Arg::Null)]);
    assert_eq!(run.value, "false");

    let run = fx.run(&tree, f, &[("flag", Arg::Bool(true)), ("n", Arg::Int(3))]);
    assert_eq!(run.value, "true");
}

#[test]
fn or_skips_right_operand_when_left_is_true() {
    let fx = Fixture::new();
    let (tree, f) = fx.returning(&[("flag", TypeId::BOOLEAN), ("n", INT)], TypeId::BOOLEAN, |t| {
        let flag = t.ident("flag", TypeId::BOOLEAN);
        let n = t.ident("n", INT);
        let five = t.int(5);
        let small = t.binary("<", n, five, TypeId::BOOLEAN);
        t.or(flag, small)
    });
    let run = fx.run(&tree, f, &[("flag", Arg::Bool(true)), ("n", Arg::Null)]);
    assert_eq!(run.value, "true");

    let run = fx.run(&tree, f, &[("flag", Arg::Bool(false)), ("n", Arg::Int(9))]);
    assert_eq!(run.value, "false");
}

#[test]
fn question_is_false_for_null_and_unset() {
    let fx = Fixture::new();
    let (tree, f) = fx.returning(&[("n", INT)], TypeId::BOOLEAN, |t| {
        let n = t.ident("n", INT);
        t.question(n)
    });
    assert_eq!(fx.run(&tree, f, &[("n", Arg::Null)]).value, "false");
    assert_eq!(fx.run(&tree, f, &[("n", Arg::Unset)]).value, "false");
    assert_eq!(fx.run(&tree, f, &[("n", Arg::Int(0))]).value, "true");
}

#[test]
fn list_literal_builds_in_order() {
    let fx = Fixture::new();
    let list = fx.int_list;
    let (tree, f) = fx.returning(&[], list, |t| {
        let items: Vec<_> = [1, 2, 3].into_iter().map(|i| t.int(i)).collect();
        t.list(&items, list)
    });
    assert_eq!(fx.run(&tree, f, &[]).value, "[1, 2, 3]");
}

#[test]
fn method_call_on_literal_receiver() {
    let fx = Fixture::new();
    let (tree, f) = fx.returning(&[], INT, |t| {
        let word = t.string("hello");
        t.method_call(word, "_len", &[], INT)
    });
    assert_eq!(fx.run(&tree, f, &[]).value, "5");
}

#[test]
fn constructor_result_is_managed_once() {
    let fx = Fixture::new();
    let (tree, f) = fx.returning(&[], TypeId::STRING, |t| {
        let text = t.string("copy");
        t.construct(TypeId::STRING, &[text])
    });
    let ir = fx.lower(&tree, f);
    let printed = fx.print(&ir.instructions);
    assert_eq!(printed.matches("RETAIN _temp1\n").count(), 1);
    assert_eq!(fx.run(&tree, f, &[]).value, "copy");
}

#[test]
fn function_call_statement_passes_arguments() {
    let fx = Fixture::new();
    let observe = fx.observe;
    let (tree, f) = fx.procedure(&[("a", INT)], |t| {
        let a = t.ident("a", INT);
        let one = t.int(1);
        let next = t.binary("+", a, one, INT);
        let call = t.call_function(observe, &[next], TypeId::VOID);
        vec![t.expr_stmt(call)]
    });
    let run = fx.run(&tree, f, &[("a", Arg::Int(41))]);
    assert_eq!(run.trace, vec!["Observe(42)"]);
}

#[test]
fn unsupported_expressions_are_faults() {
    let fx = Fixture::new();
    let dict = fx.returning(&[], TypeId::ANY, |t| t.dict(&[], TypeId::ANY));
    let coalescing = fx.returning(&[("a", INT)], INT, |t| {
        let a = t.ident("a", INT);
        let b = t.int(0);
        t.coalescing("??", a, b, INT)
    });
    let dynamic = fx.returning(&[], fx.observe, |t| t.dynamic_function(fx.observe));
    let stream = fx.returning(&[], INT, |t| {
        let source = t.int(1);
        t.stream(source, INT)
    });

    for (tree, f) in [dict, coalescing, dynamic, stream] {
        assert!(matches!(
            fx.generate(&tree, f),
            Err(GenFault::NotImplemented { .. })
        ));
    }
}

#[test]
fn unresolved_expression_type_is_a_fault() {
    let fx = Fixture::new();
    let (tree, f) = fx.returning(&[], INT, |t| t.literal("1", TypeId::UNRESOLVED));
    assert!(matches!(
        fx.generate(&tree, f),
        Err(GenFault::Unresolved { .. })
    ));
}
