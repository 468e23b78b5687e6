//! Operator text → method name.
//!
//! Split by arity: binary `-` is `_sub`, unary `-` is `_negate`. Each
//! entry also carries the metadata used when the type universe has no
//! candidate for the method, so a call can still be emitted with sensible
//! purity and result information.

use ek9_types::SideEffects;

use self::Arity::{Binary, Unary};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Arity {
    Unary,
    Binary,
}

/// Result type of an operator method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Yields {
    Target,
    Void,
    Boolean,
    Integer,
    String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct OperatorInfo {
    pub op: &'static str,
    pub method: &'static str,
    pub arity: Arity,
    pub yields: Yields,
    pub effects: SideEffects,
}

impl OperatorInfo {
    #[inline]
    pub(crate) fn takes_argument(&self) -> bool {
        self.arity == Arity::Binary
    }

    #[inline]
    pub(crate) fn is_pure(&self) -> bool {
        self.effects.is_pure()
    }

    /// 1 when pure, 0 otherwise.
    pub(crate) fn fallback_complexity(&self) -> u32 {
        u32::from(self.is_pure())
    }
}

const fn pure(op: &'static str, method: &'static str, arity: Arity, yields: Yields) -> OperatorInfo {
    OperatorInfo {
        op,
        method,
        arity,
        yields,
        effects: SideEffects::empty(),
    }
}

const fn mutating(op: &'static str, method: &'static str, arity: Arity) -> OperatorInfo {
    OperatorInfo {
        op,
        method,
        arity,
        yields: Yields::Void,
        effects: SideEffects::THIS_MUTATION,
    }
}

static BINARY: &[OperatorInfo] = &[
    // Comparison
    pure("<", "_lt", Binary, Yields::Boolean),
    pure("<=", "_lteq", Binary, Yields::Boolean),
    pure(">", "_gt", Binary, Yields::Boolean),
    pure(">=", "_gteq", Binary, Yields::Boolean),
    pure("==", "_eq", Binary, Yields::Boolean),
    pure("<>", "_neq", Binary, Yields::Boolean),
    pure("<=>", "_cmp", Binary, Yields::Integer),
    pure("<~>", "_fuzzy", Binary, Yields::Integer),
    // Arithmetic
    pure("+", "_add", Binary, Yields::Target),
    pure("-", "_sub", Binary, Yields::Target),
    pure("*", "_mul", Binary, Yields::Target),
    pure("/", "_div", Binary, Yields::Target),
    pure("^", "_pow", Binary, Yields::Target),
    pure("mod", "_mod", Binary, Yields::Target),
    pure("rem", "_rem", Binary, Yields::Target),
    // Compound assignment
    mutating("+=", "_addAss", Binary),
    mutating("-=", "_subAss", Binary),
    mutating("*=", "_mulAss", Binary),
    mutating("/=", "_divAss", Binary),
    // Logic
    pure("and", "_and", Binary, Yields::Target),
    pure("or", "_or", Binary, Yields::Target),
    pure("xor", "_xor", Binary, Yields::Target),
    // Shift
    pure("<<", "_shftl", Binary, Yields::Target),
    pure(">>", "_shftr", Binary, Yields::Target),
    // Object
    mutating(":=:", "_copy", Binary),
    mutating(":^:", "_replace", Binary),
    mutating(":~:", "_merge", Binary),
    mutating("|", "_pipe", Binary),
];

static UNARY: &[OperatorInfo] = &[
    pure("~", "_negate", Unary, Yields::Target),
    pure("-", "_negate", Unary, Yields::Target),
    pure("not", "_negate", Unary, Yields::Target),
    pure("++", "_inc", Unary, Yields::Target),
    pure("--", "_dec", Unary, Yields::Target),
    pure("?", "_isSet", Unary, Yields::Boolean),
    pure("$", "_string", Unary, Yields::String),
    pure("$$", "_json", Unary, Yields::String),
    pure("#?", "_hashcode", Unary, Yields::Integer),
    pure("#^", "_promote", Unary, Yields::Target),
    pure("#<", "_prefix", Unary, Yields::Target),
    pure("#>", "_suffix", Unary, Yields::Target),
    pure("!", "_fac", Unary, Yields::Target),
    pure("abs", "abs", Unary, Yields::Target),
    pure("sqrt", "sqrt", Unary, Yields::Target),
    pure("length", "_len", Unary, Yields::Integer),
    pure("empty", "_empty", Unary, Yields::Boolean),
    OperatorInfo {
        op: "close",
        method: "_close",
        arity: Unary,
        yields: Yields::Void,
        effects: SideEffects::POSSIBLE_MUTATION,
    },
];

pub(crate) fn binary(op: &str) -> Option<&'static OperatorInfo> {
    BINARY.iter().find(|info| info.op == op)
}

pub(crate) fn unary(op: &str) -> Option<&'static OperatorInfo> {
    UNARY.iter().find(|info| info.op == op)
}

/// Entry for an operator method name, binary forms first.
pub(crate) fn by_method(method: &str) -> Option<&'static OperatorInfo> {
    BINARY
        .iter()
        .chain(UNARY)
        .find(|info| info.method == method)
}
