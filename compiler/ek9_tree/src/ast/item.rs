use crate::{ExprId, FunctionId, Name, Span, StmtRange, TypeId};

use super::ReturningParam;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    pub name: Name,
    pub ty: TypeId,
}

/// A function, method or operator body.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    pub name: Name,
    pub params: Vec<Param>,
    pub returning: Option<ReturningParam>,
    pub body: StmtRange,
    pub span: Span,
}

/// A property declared on an aggregate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Property {
    pub name: Name,
    pub ty: TypeId,
    /// Without one the property starts as its type's unset value.
    pub init: Option<ExprId>,
    pub span: Span,
}

/// Operator the compiler writes for an aggregate declared with `default`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum DefaultOperator {
    /// `?`
    IsSet,
    /// `==`
    Eq,
    /// `<>`
    Neq,
    /// `$`
    String,
    /// `#?`
    HashCode,
}

impl DefaultOperator {
    pub const ALL: [DefaultOperator; 5] = [
        DefaultOperator::IsSet,
        DefaultOperator::Eq,
        DefaultOperator::Neq,
        DefaultOperator::String,
        DefaultOperator::HashCode,
    ];

    /// Name of the method implementing the operator.
    pub const fn method(self) -> &'static str {
        match self {
            DefaultOperator::IsSet => "_isSet",
            DefaultOperator::Eq => "_eq",
            DefaultOperator::Neq => "_neq",
            DefaultOperator::String => "_string",
            DefaultOperator::HashCode => "_hashcode",
        }
    }
}

/// A class or record: its type, properties, methods and defaulted
/// operators.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Aggregate {
    pub ty: TypeId,
    pub properties: Vec<Property>,
    pub methods: Vec<FunctionId>,
    pub defaults: Vec<DefaultOperator>,
    pub span: Span,
}
