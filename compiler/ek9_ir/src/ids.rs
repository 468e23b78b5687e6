//! Variable and scope identifiers.

use std::fmt;

use ek9_tree::Name;

/// Lexical scope identifier. Prints as `_scope_N`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ScopeId(u32);

impl ScopeId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_scope_{}", self.0)
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Compiler temporary. Prints as `_tempN`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct TempId(u32);

impl TempId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_temp{}", self.0)
    }
}

impl fmt::Debug for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A variable slot: a compiler temporary, a source-level name, or a
/// property of the object a named variable holds. Prints as `_tempN`,
/// `name` and `object.field`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Var {
    Temp(TempId),
    Named(Name),
    /// Owned by the object, not by any scope.
    Field { object: Name, field: Name },
}

impl Var {
    #[inline]
    pub fn field(object: Name, field: Name) -> Self {
        Var::Field { object, field }
    }

    #[inline]
    pub fn is_temp(self) -> bool {
        matches!(self, Var::Temp(_))
    }

    #[inline]
    pub fn is_field(self) -> bool {
        matches!(self, Var::Field { .. })
    }
}

impl From<TempId> for Var {
    fn from(temp: TempId) -> Self {
        Var::Temp(temp)
    }
}

impl From<Name> for Var {
    fn from(name: Name) -> Self {
        Var::Named(name)
    }
}
