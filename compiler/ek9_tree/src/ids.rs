//! Arena indices and resolved-symbol handles.
//!
//! Nodes refer to each other through `u32` indices into the [`TreeArena`]
//! rather than boxes. Resolved types and methods are handles into the type
//! universe owned by `ek9_types`.
//!
//! [`TreeArena`]: crate::TreeArena

use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

arena_id!(
    /// Index into the expression arena.
    ExprId
);
arena_id!(
    /// Index into the statement arena.
    StmtId
);
arena_id!(
    /// Index into the control-flow construct arena.
    FlowId
);
arena_id!(
    /// Index into the function arena.
    FunctionId
);
arena_id!(
    /// Index into the aggregate (class and record) arena.
    AggregateId
);

/// Contiguous run of expressions in the flattened list storage.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ExprRange {
    pub start: u32,
    pub len: u32,
}

impl ExprRange {
    pub const EMPTY: ExprRange = ExprRange { start: 0, len: 0 };

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for ExprRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprRange({}..{})", self.start, self.start + self.len)
    }
}

/// Contiguous run of statements in the flattened list storage.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct StmtRange {
    pub start: u32,
    pub len: u32,
}

impl StmtRange {
    pub const EMPTY: StmtRange = StmtRange { start: 0, len: 0 };

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for StmtRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StmtRange({}..{})", self.start, self.start + self.len)
    }
}

/// Handle to a type in the resolved type universe.
///
/// The built-in types occupy fixed slots so generators can name them
/// without a lookup.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    /// No value. Calls returning `VOID` have no destination.
    pub const VOID: TypeId = TypeId(0);
    /// Machine-level boolean used only for branching.
    pub const PRIMITIVE_BOOLEAN: TypeId = TypeId(1);
    pub const ANY: TypeId = TypeId(2);
    pub const BOOLEAN: TypeId = TypeId(3);
    pub const INTEGER: TypeId = TypeId(4);
    pub const FLOAT: TypeId = TypeId(5);
    pub const STRING: TypeId = TypeId(6);
    pub const CHARACTER: TypeId = TypeId(7);
    pub const EXCEPTION: TypeId = TypeId(8);

    /// Number of pre-registered built-in types.
    pub const BUILTIN_COUNT: u32 = 9;

    /// A node the semantic passes never resolved.
    pub const UNRESOLVED: TypeId = TypeId(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        TypeId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_resolved(self) -> bool {
        self.0 != u32::MAX
    }

    #[inline]
    pub const fn is_void(self) -> bool {
        self.0 == Self::VOID.0
    }

    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.0 < Self::BUILTIN_COUNT
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TypeId::VOID => write!(f, "Void"),
            TypeId::PRIMITIVE_BOOLEAN => write!(f, "boolean"),
            TypeId::ANY => write!(f, "Any"),
            TypeId::BOOLEAN => write!(f, "Boolean"),
            TypeId::INTEGER => write!(f, "Integer"),
            TypeId::FLOAT => write!(f, "Float"),
            TypeId::STRING => write!(f, "String"),
            TypeId::CHARACTER => write!(f, "Character"),
            TypeId::EXCEPTION => write!(f, "Exception"),
            TypeId::UNRESOLVED => write!(f, "TypeId::UNRESOLVED"),
            TypeId(n) => write!(f, "TypeId({n})"),
        }
    }
}

/// A specific method overload: the owning type plus its slot in that
/// type's method table.
///
/// Semantic analysis records this on call sites it already resolved.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodRef {
    pub owner: TypeId,
    pub slot: u32,
}

impl MethodRef {
    #[inline]
    pub const fn new(owner: TypeId, slot: u32) -> Self {
        MethodRef { owner, slot }
    }
}
