//! Type and method definitions.

use smallvec::SmallVec;

use ek9_tree::{Name, TypeId};

use crate::SideEffects;

/// Kind of declared type.
///
/// Trait-genus receivers are dispatched through an interface call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Genus {
    Void,
    /// Machine-level value, never reference counted.
    Primitive,
    Class,
    Trait,
    Record,
    Function,
}

impl Genus {
    /// Whether values of this genus are reference counted.
    #[inline]
    pub const fn is_managed(self) -> bool {
        !matches!(self, Genus::Void | Genus::Primitive)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodDef {
    pub name: Name,
    pub params: SmallVec<[TypeId; 2]>,
    pub returns: TypeId,
    pub effects: SideEffects,
    /// Rough cost estimate for optimizers.
    pub complexity: u32,
    pub constructor: bool,
}

impl MethodDef {
    pub fn new(name: Name, params: &[TypeId], returns: TypeId) -> Self {
        MethodDef {
            name,
            params: params.iter().copied().collect(),
            returns,
            effects: SideEffects::empty(),
            complexity: 1,
            constructor: false,
        }
    }

    #[must_use]
    pub fn with_effects(mut self, effects: SideEffects) -> Self {
        self.effects = effects;
        self
    }

    #[must_use]
    pub fn with_complexity(mut self, complexity: u32) -> Self {
        self.complexity = complexity;
        self
    }

    #[must_use]
    pub fn as_constructor(mut self) -> Self {
        self.constructor = true;
        self
    }

    #[inline]
    pub fn is_pure(&self) -> bool {
        self.effects.is_pure()
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeDef {
    pub name: Name,
    pub genus: Genus,
    /// Direct supertypes and traits, nearest first.
    pub supers: SmallVec<[TypeId; 2]>,
    /// Type this one converts into through `_promote`.
    pub promotes_to: Option<TypeId>,
    pub methods: Vec<MethodDef>,
}

impl TypeDef {
    pub fn new(name: Name, genus: Genus) -> Self {
        TypeDef {
            name,
            genus,
            supers: SmallVec::new(),
            promotes_to: None,
            methods: Vec::new(),
        }
    }
}
