//! The resolved type universe.
//!
//! Every type the generator can meet is a [`TypeDef`] indexed by
//! [`TypeId`]. Built-ins occupy the fixed slots named by the `TypeId`
//! constants; user types and parameterized collections follow.
//!
//! # Architecture
//!
//! ```text
//! TypeUniverse
//!     ├── defs: Vec<TypeDef>           (TypeId → definition)
//!     ├── by_name: FxHashMap<Name, _>  (lookup by declared name)
//!     └── collections: FxHashMap<_, _> (List of T / Iterator of T cache)
//! ```
//!
//! The universe is built once by semantic analysis and then shared
//! read-only between generator threads.

mod builtins;
mod collections;
mod resolve;

use rustc_hash::FxHashMap;

use ek9_tree::{MethodRef, Name, StringInterner, TypeId};

use crate::{Genus, MethodDef, TypeDef};

pub use resolve::{MatchCost, Resolution, ResolveError};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum CollectionKind {
    List,
    Iterator,
}

pub struct TypeUniverse {
    defs: Vec<TypeDef>,
    by_name: FxHashMap<Name, TypeId>,
    collections: FxHashMap<(CollectionKind, TypeId), TypeId>,
}

impl TypeUniverse {
    /// Create a universe holding the built-in types.
    pub fn new(interner: &StringInterner) -> Self {
        let mut universe = TypeUniverse {
            defs: Vec::with_capacity(32),
            by_name: FxHashMap::default(),
            collections: FxHashMap::default(),
        };
        builtins::install(&mut universe, interner);
        universe
    }

    /// Register a new type and return its id.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "over 4 billion types is not representable"
    )]
    pub fn define(&mut self, def: TypeDef) -> TypeId {
        let id = TypeId::new(self.defs.len() as u32);
        self.by_name.insert(def.name, id);
        tracing::trace!(ty = ?id, "defined type");
        self.defs.push(def);
        id
    }

    /// Convenience for a class or trait with no methods yet.
    pub fn define_named(&mut self, name: Name, genus: Genus, supers: &[TypeId]) -> TypeId {
        let mut def = TypeDef::new(name, genus);
        def.supers.extend(supers.iter().copied());
        self.define(def)
    }

    /// Append a method to `owner`. Returns `None` if `owner` is unknown.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "method tables are far below u32::MAX"
    )]
    pub fn add_method(&mut self, owner: TypeId, method: MethodDef) -> Option<MethodRef> {
        let def = self.defs.get_mut(owner.index())?;
        let slot = def.methods.len() as u32;
        def.methods.push(method);
        Some(MethodRef::new(owner, slot))
    }

    pub fn set_promotion(&mut self, from: TypeId, to: TypeId) {
        if let Some(def) = self.defs.get_mut(from.index()) {
            def.promotes_to = Some(to);
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[inline]
    pub fn get(&self, ty: TypeId) -> Option<&TypeDef> {
        if ty.is_resolved() {
            self.defs.get(ty.index())
        } else {
            None
        }
    }

    pub fn lookup(&self, name: Name) -> Option<TypeId> {
        self.by_name.get(&name).copied()
    }

    /// Declared name, or `Name::EMPTY` for an unknown id.
    pub fn name(&self, ty: TypeId) -> Name {
        self.get(ty).map_or(Name::EMPTY, |def| def.name)
    }

    pub fn genus(&self, ty: TypeId) -> Option<Genus> {
        self.get(ty).map(|def| def.genus)
    }

    /// Whether values of `ty` take part in retain/release.
    pub fn is_managed(&self, ty: TypeId) -> bool {
        self.genus(ty).is_some_and(Genus::is_managed)
    }

    pub fn is_trait(&self, ty: TypeId) -> bool {
        self.genus(ty) == Some(Genus::Trait)
    }

    pub fn method(&self, method: MethodRef) -> Option<&MethodDef> {
        self.get(method.owner)?
            .methods
            .get(method.slot as usize)
    }

    /// Methods of `ty` named `name`, own methods first, then inherited
    /// ones in supertype order.
    pub fn methods_named(&self, ty: TypeId, name: Name) -> Vec<(MethodRef, &MethodDef)> {
        let mut found = Vec::new();
        for owner in self.ancestry(ty) {
            let Some(def) = self.get(owner) else { continue };
            for (slot, method) in def.methods.iter().enumerate() {
                if method.name == name && !method.constructor {
                    let slot = u32::try_from(slot).unwrap_or(u32::MAX);
                    found.push((MethodRef::new(owner, slot), method));
                }
            }
        }
        found
    }

    /// Whether `ty` (or a supertype) declares a method `name` of `arity`.
    pub fn has_method(&self, ty: TypeId, name: Name, arity: usize) -> bool {
        self.methods_named(ty, name)
            .iter()
            .any(|(_, m)| m.arity() == arity)
    }

    /// `ty` followed by all of its supertypes, breadth first, each once.
    pub fn ancestry(&self, ty: TypeId) -> Vec<TypeId> {
        let mut order = vec![ty];
        let mut next = 0;
        while next < order.len() {
            let current = order[next];
            next += 1;
            if let Some(def) = self.get(current) {
                for &sup in &def.supers {
                    if !order.contains(&sup) {
                        order.push(sup);
                    }
                }
            }
        }
        order
    }

    /// Number of supertype edges from `from` up to `to`.
    pub fn super_distance(&self, from: TypeId, to: TypeId) -> Option<u32> {
        let mut frontier = vec![from];
        let mut seen = vec![from];
        let mut depth = 0;
        while !frontier.is_empty() {
            if frontier.contains(&to) {
                return Some(depth);
            }
            let mut next = Vec::new();
            for ty in frontier {
                if let Some(def) = self.get(ty) {
                    for &sup in &def.supers {
                        if !seen.contains(&sup) {
                            seen.push(sup);
                            next.push(sup);
                        }
                    }
                }
            }
            frontier = next;
            depth += 1;
        }
        None
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
