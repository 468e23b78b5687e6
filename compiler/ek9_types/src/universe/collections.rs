//! Parameterized `List of T` and `Iterator of T`.
//!
//! Created on demand and cached so each element type maps to one id.

use ek9_tree::{StringInterner, TypeId};

use super::{CollectionKind, TypeUniverse};
use crate::{Genus, MethodDef, SideEffects, TypeDef};

impl TypeUniverse {
    /// `Iterator of element`: `hasNext()` and `next()`.
    pub fn iterator_of(&mut self, element: TypeId, interner: &StringInterner) -> TypeId {
        if let Some(&id) = self.collections.get(&(CollectionKind::Iterator, element)) {
            return id;
        }
        let label = format!("Iterator of {}", interner.lookup(self.name(element)));
        let id = self.define(Self::collection_def(interner, &label));
        let method = |name: &str, returns: TypeId| MethodDef::new(interner.intern(name), &[], returns);
        self.add_method(id, method("_isSet", TypeId::BOOLEAN));
        self.add_method(id, method("hasNext", TypeId::BOOLEAN));
        self.add_method(
            id,
            method("next", element).with_effects(SideEffects::THIS_MUTATION),
        );
        self.collections
            .insert((CollectionKind::Iterator, element), id);
        id
    }

    /// `List of element`: construction, `+=`, `iterator()` and length.
    pub fn list_of(&mut self, element: TypeId, interner: &StringInterner) -> TypeId {
        if let Some(&id) = self.collections.get(&(CollectionKind::List, element)) {
            return id;
        }
        let iterator = self.iterator_of(element, interner);
        let label = format!("List of {}", interner.lookup(self.name(element)));
        let id = self.define(Self::collection_def(interner, &label));
        let name = interner.intern(&label);
        self.add_method(id, MethodDef::new(name, &[], id).as_constructor());
        self.add_method(
            id,
            MethodDef::new(interner.intern("_addAss"), &[element], TypeId::VOID)
                .with_effects(SideEffects::THIS_MUTATION),
        );
        self.add_method(
            id,
            MethodDef::new(interner.intern("iterator"), &[], iterator)
                .with_effects(SideEffects::RETURN_MUTATION),
        );
        self.add_method(
            id,
            MethodDef::new(interner.intern("_len"), &[], TypeId::INTEGER),
        );
        self.add_method(
            id,
            MethodDef::new(interner.intern("_isSet"), &[], TypeId::BOOLEAN),
        );
        self.collections.insert((CollectionKind::List, element), id);
        id
    }

    fn collection_def(interner: &StringInterner, label: &str) -> TypeDef {
        let mut def = TypeDef::new(interner.intern(label), Genus::Class);
        def.supers.push(TypeId::ANY);
        def
    }
}
