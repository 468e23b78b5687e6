//! Built-in types and their operator methods.
//!
//! Registration order must match the fixed `TypeId` constants.

use ek9_tree::{StringInterner, TypeId};

use super::TypeUniverse;
use crate::{Genus, MethodDef, SideEffects, TypeDef};

const ARITHMETIC: &[&str] = &["_add", "_sub", "_mul", "_div"];
const COMPARISON: &[&str] = &["_lt", "_lteq", "_gt", "_gteq", "_eq", "_neq"];
const COMPOUND: &[&str] = &["_addAss", "_subAss", "_mulAss", "_divAss"];

struct Installer<'a> {
    universe: &'a mut TypeUniverse,
    interner: &'a StringInterner,
}

impl Installer<'_> {
    fn ty(&mut self, name: &str, genus: Genus, expected: TypeId) {
        let mut def = TypeDef::new(self.interner.intern(name), genus);
        if genus == Genus::Class && expected != TypeId::ANY {
            def.supers.push(TypeId::ANY);
        }
        let id = self.universe.define(def);
        debug_assert_eq!(id, expected, "built-in {name} out of order");
    }

    fn method(&mut self, owner: TypeId, name: &str, params: &[TypeId], returns: TypeId) {
        self.effectful(owner, name, params, returns, SideEffects::empty());
    }

    fn effectful(
        &mut self,
        owner: TypeId,
        name: &str,
        params: &[TypeId],
        returns: TypeId,
        effects: SideEffects,
    ) {
        let def = MethodDef::new(self.interner.intern(name), params, returns).with_effects(effects);
        self.universe.add_method(owner, def);
    }

    fn constructors(&mut self, owner: TypeId, name: &str, arg_lists: &[&[TypeId]]) {
        for params in arg_lists {
            let def = MethodDef::new(self.interner.intern(name), params, owner).as_constructor();
            self.universe.add_method(owner, def);
        }
    }

    /// Methods every built-in value type has.
    fn common(&mut self, owner: TypeId) {
        self.method(owner, "_isSet", &[], TypeId::BOOLEAN);
        self.method(owner, "_string", &[], TypeId::STRING);
        self.method(owner, "_hashcode", &[], TypeId::INTEGER);
        self.effectful(owner, "_copy", &[owner], TypeId::VOID, SideEffects::THIS_MUTATION);
    }

    fn ordered(&mut self, owner: TypeId) {
        for op in COMPARISON {
            self.method(owner, op, &[owner], TypeId::BOOLEAN);
        }
        self.method(owner, "_cmp", &[owner], TypeId::INTEGER);
    }

    fn numeric(&mut self, owner: TypeId) {
        for op in ARITHMETIC {
            self.method(owner, op, &[owner], owner);
        }
        for op in COMPOUND {
            self.effectful(owner, op, &[owner], TypeId::VOID, SideEffects::THIS_MUTATION);
        }
        self.method(owner, "_pow", &[owner], owner);
        self.method(owner, "_fuzzy", &[owner], TypeId::INTEGER);
        self.method(owner, "_negate", &[], owner);
        self.method(owner, "_inc", &[], owner);
        self.method(owner, "_dec", &[], owner);
        self.method(owner, "abs", &[], owner);
        self.method(owner, "sqrt", &[], TypeId::FLOAT);
    }
}

pub(super) fn install(universe: &mut TypeUniverse, interner: &StringInterner) {
    let mut i = Installer { universe, interner };

    i.ty("Void", Genus::Void, TypeId::VOID);
    i.ty("boolean", Genus::Primitive, TypeId::PRIMITIVE_BOOLEAN);
    i.ty("Any", Genus::Class, TypeId::ANY);
    i.ty("Boolean", Genus::Class, TypeId::BOOLEAN);
    i.ty("Integer", Genus::Class, TypeId::INTEGER);
    i.ty("Float", Genus::Class, TypeId::FLOAT);
    i.ty("String", Genus::Class, TypeId::STRING);
    i.ty("Character", Genus::Class, TypeId::CHARACTER);
    i.ty("Exception", Genus::Class, TypeId::EXCEPTION);

    i.method(TypeId::ANY, "_isSet", &[], TypeId::BOOLEAN);

    // Boolean
    let b = TypeId::BOOLEAN;
    i.constructors(b, "Boolean", &[&[], &[b]]);
    i.common(b);
    i.method(b, "_true", &[], TypeId::PRIMITIVE_BOOLEAN);
    i.method(b, "_eq", &[b], b);
    i.method(b, "_neq", &[b], b);
    i.method(b, "_cmp", &[b], TypeId::INTEGER);
    i.method(b, "_and", &[b], b);
    i.method(b, "_or", &[b], b);
    i.method(b, "_xor", &[b], b);
    i.method(b, "_negate", &[], b);

    // Integer
    let int = TypeId::INTEGER;
    i.constructors(int, "Integer", &[&[], &[int]]);
    i.common(int);
    i.ordered(int);
    i.numeric(int);
    i.method(int, "_mod", &[int], int);
    i.method(int, "_rem", &[int], int);
    i.method(int, "_promote", &[], TypeId::FLOAT);
    i.universe.set_promotion(int, TypeId::FLOAT);

    // Float
    let float = TypeId::FLOAT;
    i.constructors(float, "Float", &[&[], &[float]]);
    i.common(float);
    i.ordered(float);
    i.numeric(float);

    // String
    let s = TypeId::STRING;
    i.constructors(s, "String", &[&[], &[s]]);
    i.common(s);
    i.ordered(s);
    i.method(s, "_add", &[s], s);
    i.effectful(s, "_addAss", &[s], TypeId::VOID, SideEffects::THIS_MUTATION);
    i.method(s, "_len", &[], int);
    i.method(s, "_empty", &[], b);
    i.method(s, "_prefix", &[], TypeId::CHARACTER);
    i.method(s, "_suffix", &[], TypeId::CHARACTER);

    // Character
    let ch = TypeId::CHARACTER;
    i.constructors(ch, "Character", &[&[], &[ch]]);
    i.common(ch);
    i.ordered(ch);
    i.method(ch, "_inc", &[], ch);
    i.method(ch, "_dec", &[], ch);
    i.method(ch, "_promote", &[], s);
    i.universe.set_promotion(ch, s);

    // Exception
    let ex = TypeId::EXCEPTION;
    i.constructors(ex, "Exception", &[&[], &[s]]);
    i.method(ex, "_isSet", &[], b);
    i.method(ex, "_string", &[], s);
    i.method(ex, "message", &[], s);
}
