//! Registry of builtin, user-declared and function types.
//!
//! Function types are memoized structurally: asking twice for the same
//! (return, params, purity) from one store yields the same `Arc`. The memo
//! key is the type vector itself, not a concatenation of ids, so distinct
//! parameter lists can never alias.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::cast;
use crate::ty::{Builtin, FunctionType, NamedType, Type, TypeId};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct FunctionSignature {
    return_type: Type,
    param_types: Vec<Type>,
    is_pure: bool,
}

/// Owner of every type of one compilation unit.
#[derive(Debug)]
pub struct TypeStore {
    /// Index is the type's id.
    types_by_id: Vec<Type>,
    function_types: FxHashMap<FunctionSignature, Type>,
    named_types: FxHashMap<String, Type>,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    pub fn new() -> Self {
        TypeStore {
            types_by_id: Builtin::ALL.iter().map(|b| Type::Builtin(*b)).collect(),
            function_types: FxHashMap::default(),
            named_types: FxHashMap::default(),
        }
    }

    fn next_id(&self) -> TypeId {
        TypeId(self.types_by_id.len() as u32)
    }

    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.types_by_id.get(id.0 as usize)
    }

    /// Number of registered types, builtins included.
    pub fn len(&self) -> usize {
        self.types_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types_by_id.is_empty()
    }

    /// The memoized function type for this signature.
    ///
    /// A pure nullary function type is still a function type (arity 0);
    /// callers decide whether to treat it as a plain value.
    pub fn get_function_type(
        &mut self,
        return_type: &Type,
        param_types: &[Type],
        is_pure: bool,
    ) -> Type {
        let signature = FunctionSignature {
            return_type: return_type.clone(),
            param_types: param_types.to_vec(),
            is_pure,
        };
        if let Some(existing) = self.function_types.get(&signature) {
            return existing.clone();
        }

        let ty = Type::Function(Arc::new(FunctionType {
            id: self.next_id(),
            return_type: signature.return_type.clone(),
            param_types: signature.param_types.clone(),
            is_pure,
        }));
        log::trace!("registered function type {} as {:?}", ty, ty.id());
        self.types_by_id.push(ty.clone());
        self.function_types.insert(signature, ty.clone());
        ty
    }

    /// Declare a user-defined type. Declaring an existing name returns the
    /// existing type.
    pub fn create_type(&mut self, name: &str) -> Type {
        self.create_named(name, false)
    }

    /// Declare a user-defined alias name.
    pub fn create_type_alias(&mut self, name: &str) -> Type {
        self.create_named(name, true)
    }

    fn create_named(&mut self, name: &str, is_type_alias: bool) -> Type {
        if let Some(existing) = self.named_types.get(name) {
            return existing.clone();
        }
        let ty = Type::Named(Arc::new(NamedType {
            id: self.next_id(),
            name: name.to_string(),
            is_type_alias,
            cast_fn: cast::not_castable,
            concretize_fn: cast::not_concretizable,
        }));
        self.types_by_id.push(ty.clone());
        self.named_types.insert(name.to_string(), ty.clone());
        ty
    }

    pub fn lookup(&self, name: &str) -> Option<Type> {
        if let Some(b) = Builtin::ALL.iter().find(|b| b.name() == name) {
            return Some(Type::Builtin(*b));
        }
        self.named_types.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_has_only_builtins() {
        let store = TypeStore::new();
        assert_eq!(store.len(), 9);
        assert_eq!(store.get(TypeId(4)), Some(&Type::INT));
        assert_eq!(store.get(TypeId(9)), None);
    }

    #[test]
    fn ids_increase_monotonically() {
        let mut store = TypeStore::new();
        let a = store.get_function_type(&Type::INT, &[Type::INT], true);
        let b = store.get_function_type(&Type::INT, &[Type::FLOAT], true);
        let c = store.create_type("Point");
        assert_eq!(a.id(), TypeId(9));
        assert_eq!(b.id(), TypeId(10));
        assert_eq!(c.id(), TypeId(11));
        assert!(store.get(TypeId(10)).is_some_and(|t| t.is_identical(&b)));
    }

    #[test]
    fn ids_that_would_collide_when_concatenated_stay_distinct() {
        let mut store = TypeStore::new();
        // Push ids into double digits.
        let mut extra = Vec::new();
        for i in 0..4 {
            extra.push(store.create_type(&format!("T{}", i)));
        }
        // [T(id 1x), Int] vs [Hole, T(id ...)] style lists must never alias.
        let a = store.get_function_type(&Type::INT, &[extra[0].clone(), Type::INT], true);
        let b = store.get_function_type(&Type::INT, &[Type::HOLE, extra[0].clone()], true);
        let c = store.get_function_type(&Type::INT, &[extra[1].clone()], true);
        assert!(!a.is_identical(&b));
        assert!(!a.is_identical(&c));
        assert_ne!(a, b);
    }

    #[test]
    fn purity_is_part_of_the_signature() {
        let mut store = TypeStore::new();
        let pure = store.get_function_type(&Type::VOID, &[], true);
        let impure = store.get_function_type(&Type::VOID, &[], false);
        assert!(!pure.is_identical(&impure));
        assert_eq!(pure.arity(), 0);
        assert!(!impure.is_pure());
    }

    #[test]
    fn create_type_is_idempotent() {
        let mut store = TypeStore::new();
        let a = store.create_type("Point");
        let b = store.create_type("Point");
        assert!(a.is_identical(&b));
        assert!(a.is_user_defined());
        assert!(!a.is_type_alias());
        assert_eq!(store.lookup("Point"), Some(a));
        assert_eq!(store.lookup("Float"), Some(Type::FLOAT));
        assert_eq!(store.lookup("Nope"), None);
    }
}
