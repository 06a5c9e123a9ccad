//! Concurrent registry of type descriptors.
//!
//! The [`TypeRegistry`] is the provider of descriptors for a program: it starts out with all
//! [`CoreLibrary`](crate::CoreLibrary) types, accepts user types built with the
//! [`TypeBuilder`](crate::TypeBuilder) and hands out shared array types.
//!
//! # Concurrency Design
//!
//! - Lock-free primary storage using `SkipMap`, keyed by [`TypeToken`]
//! - Concurrent secondary indices using `DashMap`
//! - Array types are created at most once per component type

use crossbeam_skiplist::SkipMap;
use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    typesystem::{corelib, TypeBuilder, TypeRef, TypeToken},
    Error, Result,
};

/// Central registry for all known types
///
/// # Examples
///
/// ```rust,no_run
/// use bareforge::prelude::*;
///
/// let registry = TypeRegistry::new();
/// let point = TypeBuilder::composite("geo", "Point")
///     .component("x", PrimitiveKind::I32)
///     .build()?;
/// registry.insert(&point)?;
///
/// assert!(registry.get_by_fullname("geo.Point").is_some());
/// let points = registry.array_of(&point)?;
/// assert_eq!(points.name(), "Point[]");
/// # Ok::<(), bareforge::Error>(())
/// ```
pub struct TypeRegistry {
    /// Primary type storage indexed by token
    types: SkipMap<TypeToken, TypeRef>,
    /// Secondary index: full name (namespace.name) to token
    types_by_fullname: DashMap<String, TypeToken>,
    /// Secondary index: simple name to all tokens with that name
    types_by_name: DashMap<String, Vec<TypeToken>>,
    /// Array types by the token of their component type
    arrays: DashMap<TypeToken, TypeRef>,
}

impl TypeRegistry {
    /// Create a registry seeded with the core library
    #[must_use]
    pub fn new() -> Self {
        let registry = TypeRegistry {
            types: SkipMap::new(),
            types_by_fullname: DashMap::new(),
            types_by_name: DashMap::new(),
            arrays: DashMap::new(),
        };

        for ty in corelib().types() {
            registry.index(ty);
        }

        registry
    }

    fn index(&self, ty: &TypeRef) {
        self.types.insert(ty.token(), ty.clone());
        self.types_by_fullname.insert(ty.fullname(), ty.token());
        self.types_by_name
            .entry(ty.name().to_string())
            .or_default()
            .push(ty.token());
    }

    /// Register a type
    ///
    /// ## Arguments
    /// * 'ty' - The type to register
    ///
    /// # Errors
    /// Returns [`Error::TypeInsert`] if a type with the same full name is already registered.
    pub fn insert(&self, ty: &TypeRef) -> Result<()> {
        match self.types_by_fullname.entry(ty.fullname()) {
            Entry::Occupied(_) => return Err(Error::TypeInsert(ty.fullname())),
            Entry::Vacant(slot) => {
                slot.insert(ty.token());
            }
        }

        self.types.insert(ty.token(), ty.clone());
        self.types_by_name
            .entry(ty.name().to_string())
            .or_default()
            .push(ty.token());
        Ok(())
    }

    /// Look up a type by token
    #[must_use]
    pub fn get(&self, token: &TypeToken) -> Option<TypeRef> {
        self.types.get(token).map(|entry| entry.value().clone())
    }

    /// Look up a type by its full name
    #[must_use]
    pub fn get_by_fullname(&self, fullname: &str) -> Option<TypeRef> {
        let token = *self.types_by_fullname.get(fullname)?;
        self.get(&token)
    }

    /// Like [`TypeRegistry::get_by_fullname`], but fails if the type is unknown
    ///
    /// # Errors
    /// Returns [`Error::TypeNotFound`] if no type has the given full name.
    pub fn resolve(&self, fullname: &str) -> Result<TypeRef> {
        self.get_by_fullname(fullname)
            .ok_or_else(|| Error::TypeNotFound(fullname.to_string()))
    }

    /// All types with the given simple name, in registration order
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Vec<TypeRef> {
        if let Some(tokens) = self.types_by_name.get(name) {
            tokens.iter().filter_map(|token| self.get(token)).collect()
        } else {
            Vec::new()
        }
    }

    /// The shared array type of `component`, created on first request
    ///
    /// # Errors
    /// Returns an error if the array type cannot be described.
    pub fn array_of(&self, component: &TypeRef) -> Result<TypeRef> {
        let array = match self.arrays.entry(component.token()) {
            Entry::Occupied(entry) => return Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let array = TypeBuilder::array_of(component).build()?;
                entry.insert(array.clone());
                array
            }
        };

        self.index(&array);
        Ok(array)
    }

    /// Map a primitive type to its wrapper class; every other type maps to itself
    #[must_use]
    pub fn force_wrapper_type(&self, ty: &TypeRef) -> TypeRef {
        corelib().force_wrapper_type(ty)
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All registered types in token order
    #[must_use]
    pub fn all_types(&self) -> Vec<TypeRef> {
        self.types.iter().map(|entry| entry.value().clone()).collect()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rayon::prelude::*;
    use strum::EnumCount;

    use super::*;
    use crate::typesystem::{PrimitiveKind, TypeShape};

    #[test]
    fn seeded_with_core_library() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.len(), 2 + 2 * PrimitiveKind::COUNT);
        assert!(!registry.is_empty());
        assert_eq!(
            registry.get_by_fullname("Object").unwrap().token(),
            corelib().object().token()
        );
        assert!(registry.get_by_fullname("Int32").is_some());
        assert!(registry.get_by_fullname("i32").unwrap().is_primitive());
        assert!(matches!(
            registry.resolve("Missing"),
            Err(Error::TypeNotFound(name)) if name == "Missing"
        ));
    }

    #[test]
    fn insert_rejects_duplicate_fullname() {
        let registry = TypeRegistry::new();
        let first = TypeBuilder::class("app", "Thing").build().unwrap();
        let second = TypeBuilder::class("app", "Thing").build().unwrap();
        let other = TypeBuilder::class("lib", "Thing").build().unwrap();

        registry.insert(&first).unwrap();
        assert!(matches!(
            registry.insert(&second),
            Err(Error::TypeInsert(name)) if name == "app.Thing"
        ));
        registry.insert(&other).unwrap();

        assert_eq!(registry.get(&first.token()).unwrap().token(), first.token());
        assert!(registry.get(&second.token()).is_none());
        assert_eq!(registry.get_by_name("Thing").len(), 2);
    }

    #[test]
    fn array_types_are_shared() {
        let registry = TypeRegistry::new();
        let int = corelib().primitive(PrimitiveKind::I32);

        let arrays: Vec<TypeRef> = (0..64)
            .into_par_iter()
            .map(|_| registry.array_of(&int).unwrap())
            .collect();

        assert!(arrays.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
        assert_eq!(registry.get_by_fullname("i32[]").unwrap().token(), arrays[0].token());
        assert!(arrays[0].is_array());
    }

    #[test]
    fn wrapper_lookup() {
        let registry = TypeRegistry::new();
        let wrapper = registry.force_wrapper_type(&corelib().primitive(PrimitiveKind::Char));
        assert_eq!(wrapper.name(), "Char");
        assert_eq!(registry.all_types().len(), registry.len());
    }
}
