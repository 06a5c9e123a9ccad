//! The built-in core library types.
//!
//! The [`CoreLibrary`] is built once per process on first use and holds the root `Object`
//! class, the final `String` class, the eight primitive types and one boxed wrapper class
//! per primitive. Wrappers are public final classes with a single private final slot named
//! [`WRAPPER_VALUE_SLOT`] and a constructor taking that value.

use std::{
    alloc::Layout,
    sync::{Arc, OnceLock},
};

use strum::IntoEnumIterator;

use crate::typesystem::{
    Constructor, PrimitiveKind, SlotAttributes, SlotDescriptor, SlotOffset, SlotType,
    TypeAttributes, TypeDescriptor, TypeKind, TypeRef, TypeToken,
};

/// Name of the slot holding the value of a wrapper instance
pub const WRAPPER_VALUE_SLOT: &str = "value";

static CORELIB: OnceLock<CoreLibrary> = OnceLock::new();

/// Access the process-wide core library
pub fn corelib() -> &'static CoreLibrary {
    CORELIB.get_or_init(CoreLibrary::bootstrap)
}

/// Built-in types every registry starts with
pub struct CoreLibrary {
    object: TypeRef,
    string: TypeRef,
    primitives: Vec<TypeRef>,
    wrappers: Vec<TypeRef>,
}

impl CoreLibrary {
    fn bootstrap() -> Self {
        let object = Arc::new(TypeDescriptor {
            token: TypeToken::next(),
            namespace: String::new(),
            name: "Object".to_string(),
            kind: TypeKind::Class,
            flags: TypeAttributes::PUBLIC,
            base: None,
            interfaces: Vec::new(),
            slots: Vec::new(),
            layout: Layout::new::<()>(),
            constructors: vec![Constructor::default()],
        });

        let string = Arc::new(TypeDescriptor {
            token: TypeToken::next(),
            namespace: String::new(),
            name: "String".to_string(),
            kind: TypeKind::Class,
            flags: TypeAttributes::PUBLIC | TypeAttributes::FINAL,
            base: Some(object.clone()),
            interfaces: Vec::new(),
            slots: Vec::new(),
            layout: Layout::new::<()>(),
            constructors: Vec::new(),
        });

        let primitives = PrimitiveKind::iter()
            .map(|kind| {
                Arc::new(TypeDescriptor {
                    token: TypeToken::next(),
                    namespace: String::new(),
                    name: kind.name().to_string(),
                    kind: TypeKind::Primitive(kind),
                    flags: TypeAttributes::PUBLIC | TypeAttributes::FINAL,
                    base: None,
                    interfaces: Vec::new(),
                    slots: Vec::new(),
                    layout: Layout::new::<()>(),
                    constructors: Vec::new(),
                })
            })
            .collect();

        let wrappers = PrimitiveKind::iter()
            .map(|kind| Self::wrapper_for(kind, &object))
            .collect();

        CoreLibrary {
            object,
            string,
            primitives,
            wrappers,
        }
    }

    fn wrapper_for(kind: PrimitiveKind, object: &TypeRef) -> TypeRef {
        let token = TypeToken::next();
        let name = kind.wrapper_name().to_string();
        let value = SlotDescriptor {
            owner: token,
            owner_name: name.clone(),
            name: WRAPPER_VALUE_SLOT.to_string(),
            ty: SlotType::Primitive(kind),
            flags: SlotAttributes::PRIVATE | SlotAttributes::FINAL,
            offset: SlotOffset(0),
            index: 0,
        };

        Arc::new(TypeDescriptor {
            token,
            namespace: String::new(),
            name,
            kind: TypeKind::Class,
            flags: TypeAttributes::PUBLIC | TypeAttributes::FINAL,
            base: Some(object.clone()),
            interfaces: Vec::new(),
            slots: vec![value],
            layout: kind.layout(),
            constructors: vec![Constructor::new([(
                WRAPPER_VALUE_SLOT,
                SlotType::Primitive(kind),
            )])],
        })
    }

    /// The root of the class hierarchy
    #[must_use]
    pub fn object(&self) -> TypeRef {
        self.object.clone()
    }

    /// The built-in string class
    #[must_use]
    pub fn string(&self) -> TypeRef {
        self.string.clone()
    }

    /// The descriptor of a primitive type
    #[must_use]
    pub fn primitive(&self, kind: PrimitiveKind) -> TypeRef {
        self.primitives[kind as usize].clone()
    }

    /// The boxed wrapper class of a primitive type
    #[must_use]
    pub fn wrapper(&self, kind: PrimitiveKind) -> TypeRef {
        self.wrappers[kind as usize].clone()
    }

    /// The primitive a wrapper class boxes, `None` for any other type
    #[must_use]
    pub fn wrapped_primitive(&self, ty: &TypeDescriptor) -> Option<PrimitiveKind> {
        PrimitiveKind::iter().find(|kind| self.wrappers[*kind as usize].token == ty.token)
    }

    /// Map a primitive type to its wrapper class; every other type maps to itself
    #[must_use]
    pub fn force_wrapper_type(&self, ty: &TypeRef) -> TypeRef {
        match ty.primitive_kind() {
            Some(kind) => self.wrapper(kind),
            None => ty.clone(),
        }
    }

    /// All core library types
    pub fn types(&self) -> impl Iterator<Item = &TypeRef> {
        [&self.object, &self.string]
            .into_iter()
            .chain(self.primitives.iter())
            .chain(self.wrappers.iter())
    }
}
