//! Storage slot descriptors.
//!
//! A [`SlotDescriptor`] identifies one named, typed storage location within instances of its
//! declaring type. Descriptors are created by the [`TypeBuilder`](crate::TypeBuilder) together
//! with their owner and are immutable afterwards. The raw byte offset they carry is opaque
//! outside this crate and only ever dereferenced by the gateway.

use std::{fmt, mem};

use crate::{
    typesystem::{PrimitiveKind, SlotAttributes, TypeRef, TypeToken, Visibility},
    value::{ManagedObject, Value},
};

/// Opaque byte offset of a slot inside instance storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotOffset(pub(crate) usize);

/// How a slot is represented in raw storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotRepr {
    /// An inline primitive value
    Primitive(PrimitiveKind),
    /// A nullable pointer to a managed object
    Reference,
}

impl SlotRepr {
    pub(crate) fn size(self) -> usize {
        match self {
            SlotRepr::Primitive(kind) => kind.size(),
            SlotRepr::Reference => mem::size_of::<*const ManagedObject>(),
        }
    }

    pub(crate) fn align(self) -> usize {
        match self {
            SlotRepr::Primitive(kind) => kind.align(),
            SlotRepr::Reference => mem::align_of::<*const ManagedObject>(),
        }
    }
}

/// The declared type of a storage slot.
#[derive(Clone)]
pub enum SlotType {
    /// Slot holds a primitive value inline
    Primitive(PrimitiveKind),
    /// Slot holds a (nullable) reference to an object assignable to `ty`
    Reference {
        /// Declared reference type
        ty: TypeRef,
        /// Actual type arguments if the declaration is parameterized
        type_args: Vec<TypeRef>,
    },
}

impl SlotType {
    /// A reference slot of the given declared type
    #[must_use]
    pub fn reference(ty: &TypeRef) -> Self {
        SlotType::Reference {
            ty: ty.clone(),
            type_args: Vec::new(),
        }
    }

    /// A parameterized reference slot, e.g. `List<String>`
    #[must_use]
    pub fn generic<I>(ty: &TypeRef, type_args: I) -> Self
    where
        I: IntoIterator<Item = TypeRef>,
    {
        SlotType::Reference {
            ty: ty.clone(),
            type_args: type_args.into_iter().collect(),
        }
    }

    /// Name of the declared type, including type arguments
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            SlotType::Primitive(kind) => kind.name().to_string(),
            SlotType::Reference { ty, type_args } if type_args.is_empty() => ty.name().to_string(),
            SlotType::Reference { ty, type_args } => {
                let args: Vec<&str> = type_args.iter().map(|arg| arg.name()).collect();
                format!("{}<{}>", ty.name(), args.join(", "))
            }
        }
    }

    /// Returns `true` if `value` may be stored in a slot of this type.
    ///
    /// Primitive slots accept exactly their own kind. Reference slots accept `null` and any
    /// object whose runtime type is assignable to the declared type; type arguments are not
    /// checked, matching erased generics.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (SlotType::Primitive(kind), value) => value.primitive_kind() == Some(*kind),
            (SlotType::Reference { .. }, Value::Null) => true,
            (SlotType::Reference { ty, .. }, Value::Ref(object)) => {
                ty.is_assignable_from(&object.type_descriptor())
            }
            (SlotType::Reference { .. }, _) => false,
        }
    }

    /// Returns `true` if both types are equal once type arguments are erased
    #[must_use]
    pub fn same_erasure(&self, other: &SlotType) -> bool {
        match (self, other) {
            (SlotType::Primitive(a), SlotType::Primitive(b)) => a == b,
            (SlotType::Reference { ty: a, .. }, SlotType::Reference { ty: b, .. }) => {
                a.same_type(b)
            }
            _ => false,
        }
    }

    /// The value an all-zero slot of this type represents
    #[must_use]
    pub fn zero(&self) -> Value {
        match self {
            SlotType::Primitive(kind) => kind.zero(),
            SlotType::Reference { .. } => Value::Null,
        }
    }

    pub(crate) fn repr(&self) -> SlotRepr {
        match self {
            SlotType::Primitive(kind) => SlotRepr::Primitive(*kind),
            SlotType::Reference { .. } => SlotRepr::Reference,
        }
    }
}

impl From<PrimitiveKind> for SlotType {
    fn from(kind: PrimitiveKind) -> Self {
        SlotType::Primitive(kind)
    }
}

impl From<&TypeRef> for SlotType {
    fn from(ty: &TypeRef) -> Self {
        match ty.primitive_kind() {
            Some(kind) => SlotType::Primitive(kind),
            None => SlotType::reference(ty),
        }
    }
}

impl fmt::Debug for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// One named, typed storage location within instances of a type.
#[derive(Clone)]
pub struct SlotDescriptor {
    pub(crate) owner: TypeToken,
    pub(crate) owner_name: String,
    pub(crate) name: String,
    pub(crate) ty: SlotType,
    pub(crate) flags: SlotAttributes,
    pub(crate) offset: SlotOffset,
    pub(crate) index: usize,
}

impl SlotDescriptor {
    /// Name of the slot
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type of the slot
    #[must_use]
    pub fn slot_type(&self) -> &SlotType {
        &self.ty
    }

    /// Token of the type declaring this slot
    #[must_use]
    pub fn owner(&self) -> TypeToken {
        self.owner
    }

    /// Simple name of the type declaring this slot
    #[must_use]
    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// Position of the slot in its owner's declaration order
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Modifier flags of the slot
    #[must_use]
    pub fn flags(&self) -> SlotAttributes {
        self.flags
    }

    /// Visibility class of the slot
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        Visibility::of_slot(self.flags)
    }

    /// Returns `true` if the slot may only be assigned by a constructor
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.flags.contains(SlotAttributes::FINAL)
    }

    /// The actual type arguments of a parameterized reference slot.
    ///
    /// Returns `None` for primitive slots and for reference slots declared without type
    /// arguments.
    #[must_use]
    pub fn actual_type_arguments(&self) -> Option<&[TypeRef]> {
        match &self.ty {
            SlotType::Reference { type_args, .. } if !type_args.is_empty() => Some(type_args),
            _ => None,
        }
    }

    pub(crate) fn offset(&self) -> SlotOffset {
        self.offset
    }
}

impl fmt::Debug for SlotDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotDescriptor")
            .field("owner", &self.owner_name)
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("flags", &self.flags)
            .field("offset", &self.offset)
            .finish()
    }
}

impl fmt::Display for SlotDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.owner_name, self.name, self.ty)
    }
}
