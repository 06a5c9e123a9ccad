//! Modifier flags for types and storage slots.

use bitflags::bitflags;
use strum::Display;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Modifiers of a type
    ///
    /// At most one of `PUBLIC`, `PROTECTED` and `PRIVATE` is set; a type with none of them
    /// has package visibility.
    pub struct TypeAttributes: u32 {
        /// Type is visible everywhere
        const PUBLIC = 0x0001;
        /// Type is only visible to its enclosing type
        const PRIVATE = 0x0002;
        /// Type is visible to its enclosing type and subtypes of it
        const PROTECTED = 0x0004;
        /// Type does not capture an enclosing instance
        const STATIC = 0x0008;
        /// Type has no allocatable shape of its own
        const ABSTRACT = 0x0010;
        /// Type cannot be extended
        const FINAL = 0x0020;
        /// Type can only be extended by an explicit set of types
        const SEALED = 0x0040;
    }
}

/// Mask of all visibility bits in [`TypeAttributes`]
pub const TYPE_VISIBILITY_MASK: TypeAttributes = TypeAttributes::PUBLIC
    .union(TypeAttributes::PRIVATE)
    .union(TypeAttributes::PROTECTED);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Modifiers of a storage slot
    pub struct SlotAttributes: u32 {
        /// Slot is visible everywhere
        const PUBLIC = 0x0001;
        /// Slot is only visible to its declaring type
        const PRIVATE = 0x0002;
        /// Slot is visible to its declaring type and subtypes
        const PROTECTED = 0x0004;
        /// Slot may only be assigned by a constructor
        const FINAL = 0x0010;
    }
}

/// Mask of all visibility bits in [`SlotAttributes`]
pub const SLOT_VISIBILITY_MASK: SlotAttributes = SlotAttributes::PUBLIC
    .union(SlotAttributes::PRIVATE)
    .union(SlotAttributes::PROTECTED);

/// Visibility class of a type or slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    /// Visible everywhere
    Public,
    /// Visible to the declaring scope and its subtypes
    Protected,
    /// Visible to the declaring scope only
    Private,
    /// Visible inside the declaring package (no modifier)
    #[default]
    Package,
}

impl Visibility {
    /// Decode the visibility bits of a type
    #[must_use]
    pub fn of_type(flags: TypeAttributes) -> Self {
        if flags.contains(TypeAttributes::PUBLIC) {
            Visibility::Public
        } else if flags.contains(TypeAttributes::PROTECTED) {
            Visibility::Protected
        } else if flags.contains(TypeAttributes::PRIVATE) {
            Visibility::Private
        } else {
            Visibility::Package
        }
    }

    /// Decode the visibility bits of a slot
    #[must_use]
    pub fn of_slot(flags: SlotAttributes) -> Self {
        if flags.contains(SlotAttributes::PUBLIC) {
            Visibility::Public
        } else if flags.contains(SlotAttributes::PROTECTED) {
            Visibility::Protected
        } else if flags.contains(SlotAttributes::PRIVATE) {
            Visibility::Private
        } else {
            Visibility::Package
        }
    }

    /// The type flag encoding this visibility
    #[must_use]
    pub fn type_flags(self) -> TypeAttributes {
        match self {
            Visibility::Public => TypeAttributes::PUBLIC,
            Visibility::Protected => TypeAttributes::PROTECTED,
            Visibility::Private => TypeAttributes::PRIVATE,
            Visibility::Package => TypeAttributes::empty(),
        }
    }

    /// The slot flag encoding this visibility
    #[must_use]
    pub fn slot_flags(self) -> SlotAttributes {
        match self {
            Visibility::Public => SlotAttributes::PUBLIC,
            Visibility::Protected => SlotAttributes::PROTECTED,
            Visibility::Private => SlotAttributes::PRIVATE,
            Visibility::Package => SlotAttributes::empty(),
        }
    }
}
