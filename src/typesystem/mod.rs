//! Type descriptors: the shape metadata every other component works on.
//!
//! This module provides an immutable, shareable description of managed types. A
//! [`TypeDescriptor`] knows what kind of shape it is (primitive, array, enum, composite,
//! interface or regular class), its modifiers, its parent and implemented interfaces, the
//! storage slots it declares and the raw layout of its instances.
//!
//! # Key Components
//!
//! - [`TypeDescriptor`] / [`TypeRef`]: the descriptor and its shared handle
//! - [`TypeShape`]: the predicate view used by the [`ShapeChecker`](crate::ShapeChecker)
//! - [`SlotDescriptor`]: one named, typed storage location
//! - [`TypeBuilder`]: fluent construction with build-time consistency checks
//! - [`CoreLibrary`]: the built-in root object, string, primitive and wrapper types
//! - [`TypeRegistry`]: concurrent lookup of descriptors by token and name
//!
//! # Shape Rules
//!
//! - **Primitives** are plain values; their instances live in slots, never on the heap
//! - **Arrays** have a component type and are always created through the gateway
//! - **Enums** are closed sets of constants and can never be instantiated
//! - **Composites** are immutable aggregates with exactly one canonical constructor
//! - **Interfaces** have no storage and can never be instantiated
//! - **Classes** are everything else; abstract classes cannot be instantiated
//!
//! # Examples
//!
//! ```rust,no_run
//! use bareforge::prelude::*;
//!
//! let point = TypeBuilder::composite("geo", "Point")
//!     .component("x", PrimitiveKind::F64)
//!     .component("y", PrimitiveKind::F64)
//!     .build()?;
//!
//! assert!(point.is_composite());
//! assert!(point.is_final());
//! for slot in point.all_slots() {
//!     println!("{}", slot);
//! }
//! # Ok::<(), bareforge::Error>(())
//! ```

mod attributes;
mod builder;
mod constructor;
mod corelib;
mod layout;
mod primitives;
mod registry;
mod slot;

use std::{
    alloc::Layout,
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

pub use attributes::{
    SlotAttributes, TypeAttributes, Visibility, SLOT_VISIBILITY_MASK, TYPE_VISIBILITY_MASK,
};
pub use builder::{TypeBuilder, MAX_HIERARCHY_DEPTH};
pub use constructor::{Constructor, ConstructorBody, Parameter};
pub use corelib::{corelib, CoreLibrary, WRAPPER_VALUE_SLOT};
pub use primitives::PrimitiveKind;
pub use registry::TypeRegistry;
pub use slot::{SlotDescriptor, SlotOffset, SlotType};

pub(crate) use slot::SlotRepr;

use crate::{
    checker::ShapeChecker,
    gateway::heap_gateway,
    value::{ObjectRef, Value},
    Error, Result,
};

/// Shared handle to an immutable type descriptor
pub type TypeRef = Arc<TypeDescriptor>;

static NEXT_TOKEN: AtomicU32 = AtomicU32::new(1);

/// Process-unique identity of a type descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeToken(u32);

impl TypeToken {
    pub(crate) fn next() -> Self {
        TypeToken(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// The fundamental shape of a type
#[derive(Clone)]
pub enum TypeKind {
    /// A primitive value type
    Primitive(PrimitiveKind),
    /// An array with the given component type
    Array {
        /// Type of the elements
        component: TypeRef,
    },
    /// An enumeration with a closed set of constants
    Enum,
    /// An immutable aggregate built by its canonical constructor
    Composite,
    /// A pure interface without storage
    Interface,
    /// Any other type
    Class,
}

impl fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Primitive(kind) => write!(f, "Primitive({})", kind),
            TypeKind::Array { component } => write!(f, "Array({})", component.name()),
            TypeKind::Enum => f.write_str("Enum"),
            TypeKind::Composite => f.write_str("Composite"),
            TypeKind::Interface => f.write_str("Interface"),
            TypeKind::Class => f.write_str("Class"),
        }
    }
}

/// Predicate view of a type's shape.
///
/// The kind predicates are required; the modifier predicates decode [`TypeShape::attributes`].
pub trait TypeShape {
    /// Simple (unqualified) name of the type
    fn simple_name(&self) -> &str;

    /// Modifier flags of the type
    fn attributes(&self) -> TypeAttributes;

    /// Returns `true` for primitive value types
    fn is_primitive(&self) -> bool;

    /// Returns `true` for array types
    fn is_array(&self) -> bool;

    /// Returns `true` for enumerations
    fn is_enum(&self) -> bool;

    /// Returns `true` for composites
    fn is_composite(&self) -> bool;

    /// Returns `true` for interfaces
    fn is_interface(&self) -> bool;

    /// Returns `true` if the type has no allocatable shape of its own
    fn is_abstract(&self) -> bool {
        self.attributes().contains(TypeAttributes::ABSTRACT)
    }

    /// Returns `true` if the type cannot be extended
    fn is_final(&self) -> bool {
        self.attributes().contains(TypeAttributes::FINAL)
    }

    /// Returns `true` if the type is publicly visible
    fn is_public(&self) -> bool {
        self.attributes().contains(TypeAttributes::PUBLIC)
    }

    /// Returns `true` if the type is private to its enclosing type
    fn is_private(&self) -> bool {
        self.attributes().contains(TypeAttributes::PRIVATE)
    }

    /// Returns `true` if the type is protected
    fn is_protected(&self) -> bool {
        self.attributes().contains(TypeAttributes::PROTECTED)
    }

    /// Returns `true` if the type does not capture an enclosing instance
    fn is_static(&self) -> bool {
        self.attributes().contains(TypeAttributes::STATIC)
    }

    /// Returns `true` if the set of subtypes is closed
    fn is_sealed(&self) -> bool {
        self.attributes().contains(TypeAttributes::SEALED)
    }
}

/// Immutable description of a managed type.
///
/// Descriptors are created by the [`TypeBuilder`] (or the [`CoreLibrary`]) and shared as
/// [`TypeRef`]. Identity is the [`TypeToken`]; two descriptors with the same name built
/// separately are different types.
pub struct TypeDescriptor {
    pub(crate) token: TypeToken,
    pub(crate) namespace: String,
    pub(crate) name: String,
    pub(crate) kind: TypeKind,
    pub(crate) flags: TypeAttributes,
    pub(crate) base: Option<TypeRef>,
    pub(crate) interfaces: Vec<TypeRef>,
    /// Own instance slots in declaration order
    pub(crate) slots: Vec<SlotDescriptor>,
    /// Complete instance storage, including all ancestors
    pub(crate) layout: Layout,
    pub(crate) constructors: Vec<Constructor>,
}

impl TypeDescriptor {
    /// Identity token
    #[must_use]
    pub fn token(&self) -> TypeToken {
        self.token
    }

    /// Simple name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace, empty for the core library
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Namespace-qualified name
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Shape of the type
    #[must_use]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Modifier flags
    #[must_use]
    pub fn flags(&self) -> TypeAttributes {
        self.flags
    }

    /// Visibility class
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        Visibility::of_type(self.flags)
    }

    /// Direct parent, `None` for the root object, interfaces and primitives
    #[must_use]
    pub fn base(&self) -> Option<&TypeRef> {
        self.base.as_ref()
    }

    /// Directly implemented (or, for interfaces, extended) interfaces
    #[must_use]
    pub fn interfaces(&self) -> &[TypeRef] {
        &self.interfaces
    }

    /// Slots declared by this type itself, in declaration order
    #[must_use]
    pub fn slots(&self) -> &[SlotDescriptor] {
        &self.slots
    }

    /// This type followed by all of its ancestors, nearest first
    pub fn ancestry(&self) -> impl Iterator<Item = &TypeDescriptor> {
        std::iter::successors(Some(self), |ty| ty.base.as_deref())
    }

    /// All instance slots: own slots first, then each ancestor's.
    ///
    /// Slots shadowed by a same-named slot of a descendant are still listed.
    pub fn all_slots(&self) -> impl Iterator<Item = &SlotDescriptor> {
        self.ancestry().flat_map(|ty| ty.slots.iter())
    }

    /// Find the nearest slot with the given name
    #[must_use]
    pub fn slot_by_name(&self, name: &str) -> Option<&SlotDescriptor> {
        self.all_slots().find(|slot| slot.name == name)
    }

    /// Number of ancestors
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestry().count() - 1
    }

    /// Bytes of storage one instance occupies
    #[must_use]
    pub fn instance_size(&self) -> usize {
        self.layout.size()
    }

    /// Size and alignment of one instance's storage
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Declared constructors
    #[must_use]
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// The constructor whose parameters are the own slot types in declared order
    #[must_use]
    pub fn canonical_constructor(&self) -> Option<&Constructor> {
        self.constructors
            .iter()
            .find(|ctor| ctor.matches_signature(self.slots.iter().map(|slot| &slot.ty)))
    }

    /// Component type of an array
    #[must_use]
    pub fn component(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::Array { component } => Some(component),
            _ => None,
        }
    }

    /// Kind of a primitive type
    #[must_use]
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TypeKind::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// Returns `true` for the root of the class hierarchy
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self.kind, TypeKind::Class) && self.base.is_none()
    }

    /// Returns `true` if both descriptors denote the same type.
    ///
    /// Array types are structural: two arrays are the same type if their components are.
    #[must_use]
    pub fn same_type(&self, other: &TypeDescriptor) -> bool {
        if self.token == other.token {
            return true;
        }

        match (&self.kind, &other.kind) {
            (TypeKind::Primitive(a), TypeKind::Primitive(b)) => a == b,
            (TypeKind::Array { component: a }, TypeKind::Array { component: b }) => {
                a.same_type(b)
            }
            _ => false,
        }
    }

    /// Returns `true` if this interface is implemented by `ty` or one of its ancestors
    #[must_use]
    pub fn is_implemented_by(&self, ty: &TypeDescriptor) -> bool {
        ty.ancestry().any(|ancestor| {
            ancestor
                .interfaces
                .iter()
                .any(|iface| iface.same_type(self) || self.is_implemented_by(iface))
        })
    }

    /// Returns `true` if a value of runtime type `source` may be stored where `self` is expected
    #[must_use]
    pub fn is_assignable_from(&self, source: &TypeDescriptor) -> bool {
        if self.same_type(source) {
            return true;
        }

        match (&self.kind, &source.kind) {
            (TypeKind::Primitive(_), _) | (_, TypeKind::Primitive(_)) => false,
            (TypeKind::Array { component: target }, TypeKind::Array { component: element }) => {
                !target.is_primitive()
                    && !element.is_primitive()
                    && target.is_assignable_from(element)
            }
            (TypeKind::Interface, _) => self.is_implemented_by(source),
            _ if self.is_root() => true,
            _ => source.ancestry().any(|ancestor| ancestor.same_type(self)),
        }
    }

    /// Construct an instance through the type's own constructors.
    ///
    /// This is the regular construction path: eligibility is checked, the constructor whose
    /// parameters accept `args` is selected, its body runs and its parameters are assigned.
    /// A type with a single constructor reports argument errors of that constructor.
    ///
    /// ## Arguments
    /// * 'this' - The type to construct
    /// * 'args' - Constructor arguments in parameter order
    ///
    /// # Errors
    /// Returns [`Error::Ineligible`] for abstract types and interfaces (which are abstract),
    /// [`Error::ConstructorNotFound`] if no constructor accepts `args`, or the error of the
    /// selected constructor.
    pub fn construct(this: &TypeRef, args: Vec<Value>) -> Result<ObjectRef> {
        ShapeChecker::new(&**this, Error::Ineligible)
            .is_not_abstract()?
            .is_not_interface()?;

        let ctor = match this.constructors.as_slice() {
            [single] => single,
            all => all
                .iter()
                .find(|ctor| ctor.check_arguments(this, &args).is_ok())
                .ok_or_else(|| Error::ConstructorNotFound {
                    type_name: this.name.clone(),
                })?,
        };

        ctor.invoke(this, heap_gateway(), args)
    }
}

impl TypeShape for TypeDescriptor {
    fn simple_name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> TypeAttributes {
        self.flags
    }

    fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(_))
    }

    fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum)
    }

    fn is_composite(&self) -> bool {
        matches!(self.kind, TypeKind::Composite)
    }

    fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("token", &self.token)
            .field("name", &self.fullname())
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .field("base", &self.base.as_ref().map(|base| base.fullname()))
            .field("slots", &self.slots)
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fullname())
    }
}
