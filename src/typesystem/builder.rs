//! Builder for type descriptors.
//!
//! This module provides the [`TypeBuilder`] struct, which offers a fluent API for describing
//! classes, composites, interfaces, enums and array types. Setters never fail; every
//! consistency rule is checked once in [`TypeBuilder::build`], which also computes the
//! instance layout, assigns the identity token and, for composites, derives the canonical
//! constructor from the declared components.
//!
//! # Implicit Modifiers
//!
//! | Shape | Implicit flags |
//! |-------|----------------|
//! | array | `PUBLIC`, `FINAL` |
//! | interface | `ABSTRACT`, `STATIC` |
//! | enum | `FINAL`, `STATIC` |
//! | composite | `FINAL`, `STATIC` |
//! | class | none |
//!
//! # Example
//!
//! ```rust
//! use bareforge::prelude::*;
//!
//! let shape = TypeBuilder::class("geo", "Shape")
//!     .visibility(Visibility::Public)
//!     .with_flags(TypeAttributes::ABSTRACT)
//!     .slot("id", PrimitiveKind::I64)
//!     .build()?;
//!
//! let circle = TypeBuilder::class("geo", "Circle")
//!     .extends(&shape)
//!     .slot("radius", PrimitiveKind::F64)
//!     .build()?;
//!
//! assert_eq!(circle.all_slots().count(), 2);
//! # Ok::<(), bareforge::Error>(())
//! ```

use crate::{
    typesystem::{
        corelib,
        layout::LayoutBuilder,
        Constructor, ConstructorBody, SlotAttributes, SlotDescriptor, SlotType, TypeAttributes,
        TypeDescriptor, TypeKind, TypeRef, TypeShape, TypeToken, Visibility, TYPE_VISIBILITY_MASK,
    },
    value::Value,
    Result,
};
use std::sync::Arc;

/// Maximum number of ancestors a type may have
pub const MAX_HIERARCHY_DEPTH: usize = 64;

struct PendingSlot {
    name: String,
    ty: SlotType,
    flags: SlotAttributes,
}

/// Provides a fluent API for describing types
pub struct TypeBuilder {
    namespace: String,
    name: String,
    kind: TypeKind,
    flags: TypeAttributes,
    visibility: Option<Visibility>,
    base: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    slots: Vec<PendingSlot>,
    constructors: Vec<Constructor>,
    validator: Option<ConstructorBody>,
}

impl TypeBuilder {
    fn start(kind: TypeKind, namespace: &str, name: &str) -> Self {
        TypeBuilder {
            namespace: namespace.to_string(),
            name: name.to_string(),
            kind,
            flags: TypeAttributes::empty(),
            visibility: None,
            base: None,
            interfaces: Vec::new(),
            slots: Vec::new(),
            constructors: Vec::new(),
            validator: None,
        }
    }

    /// Start describing a regular class
    ///
    /// ## Arguments
    /// * 'namespace' - Namespace of the class
    /// * 'name'      - Simple name of the class
    #[must_use]
    pub fn class(namespace: &str, name: &str) -> Self {
        Self::start(TypeKind::Class, namespace, name)
    }

    /// Start describing a composite
    ///
    /// ## Arguments
    /// * 'namespace' - Namespace of the composite
    /// * 'name'      - Simple name of the composite
    #[must_use]
    pub fn composite(namespace: &str, name: &str) -> Self {
        Self::start(TypeKind::Composite, namespace, name)
    }

    /// Start describing an interface
    ///
    /// ## Arguments
    /// * 'namespace' - Namespace of the interface
    /// * 'name'      - Simple name of the interface
    #[must_use]
    pub fn interface(namespace: &str, name: &str) -> Self {
        Self::start(TypeKind::Interface, namespace, name)
    }

    /// Start describing an enumeration
    ///
    /// ## Arguments
    /// * 'namespace' - Namespace of the enum
    /// * 'name'      - Simple name of the enum
    #[must_use]
    pub fn enumeration(namespace: &str, name: &str) -> Self {
        Self::start(TypeKind::Enum, namespace, name)
    }

    /// Start describing an array of `component`.
    ///
    /// Every call produces a new descriptor; use [`TypeRegistry::array_of`](crate::TypeRegistry::array_of)
    /// to share array types.
    #[must_use]
    pub fn array_of(component: &TypeRef) -> Self {
        let name = format!("{}[]", component.name());
        Self::start(
            TypeKind::Array {
                component: component.clone(),
            },
            component.namespace(),
            &name,
        )
    }

    /// Set the visibility of the type
    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Add modifier flags
    ///
    /// ## Arguments
    /// * 'flags' - Flags to add to the implicit ones of the shape
    #[must_use]
    pub fn with_flags(mut self, flags: TypeAttributes) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the parent type
    #[must_use]
    pub fn extends(mut self, base: &TypeRef) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Add an implemented (or, for interfaces, extended) interface
    #[must_use]
    pub fn implements(mut self, interface: &TypeRef) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    /// Declare a private instance slot
    ///
    /// ## Arguments
    /// * 'name' - Name of the slot
    /// * 'ty'   - Declared type, a [`PrimitiveKind`](crate::PrimitiveKind), `&TypeRef` or [`SlotType`]
    #[must_use]
    pub fn slot(self, name: &str, ty: impl Into<SlotType>) -> Self {
        self.slot_with_attrs(name, ty, SlotAttributes::PRIVATE)
    }

    /// Declare an instance slot with explicit modifiers
    #[must_use]
    pub fn slot_with_attrs(
        mut self,
        name: &str,
        ty: impl Into<SlotType>,
        flags: SlotAttributes,
    ) -> Self {
        self.slots.push(PendingSlot {
            name: name.to_string(),
            ty: ty.into(),
            flags,
        });
        self
    }

    /// Declare a component of a composite.
    ///
    /// Components are private, final slots; their order defines the canonical constructor.
    #[must_use]
    pub fn component(self, name: &str, ty: impl Into<SlotType>) -> Self {
        self.slot_with_attrs(name, ty, SlotAttributes::PRIVATE | SlotAttributes::FINAL)
    }

    /// Declare a constructor of a class
    #[must_use]
    pub fn constructor(mut self, constructor: Constructor) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Set the body of a composite's canonical constructor
    ///
    /// ## Arguments
    /// * 'validator' - Validates and normalizes the component values in place
    #[must_use]
    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&mut [Value]) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    fn implicit_flags(&self) -> TypeAttributes {
        match self.kind {
            TypeKind::Primitive(_) | TypeKind::Array { .. } => {
                TypeAttributes::PUBLIC | TypeAttributes::FINAL
            }
            TypeKind::Interface => TypeAttributes::ABSTRACT | TypeAttributes::STATIC,
            TypeKind::Enum | TypeKind::Composite => {
                TypeAttributes::FINAL | TypeAttributes::STATIC
            }
            TypeKind::Class => TypeAttributes::empty(),
        }
    }

    fn shape_name(&self) -> &'static str {
        match self.kind {
            TypeKind::Primitive(_) => "Primitive",
            TypeKind::Array { .. } => "Array",
            TypeKind::Enum => "Enum",
            TypeKind::Composite => "Composite",
            TypeKind::Interface => "Interface",
            TypeKind::Class => "Class",
        }
    }

    fn check_base(&self, base: &TypeDescriptor) -> Result<()> {
        let refused = if base.is_interface() {
            Some("interface")
        } else if base.is_composite() {
            Some("composite")
        } else if base.is_enum() {
            Some("enum")
        } else if base.is_primitive() {
            Some("primitive")
        } else if base.is_array() {
            Some("array")
        } else if base.is_final() {
            Some("final type")
        } else {
            None
        };

        if let Some(what) = refused {
            return Err(type_error!(
                "{} cannot extend {} {}",
                self.name,
                what,
                base.name()
            ));
        }

        if base.depth() + 1 >= MAX_HIERARCHY_DEPTH {
            return Err(type_error!(
                "{} exceeds the maximum hierarchy depth of {}",
                self.name,
                MAX_HIERARCHY_DEPTH
            ));
        }

        Ok(())
    }

    fn check(&self, flags: TypeAttributes) -> Result<()> {
        let shape = self.shape_name();

        match self.kind {
            TypeKind::Interface if !self.slots.is_empty() => {
                return Err(type_error!("Interface {} cannot declare slots", self.name));
            }
            TypeKind::Interface | TypeKind::Enum | TypeKind::Composite | TypeKind::Array { .. } => {
                if let Some(base) = &self.base {
                    return Err(type_error!(
                        "{} {} cannot extend {}",
                        shape,
                        self.name,
                        base.name()
                    ));
                }
            }
            _ => {}
        }

        if matches!(self.kind, TypeKind::Enum | TypeKind::Array { .. }) && !self.slots.is_empty() {
            return Err(type_error!("{} {} cannot declare slots", shape, self.name));
        }

        if !matches!(self.kind, TypeKind::Class) && !self.constructors.is_empty() {
            return Err(type_error!(
                "{} {} cannot declare explicit constructors",
                shape,
                self.name
            ));
        }

        if self.validator.is_some() && !matches!(self.kind, TypeKind::Composite) {
            return Err(type_error!(
                "Only composites have a validator, {} is not one",
                self.name
            ));
        }

        if flags.contains(TypeAttributes::ABSTRACT | TypeAttributes::FINAL) {
            return Err(type_error!(
                "{} {} cannot be both abstract and final",
                shape,
                self.name
            ));
        }

        if let Some(base) = &self.base {
            self.check_base(base)?;
        }

        for interface in &self.interfaces {
            if !interface.is_interface() {
                return Err(type_error!(
                    "{} cannot implement {}, it is not an interface",
                    self.name,
                    interface.name()
                ));
            }
        }

        for (index, slot) in self.slots.iter().enumerate() {
            if self.slots[..index].iter().any(|other| other.name == slot.name) {
                return Err(type_error!(
                    "{} declares slot `{}` more than once",
                    self.name,
                    slot.name
                ));
            }
        }

        Ok(())
    }

    fn check_constructors(&self, slots: &[SlotDescriptor], base: Option<&TypeRef>) -> Result<()> {
        for constructor in &self.constructors {
            for parameter in constructor.parameters() {
                let target = slots
                    .iter()
                    .find(|slot| slot.name == parameter.name)
                    .or_else(|| base.and_then(|base| base.slot_by_name(&parameter.name)));

                match target {
                    Some(slot) if slot.ty.same_erasure(&parameter.ty) => {}
                    Some(slot) => {
                        return Err(type_error!(
                            "Constructor parameter `{}` of {} is {} but the slot is {}",
                            parameter.name,
                            self.name,
                            parameter.ty,
                            slot.ty
                        ))
                    }
                    None => {
                        return Err(type_error!(
                            "Constructor parameter `{}` of {} has no matching slot",
                            parameter.name,
                            self.name
                        ))
                    }
                }
            }
        }

        Ok(())
    }

    /// Finish the description.
    ///
    /// Classes, enums, composites and arrays without an explicit parent extend the root
    /// object of the [`CoreLibrary`](crate::CoreLibrary).
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeError`] if the description is inconsistent: extending an
    /// interface, composite, enum, primitive, array or final type, declaring slots on an
    /// interface or enum, a parent on a composite, a validator on a non-composite, duplicate
    /// slot names, constructor parameters without a matching slot, or a hierarchy deeper
    /// than [`MAX_HIERARCHY_DEPTH`].
    pub fn build(self) -> Result<TypeRef> {
        let mut flags = self.implicit_flags() | self.flags;
        if let Some(visibility) = self.visibility {
            flags.remove(TYPE_VISIBILITY_MASK);
            flags |= visibility.type_flags();
        }

        self.check(flags)?;

        let base = match (&self.kind, self.base.clone()) {
            (_, Some(base)) => Some(base),
            (TypeKind::Interface | TypeKind::Primitive(_), None) => None,
            (_, None) => Some(corelib().object()),
        };

        let token = TypeToken::next();
        let mut layout = LayoutBuilder::extending(base.as_ref().map(|base| base.layout()));
        let mut slots = Vec::with_capacity(self.slots.len());
        for (index, pending) in self.slots.iter().enumerate() {
            let offset = layout.push(pending.ty.repr())?;
            slots.push(SlotDescriptor {
                owner: token,
                owner_name: self.name.clone(),
                name: pending.name.clone(),
                ty: pending.ty.clone(),
                flags: pending.flags,
                offset,
                index,
            });
        }
        let layout = layout.finish()?;

        self.check_constructors(&slots, base.as_ref())?;

        let constructors = if matches!(self.kind, TypeKind::Composite) {
            vec![Constructor::new(
                slots.iter().map(|slot| (slot.name.clone(), slot.ty.clone())),
            )
            .with_shared_body(self.validator)]
        } else {
            self.constructors
        };

        Ok(Arc::new(TypeDescriptor {
            token,
            namespace: self.namespace,
            name: self.name,
            kind: self.kind,
            flags,
            base,
            interfaces: self.interfaces,
            slots,
            layout,
            constructors,
        }))
    }
}
