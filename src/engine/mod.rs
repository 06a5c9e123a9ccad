//! The instantiation engine.
//!
//! This module provides the [`InstantiationEngine`], which creates and populates instances
//! while bypassing the regular initialization protocol of their types. It offers three
//! operations on top of the [`MemoryGateway`]:
//!
//! - [`create_bare`](InstantiationEngine::create_bare): allocate a zero-filled instance
//!   without running any constructor or slot initializer
//! - [`force_populate`](InstantiationEngine::force_populate): allocate a bare instance and
//!   write every own slot with a mapped value, regardless of visibility or finality
//! - [`construct_canonical`](InstantiationEngine::construct_canonical): build a composite
//!   through its canonical constructor from mapped component values
//!
//! # Error Handling
//!
//! Errors are raised in a fixed order and always before the gateway is touched:
//!
//! 1. Shape eligibility, as [`Error::Ineligible`]
//! 2. Mapper contract, as [`Error::MissingMapper`], [`Error::UnmappedSlot`] or
//!    [`Error::SlotValueMismatch`]
//! 3. Engine limits, as [`Error::InstanceTooLarge`] or [`Error::ArrayTooLong`]
//!
//! Constructor failures of `construct_canonical` surface as the construction errors of
//! [`Error`]. A value that does not fit its slot and passes unchecked makes the gateway
//! panic.
//!
//! # Thread Safety
//!
//! The engine holds no mutable state and can be shared freely. Every raw instance is owned by
//! the call that allocated it until it is published.
//!
//! # Example
//!
//! ```rust,no_run
//! use bareforge::prelude::*;
//!
//! let account = TypeBuilder::class("bank", "Account")
//!     .slot_with_attrs("id", PrimitiveKind::I64, SlotAttributes::PRIVATE | SlotAttributes::FINAL)
//!     .slot("balance", PrimitiveKind::F64)
//!     .build()?;
//!
//! let engine = InstantiationEngine::new();
//! let account = engine.force_populate(&account, Some(|slot: &SlotDescriptor| match slot.name() {
//!     "id" => Some(Value::I64(7)),
//!     _ => Some(Value::F64(12.5)),
//! }))?;
//!
//! println!("{}", account);
//! # Ok::<(), bareforge::Error>(())
//! ```

use std::{collections::HashMap, fmt, sync::Arc};

use tracing::{debug, trace};

use crate::{
    checker::ShapeChecker,
    config::EngineConfig,
    gateway::{heap_gateway, Hazard, MemoryGateway},
    typesystem::{corelib, SlotDescriptor, TypeRef, TypeShape, Visibility},
    value::{ManagedObject, ObjectRef, Value},
    Error, Result,
};

/// A plain function slot mapper, handy for spelling out an absent mapper
pub type SlotMapperFn = fn(&SlotDescriptor) -> Option<Value>;

/// An absent slot mapper
pub const NO_MAPPER: Option<SlotMapperFn> = None;

/// Build a slot mapper that looks values up by slot name
///
/// ## Arguments
/// * 'values' - Slot name to value
pub fn map_by_name<K>(values: HashMap<K, Value>) -> impl FnMut(&SlotDescriptor) -> Option<Value>
where
    K: Into<String>,
{
    let values: HashMap<String, Value> = values
        .into_iter()
        .map(|(name, value)| (name.into(), value))
        .collect();
    move |slot: &SlotDescriptor| values.get(slot.name()).cloned()
}

/// Creates and populates instances bypassing constructors and encapsulation
pub struct InstantiationEngine {
    gateway: &'static dyn MemoryGateway,
    config: EngineConfig,
}

impl InstantiationEngine {
    /// Create an engine on the process-wide heap gateway with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine on the process-wide heap gateway
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_gateway(heap_gateway(), config)
    }

    /// Create an engine on a specific gateway
    ///
    /// ## Arguments
    /// * 'gateway' - The gateway performing all raw memory operations
    /// * 'config'  - Limits and checks
    #[must_use]
    pub fn with_gateway(gateway: &'static dyn MemoryGateway, config: EngineConfig) -> Self {
        InstantiationEngine { gateway, config }
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn check_size(&self, ty: &TypeRef) -> Result<()> {
        let limit = self.config.limits.max_instance_size;
        if ty.instance_size() > limit {
            return Err(Error::InstanceTooLarge {
                type_name: ty.name().to_string(),
                size: ty.instance_size(),
                limit,
            });
        }
        Ok(())
    }

    fn is_string(ty: &TypeRef) -> bool {
        ty.token() == corelib().string().token()
    }

    fn empty_string() -> ObjectRef {
        Arc::new(ManagedObject::Str(Box::default()))
    }

    /// Create an instance of `ty` without running any of its constructors.
    ///
    /// - Array types yield a zero-length array
    /// - Primitive types yield the zero value, read from a bare instance of their wrapper
    /// - The built-in string yields the empty string
    /// - Every other type yields an instance with all slots, including inherited ones, zero
    ///
    /// # Errors
    /// Returns [`Error::Ineligible`] for interfaces, abstract types and enums, and
    /// [`Error::InstanceTooLarge`] if the instance exceeds the configured limit.
    pub fn create_bare(&self, ty: &TypeRef) -> Result<Value> {
        debug!(ty = %ty, "create_bare");

        ShapeChecker::new(&**ty, Error::Ineligible)
            .is_not_abstract()?
            .is_not_interface()?
            .is_not_enum()?;

        if ty.is_array() {
            return self.create_array(ty, 0).map(Value::Ref);
        }

        if ty.is_primitive() {
            let wrapper = corelib().force_wrapper_type(ty);
            return self
                .create_bare(&wrapper)?
                .unbox()
                .ok_or_else(|| type_error!("{} does not box a primitive", wrapper.name()));
        }

        if Self::is_string(ty) {
            return Ok(Value::Ref(Self::empty_string()));
        }

        self.check_size(ty)?;

        trace!(hazard = %Hazard::IgnoresConstructor, ty = %ty, "allocating bare instance");
        // HAZARD(ignores constructor): no constructor or initializer runs, every slot stays
        // zero, including slots the type's constructors would never leave zero.
        Ok(Value::Ref(self.gateway.allocate_bare(ty).publish()))
    }

    /// Create an instance of `ty` and write every slot it declares with a mapped value.
    ///
    /// The mapper is called once per own slot, in declaration order, and must return a value
    /// for each of them. All values are collected before the instance is allocated, so a
    /// failing mapper never leaves a partially populated instance behind. Slots inherited
    /// from ancestors keep their zero value. Final and private slots are written like any
    /// other slot.
    ///
    /// ## Arguments
    /// * 'ty'     - The type to instantiate
    /// * 'mapper' - Supplies the value of each slot; required even if `ty` has no slots
    ///
    /// # Errors
    /// Returns [`Error::Ineligible`] for enums, arrays, abstract types, interfaces,
    /// primitives and composites, [`Error::MissingMapper`] if `mapper` is `None`,
    /// [`Error::UnmappedSlot`] if the mapper returns `None` for a slot,
    /// [`Error::SlotValueMismatch`] if prechecks are enabled and a value does not fit its
    /// slot, and [`Error::InstanceTooLarge`] if the instance exceeds the configured limit.
    pub fn force_populate<M>(&self, ty: &TypeRef, mapper: Option<M>) -> Result<ObjectRef>
    where
        M: FnMut(&SlotDescriptor) -> Option<Value>,
    {
        debug!(ty = %ty, slots = ty.slots().len(), "force_populate");

        ShapeChecker::new(&**ty, Error::Ineligible)
            .is_not_enum()?
            .is_not_array()?
            .is_not_abstract()?
            .is_not_interface()?
            .is_not_primitive()?
            .is_not_composite()?;

        let mut mapper = mapper.ok_or(Error::MissingMapper {
            operation: "force_populate",
        })?;

        let mut values = Vec::with_capacity(ty.slots().len());
        for slot in ty.slots() {
            let value = mapper(slot).ok_or_else(|| Error::UnmappedSlot {
                type_name: ty.name().to_string(),
                slot: slot.name().to_string(),
            })?;

            if self.config.precheck_slot_values && !slot.slot_type().accepts(&value) {
                return Err(Error::SlotValueMismatch {
                    type_name: ty.name().to_string(),
                    slot: slot.name().to_string(),
                    expected: slot.slot_type().name(),
                    actual: value.type_name(),
                });
            }
            values.push(value);
        }

        if Self::is_string(ty) {
            return Ok(Self::empty_string());
        }

        self.check_size(ty)?;

        trace!(hazard = %Hazard::IgnoresConstructor, ty = %ty, "allocating bare instance");
        // HAZARD(ignores constructor): slots the mapper writes replace whatever the type's
        // constructors would have established; inherited slots stay zero.
        let mut raw = self.gateway.allocate_bare(ty);
        for (slot, value) in ty.slots().iter().zip(values) {
            if slot.is_final() {
                trace!(hazard = %Hazard::ModifiesFinalSlot, slot = %slot, "writing slot");
            }
            if slot.visibility() != Visibility::Public {
                trace!(hazard = %Hazard::ModifiesPrivateSlot, slot = %slot, "writing slot");
            }
            // SAFETY: the instance was allocated above and is not shared until published; the
            // slot is declared by `ty` itself.
            unsafe { self.gateway.write_slot(&mut raw, slot, value) };
        }

        Ok(raw.publish())
    }

    /// Build a composite through its canonical constructor.
    ///
    /// The mapper is called once per component, in declaration order; the resulting values
    /// are passed to the canonical constructor, whose body may validate and normalize them.
    ///
    /// ## Arguments
    /// * 'ty'     - The composite type
    /// * 'mapper' - Supplies the value of each component
    ///
    /// # Errors
    /// Returns [`Error::Ineligible`] if `ty` is not a composite, [`Error::MissingMapper`] if
    /// `mapper` is `None`, [`Error::ConstructorNotFound`] if the composite has no canonical
    /// constructor, [`Error::UnmappedSlot`] if the mapper returns `None` for a component,
    /// [`Error::InstanceTooLarge`] if the instance exceeds the configured limit, and
    /// [`Error::ArgumentMismatch`] or [`Error::ConstructorRejected`] if the constructor
    /// refuses the values.
    pub fn construct_canonical<M>(&self, ty: &TypeRef, mapper: Option<M>) -> Result<ObjectRef>
    where
        M: FnMut(&SlotDescriptor) -> Option<Value>,
    {
        debug!(ty = %ty, components = ty.slots().len(), "construct_canonical");

        ShapeChecker::new(&**ty, Error::Ineligible).is_composite()?;

        let mut mapper = mapper.ok_or(Error::MissingMapper {
            operation: "construct_canonical",
        })?;

        let constructor = ty
            .canonical_constructor()
            .ok_or_else(|| Error::ConstructorNotFound {
                type_name: ty.name().to_string(),
            })?;

        let mut args = Vec::with_capacity(constructor.arity());
        for component in ty.slots() {
            args.push(mapper(component).ok_or_else(|| Error::UnmappedSlot {
                type_name: ty.name().to_string(),
                slot: component.name().to_string(),
            })?);
        }

        self.check_size(ty)?;

        trace!(hazard = %Hazard::InvokesPrivateConstructor, ty = %ty, "invoking canonical constructor");
        // HAZARD(invokes private constructor): the canonical constructor runs regardless of
        // its visibility.
        constructor.invoke(ty, self.gateway, args)
    }

    /// Create an array of `length` default-valued elements.
    ///
    /// # Errors
    /// Returns [`Error::Ineligible`] if `ty` is not an array type and
    /// [`Error::ArrayTooLong`] if `length` exceeds the configured limit.
    pub fn create_array(&self, ty: &TypeRef, length: usize) -> Result<ObjectRef> {
        ShapeChecker::new(&**ty, Error::Ineligible).is_array()?;

        let limit = self.config.limits.max_array_length;
        if length > limit {
            return Err(Error::ArrayTooLong {
                type_name: ty.name().to_string(),
                length,
                limit,
            });
        }

        Ok(self.gateway.new_array(ty, length))
    }
}

impl Default for InstantiationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InstantiationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstantiationEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
