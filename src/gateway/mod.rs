//! The raw memory access gateway.
//!
//! Every operation that bypasses the regular initialization protocol of a type goes through a
//! [`MemoryGateway`]: allocating an instance without running a constructor, writing a slot
//! regardless of its visibility or finality, and creating default-filled arrays. The gateway
//! trusts its inputs: eligibility and mapper contracts are checked by the
//! [`InstantiationEngine`](crate::InstantiationEngine) before the gateway is asked for
//! anything.
//!
//! # Faults
//!
//! Writing a value that does not fit the declared type of a slot, or writing a slot the
//! instance's type does not have, is type confusion. The gateway panics instead of returning
//! an error; no caller can recover a consistent state from it.
//!
//! # Custom Gateways
//!
//! A gateway outside this crate allocates with [`RawMemory::alloc_zeroed`], wraps the storage
//! with [`RawInstance::from_raw_parts`] and writes slots with [`RawInstance::store`].
//!
//! # Bootstrap
//!
//! The process-wide [`HeapGateway`] is created on first use of [`heap_gateway`], reading the
//! privileged static holding the [`RawMemory`] capability once.

mod capability;
mod hazard;
mod raw;

use std::sync::{Arc, OnceLock};

use tracing::debug;

pub use capability::{read_privileged_static, PrivilegedToken, RawMemory};
pub use hazard::Hazard;
pub use raw::RawInstance;

use crate::{
    typesystem::{SlotDescriptor, SlotType, TypeRef},
    value::{ArrayObject, ManagedObject, ObjectRef, Value},
};

/// Unchecked allocation and slot access.
///
/// # Safety
/// Implementations must return storage that is laid out for the requested type and
/// zero-filled, and must either store a written value exactly as declared by the slot or
/// panic.
pub unsafe trait MemoryGateway: Send + Sync {
    /// Allocate a zero-filled instance of `ty` without running any constructor.
    ///
    /// The type is not validated; callers must not pass interfaces, abstract types, enums,
    /// primitives or arrays.
    fn allocate_bare(&self, ty: &TypeRef) -> RawInstance;

    /// Write `value` into `slot` of `instance`, ignoring visibility and finality.
    ///
    /// # Panics
    /// Panics if the slot does not belong to the instance's type or the value does not fit
    /// the slot's declared type.
    ///
    /// # Safety
    /// The instance must not be observable by anyone else while slots are written.
    unsafe fn write_slot(&self, instance: &mut RawInstance, slot: &SlotDescriptor, value: Value);

    /// Create an array of type `ty` with `length` default-valued elements.
    ///
    /// # Panics
    /// Panics if `ty` is not an array type.
    fn new_array(&self, ty: &TypeRef, length: usize) -> ObjectRef;
}

/// Gateway backed by the global allocator
#[derive(Debug)]
pub struct HeapGateway {
    memory: &'static RawMemory,
}

static HEAP_GATEWAY: OnceLock<HeapGateway> = OnceLock::new();

/// The process-wide heap gateway
pub fn heap_gateway() -> &'static HeapGateway {
    HEAP_GATEWAY.get_or_init(|| {
        // SAFETY: the capability never leaves the heap gateway, which upholds the contract.
        let memory = read_privileged_static(unsafe { PrivilegedToken::new() });
        debug!("heap gateway initialized");
        HeapGateway { memory }
    })
}

// SAFETY: storage comes from `RawMemory::alloc_zeroed` with the type's own layout and every
// write is checked against the slot's declared type before it is stored.
unsafe impl MemoryGateway for HeapGateway {
    fn allocate_bare(&self, ty: &TypeRef) -> RawInstance {
        let storage = self.memory.alloc_zeroed(ty.layout());
        // SAFETY: the storage was just allocated with the layout of `ty` and is owned by no one.
        unsafe { RawInstance::from_raw_parts(ty, storage, self.memory) }
    }

    unsafe fn write_slot(&self, instance: &mut RawInstance, slot: &SlotDescriptor, value: Value) {
        let ty = instance.type_descriptor();
        if !ty.ancestry().any(|ancestor| ancestor.token() == slot.owner()) {
            panic!("type confusion: {} is not a slot of {}", slot, ty.name());
        }
        if !slot.slot_type().accepts(&value) {
            panic!(
                "type confusion: slot {} cannot hold {}",
                slot,
                value.type_name()
            );
        }

        instance.store(slot, value);
    }

    fn new_array(&self, ty: &TypeRef, length: usize) -> ObjectRef {
        let Some(component) = ty.component() else {
            panic!("type confusion: {} is not an array type", ty.name());
        };

        let zero = SlotType::from(component).zero();
        let elements = vec![zero; length].into_boxed_slice();
        Arc::new(ManagedObject::Array(ArrayObject::new(ty.clone(), elements)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test::shadowing_pair,
        typesystem::{corelib, PrimitiveKind, TypeBuilder, TypeRegistry},
    };

    #[test]
    fn allocate_bare_is_zeroed() {
        let (_, child) = shadowing_pair();
        let raw = heap_gateway().allocate_bare(&child);
        let object = raw.publish();
        let instance = object.as_instance().unwrap();

        for (slot, value) in instance.slots() {
            assert_eq!(value, slot.slot_type().zero(), "slot {}", slot);
        }
    }

    #[test]
    fn write_slot_reaches_ancestor_slots() {
        let (parent, child) = shadowing_pair();
        let gateway = heap_gateway();
        let mut raw = gateway.allocate_bare(&child);

        let own = &child.slots()[0];
        let inherited = &parent.slots()[0];
        unsafe {
            gateway.write_slot(&mut raw, own, Value::I32(1));
            gateway.write_slot(&mut raw, inherited, Value::I32(2));
        }

        let object = raw.publish();
        let instance = object.as_instance().unwrap();
        assert_eq!(instance.get("a"), Some(Value::I32(1)));
        assert_eq!(instance.read(inherited), Some(Value::I32(2)));
        assert_eq!(instance.read(&child.slots()[1]), Some(Value::I32(0)));
    }

    #[test]
    fn overwriting_a_reference_releases_it() {
        let holder = TypeBuilder::class("t", "Holder")
            .slot("item", &corelib().object())
            .build()
            .unwrap();
        let gateway = heap_gateway();
        let item = gateway.new_array(
            &TypeRegistry::new()
                .array_of(&corelib().primitive(PrimitiveKind::I8))
                .unwrap(),
            3,
        );

        let mut raw = gateway.allocate_bare(&holder);
        unsafe { gateway.write_slot(&mut raw, &holder.slots()[0], Value::Ref(item.clone())) };
        assert_eq!(Arc::strong_count(&item), 2);

        unsafe { gateway.write_slot(&mut raw, &holder.slots()[0], Value::Null) };
        assert_eq!(Arc::strong_count(&item), 1);

        unsafe { gateway.write_slot(&mut raw, &holder.slots()[0], Value::Ref(item.clone())) };
        drop(raw);
        assert_eq!(Arc::strong_count(&item), 1);
    }

    #[test]
    #[should_panic(expected = "type confusion")]
    fn primitive_mismatch_panics() {
        let wrapper = corelib().wrapper(PrimitiveKind::I64);
        let gateway = heap_gateway();
        let mut raw = gateway.allocate_bare(&wrapper);
        unsafe { gateway.write_slot(&mut raw, &wrapper.slots()[0], Value::I32(1)) };
    }

    #[test]
    #[should_panic(expected = "type confusion")]
    fn foreign_slot_panics() {
        let (_, child) = shadowing_pair();
        let wrapper = corelib().wrapper(PrimitiveKind::I32);
        let gateway = heap_gateway();
        let mut raw = gateway.allocate_bare(&wrapper);
        unsafe { gateway.write_slot(&mut raw, &child.slots()[0], Value::I32(1)) };
    }

    #[test]
    #[should_panic(expected = "type confusion")]
    fn unassignable_reference_panics() {
        let (_, child) = shadowing_pair();
        let holder = TypeBuilder::class("t", "StringHolder")
            .slot("text", &corelib().string())
            .build()
            .unwrap();
        let gateway = heap_gateway();
        let foreign = Value::Ref(gateway.allocate_bare(&child).publish());
        let mut raw = gateway.allocate_bare(&holder);
        unsafe { gateway.write_slot(&mut raw, &holder.slots()[0], foreign) };
    }

    #[test]
    fn arrays_are_default_filled() {
        let registry = TypeRegistry::new();
        let chars = registry
            .array_of(&corelib().primitive(PrimitiveKind::Char))
            .unwrap();
        let strings = registry.array_of(&corelib().string()).unwrap();

        let array = heap_gateway().new_array(&chars, 4);
        let array = array.as_array().unwrap();
        assert_eq!(array.len(), 4);
        assert!(array.elements().iter().all(|v| *v == Value::Char('\0')));

        let array = heap_gateway().new_array(&strings, 2);
        assert!(array.as_array().unwrap().elements().iter().all(Value::is_null));

        let empty = heap_gateway().new_array(&strings, 0);
        assert!(empty.as_array().unwrap().is_empty());
    }
}
