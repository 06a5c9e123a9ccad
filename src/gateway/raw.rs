//! Raw, not yet published instances.

use std::{fmt, ptr::NonNull, sync::Arc};

use crate::{
    gateway::RawMemory,
    typesystem::{SlotDescriptor, TypeRef},
    value::{Instance, ManagedObject, ObjectRef, Value},
};

/// A freshly allocated instance whose slots may still be unpopulated.
///
/// The handle is exclusively owned by whoever requested the allocation and is written through
/// a [`MemoryGateway`](crate::gateway::MemoryGateway). Publishing it turns it into a shared,
/// read-only [`ObjectRef`]. Dropping an unpublished handle releases its
/// storage.
pub struct RawInstance {
    inner: Instance,
}

impl RawInstance {
    /// Take ownership of zero-filled storage allocated for `ty`.
    ///
    /// This is the building block for [`MemoryGateway`](crate::gateway::MemoryGateway)
    /// implementations outside this crate.
    ///
    /// ## Arguments
    /// * 'ty'      - The type the storage was allocated for
    /// * 'storage' - Storage returned by `memory.alloc_zeroed(ty.layout())`
    /// * 'memory'  - The capability that allocated `storage`, used to release it
    ///
    /// # Safety
    /// `storage` must come from [`RawMemory::alloc_zeroed`] with exactly `ty.layout()`, must
    /// still be zero-filled and must not be owned by anything else.
    #[must_use]
    pub unsafe fn from_raw_parts(
        ty: &TypeRef,
        storage: NonNull<u8>,
        memory: &'static RawMemory,
    ) -> Self {
        RawInstance {
            inner: Instance::from_raw_parts(ty.clone(), storage, ty.layout(), memory),
        }
    }

    /// The type the instance was allocated for
    #[must_use]
    pub fn type_descriptor(&self) -> &TypeRef {
        self.inner.type_descriptor()
    }

    /// Store a value without checking that its type is assignable to the slot.
    ///
    /// # Panics
    /// Panics if the value's representation (primitive kind or reference) differs from the
    /// slot's.
    ///
    /// # Safety
    /// The slot must be declared by the instance's type or one of its ancestors.
    pub unsafe fn store(&mut self, slot: &SlotDescriptor, value: Value) {
        self.inner.store(slot, value);
    }

    pub(crate) fn publish(self) -> ObjectRef {
        Arc::new(ManagedObject::Instance(self.inner))
    }
}

impl fmt::Debug for RawInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawInstance")
            .field("type", &self.inner.type_descriptor().fullname())
            .finish_non_exhaustive()
    }
}
