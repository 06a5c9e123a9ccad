//! Instance storage.
//!
//! An [`Instance`] owns one block of raw storage laid out according to its type: primitive
//! slots hold their value inline (`bool` as one byte, `char` as its code point) and
//! reference slots hold either a null pointer or a pointer obtained from
//! [`Arc::into_raw`]. The instance owns one strong count of every referenced object and
//! releases them, together with the storage, when it is dropped.

use std::{alloc::Layout, fmt, ptr::NonNull, sync::Arc};

use crate::{
    gateway::RawMemory,
    typesystem::{PrimitiveKind, SlotDescriptor, SlotRepr, TypeKind, TypeRef},
    value::{ManagedObject, Value},
};

/// A populated instance of a class or composite
pub struct Instance {
    ty: TypeRef,
    storage: NonNull<u8>,
    layout: Layout,
    memory: &'static RawMemory,
}

// SAFETY: the storage is exclusively owned; it is only mutated through `&mut Instance` before
// publication and every referenced object is itself `Send + Sync`.
unsafe impl Send for Instance {}
// SAFETY: see above, shared access only reads.
unsafe impl Sync for Instance {}

impl Instance {
    /// Take ownership of zero-filled storage for `ty`.
    ///
    /// # Safety
    /// `storage` must come from `memory.alloc_zeroed(layout)` and `layout` must be the layout
    /// of `ty`.
    pub(crate) unsafe fn from_raw_parts(
        ty: TypeRef,
        storage: NonNull<u8>,
        layout: Layout,
        memory: &'static RawMemory,
    ) -> Self {
        Instance {
            ty,
            storage,
            layout,
            memory,
        }
    }

    /// The runtime type of the instance
    #[must_use]
    pub fn type_descriptor(&self) -> &TypeRef {
        &self.ty
    }

    fn owns(&self, slot: &SlotDescriptor) -> bool {
        self.ty.ancestry().any(|ty| ty.token == slot.owner)
    }

    /// Read the nearest slot named `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        let slot = self.ty.slot_by_name(name)?;
        // SAFETY: the slot was resolved on this instance's type.
        Some(unsafe { self.load(slot) })
    }

    /// Read a slot; `None` if the slot is not declared by the type or one of its ancestors
    #[must_use]
    pub fn read(&self, slot: &SlotDescriptor) -> Option<Value> {
        if !self.owns(slot) {
            return None;
        }
        // SAFETY: ownership was checked above.
        Some(unsafe { self.load(slot) })
    }

    /// All slots with their current values, own slots first
    #[must_use]
    pub fn slots(&self) -> Vec<(&SlotDescriptor, Value)> {
        self.ty
            .all_slots()
            // SAFETY: every slot comes from this instance's type.
            .map(|slot| (slot, unsafe { self.load(slot) }))
            .collect()
    }

    /// Returns `true` if both instances have the same type and equal slot values
    #[must_use]
    pub fn same_contents(&self, other: &Instance) -> bool {
        self.ty.token == other.ty.token
            && self
                .ty
                .all_slots()
                // SAFETY: both instances share the type the slot comes from.
                .all(|slot| unsafe { self.load(slot) == other.load(slot) })
    }

    /// Read a slot without checking ownership.
    ///
    /// # Safety
    /// The slot must be declared by this instance's type or one of its ancestors.
    unsafe fn load(&self, slot: &SlotDescriptor) -> Value {
        let offset = slot.offset();
        let memory = self.memory;
        let base = self.storage;

        match slot.slot_type().repr() {
            SlotRepr::Primitive(PrimitiveKind::Bool) => {
                Value::Bool(memory.read::<u8>(base, offset) != 0)
            }
            SlotRepr::Primitive(PrimitiveKind::Char) => {
                Value::Char(char::from_u32(memory.read::<u32>(base, offset)).unwrap_or('\0'))
            }
            SlotRepr::Primitive(PrimitiveKind::I8) => Value::I8(memory.read(base, offset)),
            SlotRepr::Primitive(PrimitiveKind::I16) => Value::I16(memory.read(base, offset)),
            SlotRepr::Primitive(PrimitiveKind::I32) => Value::I32(memory.read(base, offset)),
            SlotRepr::Primitive(PrimitiveKind::I64) => Value::I64(memory.read(base, offset)),
            SlotRepr::Primitive(PrimitiveKind::F32) => Value::F32(memory.read(base, offset)),
            SlotRepr::Primitive(PrimitiveKind::F64) => Value::F64(memory.read(base, offset)),
            SlotRepr::Reference => {
                let ptr = memory.read::<*const ManagedObject>(base, offset);
                if ptr.is_null() {
                    Value::Null
                } else {
                    // The slot keeps its own count; hand out a new one.
                    Arc::increment_strong_count(ptr);
                    Value::Ref(Arc::from_raw(ptr))
                }
            }
        }
    }

    /// Store a value into a slot, releasing a previously referenced object.
    ///
    /// # Panics
    /// Panics if the value does not match the slot's storage representation.
    ///
    /// # Safety
    /// The slot must be declared by this instance's type or one of its ancestors.
    pub(crate) unsafe fn store(&mut self, slot: &SlotDescriptor, value: Value) {
        let offset = slot.offset();
        let memory = self.memory;
        let base = self.storage;

        match (slot.slot_type().repr(), value) {
            (SlotRepr::Primitive(PrimitiveKind::Bool), Value::Bool(v)) => {
                memory.write::<u8>(base, offset, u8::from(v));
            }
            (SlotRepr::Primitive(PrimitiveKind::Char), Value::Char(v)) => {
                memory.write::<u32>(base, offset, u32::from(v));
            }
            (SlotRepr::Primitive(PrimitiveKind::I8), Value::I8(v)) => memory.write(base, offset, v),
            (SlotRepr::Primitive(PrimitiveKind::I16), Value::I16(v)) => {
                memory.write(base, offset, v);
            }
            (SlotRepr::Primitive(PrimitiveKind::I32), Value::I32(v)) => {
                memory.write(base, offset, v);
            }
            (SlotRepr::Primitive(PrimitiveKind::I64), Value::I64(v)) => {
                memory.write(base, offset, v);
            }
            (SlotRepr::Primitive(PrimitiveKind::F32), Value::F32(v)) => {
                memory.write(base, offset, v);
            }
            (SlotRepr::Primitive(PrimitiveKind::F64), Value::F64(v)) => {
                memory.write(base, offset, v);
            }
            (SlotRepr::Reference, value @ (Value::Null | Value::Ref(_))) => {
                let new = match value {
                    Value::Ref(object) => Arc::into_raw(object),
                    _ => std::ptr::null(),
                };
                let old = memory.read::<*const ManagedObject>(base, offset);
                memory.write(base, offset, new);
                if !old.is_null() {
                    drop(Arc::from_raw(old));
                }
            }
            (_, value) => panic!(
                "type confusion: slot {} cannot hold {}",
                slot,
                value.type_name()
            ),
        }
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        for slot in self.ty.all_slots() {
            if slot.slot_type().repr() != SlotRepr::Reference {
                continue;
            }

            // SAFETY: the slot belongs to this instance's type and holds a null pointer or a
            // strong count owned by this instance.
            unsafe {
                let ptr = self
                    .memory
                    .read::<*const ManagedObject>(self.storage, slot.offset());
                if !ptr.is_null() {
                    drop(Arc::from_raw(ptr));
                }
            }
        }

        // SAFETY: the storage was allocated by this memory with this layout.
        unsafe { self.memory.dealloc(self.storage, self.layout) };
    }
}

impl PartialEq for Instance {
    /// Composites compare by contents, everything else by identity
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        matches!(self.ty.kind, TypeKind::Composite) && self.same_contents(other)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.ty.name());
        for (slot, value) in self.slots() {
            out.field(slot.name(), &value);
        }
        out.finish()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots();
        if slots.is_empty() {
            return f.write_str(self.ty.name());
        }

        write!(f, "{} {{ ", self.ty.name())?;
        for (index, (slot, value)) in slots.into_iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", slot.name(), value)?;
        }
        f.write_str(" }")
    }
}
