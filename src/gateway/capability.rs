//! The privileged raw-memory capability.
//!
//! [`RawMemory`] is the single low-level capability object of the process: zero-filled
//! allocation, deallocation and typed reads and writes at byte offsets of instance storage.
//! It exists exactly once, as a privileged static, and is only reachable through
//! [`read_privileged_static`], which requires a [`PrivilegedToken`].

use std::{
    alloc::{self, Layout},
    ptr::NonNull,
};

use tracing::trace;

use crate::{gateway::Hazard, typesystem::SlotOffset};

/// Proof that the holder may read privileged statics
#[derive(Debug)]
pub struct PrivilegedToken {
    _private: (),
}

impl PrivilegedToken {
    /// Acquire a token.
    ///
    /// # Safety
    /// The capability obtained with the token allows arbitrary reads and writes into
    /// instance storage. The caller must route every use of it through a
    /// [`MemoryGateway`](crate::gateway::MemoryGateway) implementation that upholds the
    /// gateway's contract.
    #[must_use]
    pub unsafe fn new() -> Self {
        PrivilegedToken { _private: () }
    }
}

/// Raw access to instance storage
#[derive(Debug)]
pub struct RawMemory {
    _private: (),
}

static RAW_MEMORY: RawMemory = RawMemory { _private: () };

/// Read the privileged static holding the raw-memory capability
///
/// ## Arguments
/// * 'token' - Proof of privilege, consumed by the read
pub fn read_privileged_static(token: PrivilegedToken) -> &'static RawMemory {
    trace!(hazard = %Hazard::ReadsPrivilegedValue, ?token, "reading raw memory capability");
    &RAW_MEMORY
}

impl RawMemory {
    /// Allocate zero-filled storage for `layout`.
    ///
    /// Zero-sized layouts return a dangling pointer without allocating. Allocation failure
    /// aborts through [`alloc::handle_alloc_error`].
    #[must_use]
    pub fn alloc_zeroed(&self, layout: Layout) -> NonNull<u8> {
        if layout.size() == 0 {
            return NonNull::dangling();
        }

        // SAFETY: the layout has a non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        match NonNull::new(ptr) {
            Some(ptr) => ptr,
            None => alloc::handle_alloc_error(layout),
        }
    }

    /// Release storage obtained from [`RawMemory::alloc_zeroed`].
    ///
    /// # Safety
    /// `ptr` must have been returned by `alloc_zeroed` with the same `layout` and must not
    /// be used afterwards.
    pub unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            alloc::dealloc(ptr.as_ptr(), layout);
        }
    }

    /// Write `value` at `offset` inside the storage at `base`.
    ///
    /// # Safety
    /// `offset` must address a properly aligned location of type `T` inside the allocation
    /// at `base`. Any previous value is overwritten without being dropped.
    pub unsafe fn write<T>(&self, base: NonNull<u8>, offset: SlotOffset, value: T) {
        base.as_ptr().add(offset.0).cast::<T>().write(value);
    }

    /// Read the value at `offset` inside the storage at `base`.
    ///
    /// # Safety
    /// `offset` must address a properly aligned, initialized location of type `T` inside
    /// the allocation at `base`.
    #[must_use]
    pub unsafe fn read<T: Copy>(&self, base: NonNull<u8>, offset: SlotOffset) -> T {
        base.as_ptr().add(offset.0).cast::<T>().read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_roundtrip() {
        // SAFETY: test-only use of the capability.
        let memory = read_privileged_static(unsafe { PrivilegedToken::new() });
        let layout = Layout::new::<[u64; 4]>();
        let base = memory.alloc_zeroed(layout);

        unsafe {
            for index in 0..4 {
                assert_eq!(memory.read::<u64>(base, SlotOffset(index * 8)), 0);
            }
            memory.write::<u64>(base, SlotOffset(16), 0xDEAD_BEEF);
            assert_eq!(memory.read::<u64>(base, SlotOffset(16)), 0xDEAD_BEEF);
            memory.dealloc(base, layout);
        }
    }

    #[test]
    fn zero_sized_does_not_allocate() {
        // SAFETY: test-only use of the capability.
        let memory = read_privileged_static(unsafe { PrivilegedToken::new() });
        let layout = Layout::new::<()>();
        let base = memory.alloc_zeroed(layout);
        assert_eq!(base, NonNull::dangling());
        unsafe { memory.dealloc(base, layout) };
    }
}
