//! Sequential instance layout.
//!
//! Instance storage is laid out the same way for every type: the complete storage of the
//! parent forms a prefix, and the type's own slots are appended in declaration order, each
//! aligned to its natural alignment. Because of the prefix property a slot descriptor of an
//! ancestor addresses the same bytes in every descendant's storage.

use std::alloc::Layout;

use crate::{typesystem::slot::SlotRepr, typesystem::SlotOffset, Result};

/// Incrementally computes offsets for a type's own slots.
pub(crate) struct LayoutBuilder {
    size: usize,
    align: usize,
}

impl LayoutBuilder {
    /// Start a layout that continues after the storage of `parent`
    pub(crate) fn extending(parent: Option<Layout>) -> Self {
        match parent {
            Some(layout) => LayoutBuilder {
                size: layout.size(),
                align: layout.align(),
            },
            None => LayoutBuilder { size: 0, align: 1 },
        }
    }

    /// Reserve storage for one slot and return its offset
    pub(crate) fn push(&mut self, repr: SlotRepr) -> Result<SlotOffset> {
        let align = repr.align();
        let offset = self
            .size
            .checked_next_multiple_of(align)
            .ok_or_else(|| type_error!("Instance layout overflows at {} bytes", self.size))?;

        self.size = offset
            .checked_add(repr.size())
            .ok_or_else(|| type_error!("Instance layout overflows at {} bytes", offset))?;
        self.align = self.align.max(align);

        Ok(SlotOffset(offset))
    }

    /// Finish the layout, padding the size to a multiple of the alignment
    pub(crate) fn finish(self) -> Result<Layout> {
        Layout::from_size_align(self.size, self.align)
            .map(|layout| layout.pad_to_align())
            .map_err(|e| type_error!("Invalid instance layout - {}", e))
    }
}
