use alloc::vec::Vec;

use super::handle::Handle;
use crate::error::{Error, Result};

/// Slot arena with handle reuse and an upper bound on live elements.
///
/// `free` always has spare capacity for every slot, so [`Arena::take`] never allocates.
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
    limit: usize,
}

impl<T: Clone> Clone for Arena<T> {
    // A derived clone would size `free` to its length and drop the reserved room.
    fn clone(&self) -> Self {
        let mut free = Vec::with_capacity(self.slots.len());
        free.extend_from_slice(&self.free);
        Self {
            slots: self.slots.clone(),
            free,
            limit: self.limit,
        }
    }
}

impl<T> Arena<T> {
    pub(crate) const fn new(limit: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            limit: if limit < Handle::MAX { limit } else { Handle::MAX },
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    /// Guarantees that the next `additional` calls to [`Arena::alloc`] succeed without allocating.
    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let fresh = additional.saturating_sub(self.free.len());
        if fresh == 0 {
            return Ok(());
        }
        if self.slots.len() + fresh > self.limit {
            log::debug!("node budget exhausted: {} live, {} requested, limit {}", self.len(), additional, self.limit);
            return Err(Error::OutOfMemory);
        }
        self.slots.try_reserve(fresh).map_err(|_| Error::OutOfMemory)?;
        let wanted = (self.slots.len() + fresh).saturating_sub(self.free.len());
        self.free.try_reserve(wanted).map_err(|_| Error::OutOfMemory)?;
        Ok(())
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(h) = self.free.pop() {
            self.slots[h.to_index()] = Some(element);
            h
        } else {
            assert!(
                self.slots.len() < self.limit,
                "`Arena::alloc()` - arena is at its limit ({})",
                self.limit
            );
            self.slots.push(Some(element));
            Handle::from_index(self.slots.len() - 1)
        }
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    /// Borrows two distinct elements mutably at once.
    pub(crate) fn get_pair_mut(&mut self, a: Handle, b: Handle) -> (&mut T, &mut T) {
        let (ia, ib) = (a.to_index(), b.to_index());
        assert_ne!(ia, ib, "`Arena::get_pair_mut()` - handles alias!");
        let (first, second) = if ia < ib {
            let (lo, hi) = self.slots.split_at_mut(ib);
            (&mut lo[ia], &mut hi[0])
        } else {
            let (lo, hi) = self.slots.split_at_mut(ia);
            (&mut hi[0], &mut lo[ib])
        };
        (
            first.as_mut().expect("`Arena::get_pair_mut()` - `a` is invalid!"),
            second.as_mut().expect("`Arena::get_pair_mut()` - `b` is invalid!"),
        )
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()].take().expect("`Arena::take()` - `handle` is invalid!");
        self.free.push(handle);
        element
    }

    #[cfg(test)]
    pub(crate) fn free_capacity(&self) -> usize {
        self.free.capacity()
    }

    #[cfg(test)]
    pub(crate) fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// Handles of every live element, in slot order.
    #[cfg(test)]
    pub(crate) fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.slots.iter().enumerate().filter(|(_, slot)| slot.is_some()).map(|(index, _)| Handle::from_index(index))
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
