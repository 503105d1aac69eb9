//! BucketIndex: open-addressed slot array with linear probing and tombstones.
//!
//! The index never owns entries; an occupied slot holds a handle into the
//! `EntrySequence`. Positions are `hash % capacity`, probed with step 1, and
//! every probe is bounded to `capacity` steps.

use crate::sequence::EntryHandle;

/// Smallest capacity an index is ever built with.
pub(crate) const MIN_CAPACITY: usize = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    Empty,
    Occupied(EntryHandle),
    /// Previously occupied. Lookups keep probing past it; placement may reuse it.
    Tombstone,
}

/// Outcome of a lookup probe.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Probe {
    Found { slot: usize, handle: EntryHandle },
    Absent,
}

#[derive(Clone, Debug)]
pub(crate) struct BucketIndex {
    slots: Box<[Slot]>,
}

impl BucketIndex {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            slots: vec![Slot::Empty; capacity].into_boxed_slice(),
        }
    }

    /// Build a fresh index of `capacity` and place each `(hash, handle)` in
    /// the given order. Tombstones of the previous index do not carry over.
    pub(crate) fn rebuilt<I>(capacity: usize, entries: I) -> Self
    where
        I: IntoIterator<Item = (u64, EntryHandle)>,
    {
        let mut index = Self::with_capacity(capacity);
        for (hash, handle) in entries {
            index.place(hash, handle);
        }
        index
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot positions visited for `hash`, starting at its home slot.
    #[inline]
    fn probe_seq(&self, hash: u64) -> impl Iterator<Item = usize> {
        let cap = self.slots.len();
        let home = (hash % cap as u64) as usize;
        (0..cap).map(move |step| {
            let i = home + step;
            if i >= cap {
                i - cap
            } else {
                i
            }
        })
    }

    /// Probe for an occupied slot whose handle satisfies `is_match`. Stops at
    /// the first `Empty` slot; tombstones are skipped.
    pub(crate) fn find<F>(&self, hash: u64, mut is_match: F) -> Probe
    where
        F: FnMut(EntryHandle) -> bool,
    {
        for slot in self.probe_seq(hash) {
            match self.slots[slot] {
                Slot::Empty => break,
                Slot::Tombstone => {}
                Slot::Occupied(handle) => {
                    if is_match(handle) {
                        return Probe::Found { slot, handle };
                    }
                }
            }
        }
        Probe::Absent
    }

    /// First non-occupied slot (empty or tombstone) on the probe for `hash`.
    pub(crate) fn vacant(&self, hash: u64) -> Option<usize> {
        self.probe_seq(hash)
            .find(|&slot| !matches!(self.slots[slot], Slot::Occupied(_)))
    }

    /// Occupy the first non-occupied slot for `hash` with `handle`.
    ///
    /// Callers keep `len * 2 <= capacity` before placing, so a vacant slot
    /// always exists.
    pub(crate) fn place(&mut self, hash: u64, handle: EntryHandle) -> usize {
        let slot = self
            .vacant(hash)
            .expect("bucket index has no vacant slot; load factor invariant broken");
        self.slots[slot] = Slot::Occupied(handle);
        slot
    }

    /// Turn an occupied slot into a tombstone.
    pub(crate) fn vacate(&mut self, slot: usize) {
        debug_assert!(matches!(self.slots[slot], Slot::Occupied(_)));
        self.slots[slot] = Slot::Tombstone;
    }

    #[cfg(test)]
    pub(crate) fn slot(&self, slot: usize) -> Slot {
        self.slots[slot]
    }

    #[cfg(test)]
    pub(crate) fn count(&self, kind: fn(&Slot) -> bool) -> usize {
        self.slots.iter().filter(|s| kind(s)).count()
    }
}
