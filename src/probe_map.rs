//! ProbeMap: insertion-ordered map over an open-addressed bucket index.

use crate::buckets::{BucketIndex, Probe, MIN_CAPACITY};
use crate::error::{MapError, Result};
use crate::sequence::{self, EntryHandle, EntrySequence};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::ops::Index;
use std::collections::hash_map::RandomState;

/// A hash map that iterates in insertion order.
///
/// Entries live in an insertion-ordered sequence; a separate open-addressed
/// index (linear probing, tombstone deletion) maps keys to them. The index
/// keeps `len * 2 <= capacity` after every insert and `len * 4 > capacity`
/// after every removal (floor of 2), rebuilding at double or half capacity
/// when either bound is crossed.
///
/// Inserting a key that is already present is a no-op: the first value wins.
///
/// ```
/// use probe_map::ProbeMap;
///
/// let mut m = ProbeMap::new();
/// m.insert("b", 2);
/// m.insert("a", 1);
/// assert!(!m.insert("b", 20));
/// assert_eq!(m.iter().collect::<Vec<_>>(), [(&"b", &2), (&"a", &1)]);
/// ```
#[derive(Clone)]
pub struct ProbeMap<K, V, S = RandomState> {
    hasher: S,
    buckets: BucketIndex,
    entries: EntrySequence<K, V>,
}

impl<K, V> ProbeMap<K, V>
where
    K: Eq + Hash,
{
    /// Empty map with the minimum capacity of 2.
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Empty map whose bucket index starts at `capacity` slots (at least 2).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V> Default for ProbeMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ProbeMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(MIN_CAPACITY, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let buckets = BucketIndex::with_capacity(capacity);
        Self {
            entries: EntrySequence::with_capacity(buckets.capacity() / 2),
            buckets,
            hasher,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of slots in the bucket index.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.capacity()
    }

    /// The hash builder used to hash keys.
    #[inline]
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Drop every entry and reset the bucket index to the minimum capacity.
    pub fn clear(&mut self) {
        log::trace!(
            "clearing probe map: {} entries, capacity {}",
            self.len(),
            self.capacity()
        );
        self.entries.clear();
        self.buckets = BucketIndex::with_capacity(MIN_CAPACITY);
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.entries.iter(),
        }
    }

    /// Entries in insertion order, with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.entries.iter_mut(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { it: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { it: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            it: self.iter_mut(),
        }
    }

    #[cfg(test)]
    pub(crate) fn occupied_slots(&self) -> usize {
        self.buckets
            .count(|s| matches!(s, crate::buckets::Slot::Occupied(_)))
    }

    #[cfg(test)]
    pub(crate) fn tombstone_slots(&self) -> usize {
        self.buckets
            .count(|s| *s == crate::buckets::Slot::Tombstone)
    }

    /// Rebuild the bucket index at `capacity`, re-placing live entries in
    /// iteration order. Entries and their handles are untouched.
    fn rebuild(&mut self, capacity: usize) {
        let old = self.buckets.capacity();
        self.buckets = BucketIndex::rebuilt(
            capacity,
            self.entries.iter().map(|(handle, node)| (node.hash(), handle)),
        );
        log::trace!(
            "rebuilt bucket index: capacity {} -> {}, {} live entries",
            old,
            self.buckets.capacity(),
            self.len()
        );
    }

    /// Double the capacity until `len * 2 <= capacity`.
    fn grow_if_needed(&mut self) {
        let len = self.len();
        let mut target = self.capacity();
        while len * 2 > target {
            target *= 2;
        }
        if target != self.capacity() {
            self.rebuild(target);
        }
    }

    /// Halve the capacity until `len * 4 > capacity` or the floor is reached.
    fn shrink_if_needed(&mut self) {
        let len = self.len();
        let mut target = self.capacity();
        while len * 4 <= target && target > MIN_CAPACITY {
            target = (target / 2).max(MIN_CAPACITY);
        }
        if target != self.capacity() {
            self.rebuild(target);
        }
    }
}

impl<K, V, S> ProbeMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn locate<Q>(&self, hash: u64, q: &Q) -> Probe
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.buckets
            .find(hash, |handle| self.entries[handle].key().borrow() == q)
    }

    /// Append a new entry and occupy its slot. The key must be absent.
    fn insert_new(&mut self, hash: u64, key: K, value: V) -> EntryHandle {
        let handle = self.entries.push_back(key, value, hash);
        self.buckets.place(hash, handle);
        self.grow_if_needed();
        handle
    }

    /// Build a map from `iter` with the given hasher. Duplicate keys keep
    /// their first value.
    pub fn from_iter_with_hasher<I>(iter: I, hasher: S) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        let mut map = Self::with_capacity_and_hasher(lower.saturating_mul(2), hasher);
        map.extend(iter);
        map
    }

    /// Insert `key -> value` if `key` is absent.
    ///
    /// Returns `false` and leaves the stored value untouched if the key is
    /// already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let hash = self.make_hash(&key);
        if let Probe::Found { .. } = self.locate(hash, &key) {
            return false;
        }
        self.insert_new(hash, key, value);
        true
    }

    /// Mutable access to the value for `key`, inserting `default()` first if
    /// the key is absent. `default` runs only when an entry is created.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        let handle = match self.locate(hash, &key) {
            Probe::Found { handle, .. } => handle,
            Probe::Absent => self.insert_new(hash, key, default()),
        };
        self.entries[handle].value_mut()
    }

    /// Mutable access to the value for `key`, inserting `V::default()` first
    /// if the key is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// The stored key and value for `q`, if present.
    pub fn find<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.locate(self.make_hash(q), q) {
            Probe::Found { handle, .. } => {
                let node = &self.entries[handle];
                Some((node.key(), node.value()))
            }
            Probe::Absent => None,
        }
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.locate(self.make_hash(q), q) {
            Probe::Found { handle, .. } => Some(self.entries[handle].value_mut()),
            Probe::Absent => None,
        }
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        matches!(self.locate(self.make_hash(q), q), Probe::Found { .. })
    }

    /// The value for `q`, or `MapError::NotFound`.
    pub fn at<Q>(&self, q: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(MapError::NotFound)
    }

    pub fn at_mut<Q>(&mut self, q: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_mut(q).ok_or(MapError::NotFound)
    }

    /// Remove `q` and return its value. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Remove `q` and return the stored key and value.
    ///
    /// The slot becomes a tombstone so probes for other keys still reach
    /// entries placed past it.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (slot, handle) = match self.locate(self.make_hash(q), q) {
            Probe::Found { slot, handle } => (slot, handle),
            Probe::Absent => return None,
        };
        self.buckets.vacate(slot);
        let node = self.entries.remove(handle)?;
        self.shrink_if_needed();
        Some(node.into_parts())
    }
}

impl<K, V, S> fmt::Debug for ProbeMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Equal when both maps hold the same key/value pairs, in any order.
impl<K, V, S> PartialEq for ProbeMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| v == ov))
    }
}

impl<K, V, S> Eq for ProbeMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, Q, V, S> Index<&Q> for ProbeMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// Panics if the key is not present.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, S> Extend<(K, V)> for ProbeMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts each pair; keys already present keep their value.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ProbeMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_iter_with_hasher(iter, S::default())
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ProbeMap<K, V>
where
    K: Eq + Hash,
{
    fn from(arr: [(K, V); N]) -> Self {
        Self::from_iter(arr)
    }
}

/// Iterator over `(&K, &V)` in insertion order.
pub struct Iter<'a, K, V> {
    it: sequence::Iter<'a, K, V>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, node)| (node.key(), node.value()))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|(_, node)| (node.key(), node.value()))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in insertion order.
pub struct IterMut<'a, K, V> {
    it: sequence::IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, k, v)| (k, v))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|(_, k, v)| (k, v))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

pub struct Keys<'a, K, V> {
    it: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.it.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    it: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.it.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    it: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.it.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// Owning iterator over `(K, V)` in insertion order.
pub struct IntoIter<K, V> {
    entries: EntrySequence<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        self.entries.pop_front().map(|node| node.into_parts())
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.entries.len(), Some(self.entries.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<(K, V)> {
        self.entries.pop_back().map(|node| node.into_parts())
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<'a, K, V, S> IntoIterator for &'a ProbeMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ProbeMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for ProbeMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            entries: self.entries,
        }
    }
}
