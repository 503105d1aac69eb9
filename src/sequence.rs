//! EntrySequence: insertion-ordered storage for the map's key/value pairs.
//!
//! Nodes live in a generational arena and are threaded into a doubly-linked
//! list. A node never moves while it is live, and the handle that names it
//! stays valid until the node is removed. Stale handles never resolve to a
//! newer node, even when the arena reuses the physical slot.

use core::iter::FusedIterator;
use core::ops::{Index, IndexMut};
use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Generational handle naming one live node of an `EntrySequence`.
    pub struct EntryHandle;
}

#[derive(Clone, Debug)]
pub struct Node<K, V> {
    key: K,
    value: V,
    hash: u64,
    prev: Option<EntryHandle>,
    next: Option<EntryHandle>,
}

impl<K, V> Node<K, V> {
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    #[inline]
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Hash of the key, computed once when the node was appended.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

#[derive(Clone, Debug)]
pub struct EntrySequence<K, V> {
    nodes: SlotMap<EntryHandle, Node<K, V>>,
    head: Option<EntryHandle>,
    tail: Option<EntryHandle>,
}

impl<K, V> EntrySequence<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(capacity),
            head: None,
            tail: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node at the tail and return its handle.
    pub fn push_back(&mut self, key: K, value: V, hash: u64) -> EntryHandle {
        let handle = self.nodes.insert(Node {
            key,
            value,
            hash,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(handle),
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
        handle
    }

    /// Unlink and return the node named by `handle`, or `None` if stale.
    pub fn remove(&mut self, handle: EntryHandle) -> Option<Node<K, V>> {
        let node = self.nodes.remove(handle)?;
        match node.prev {
            Some(prev) => self.nodes[prev].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.nodes[next].prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(node)
    }

    pub fn pop_front(&mut self) -> Option<Node<K, V>> {
        self.remove(self.head?)
    }

    pub fn pop_back(&mut self) -> Option<Node<K, V>> {
        self.remove(self.tail?)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterate nodes front to back.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            front: self.head,
            back: self.tail,
            remaining: self.nodes.len(),
        }
    }

    /// Iterate nodes front to back with mutable access to values.
    ///
    /// The arena only hands out disjoint `&mut` borrows in storage order, so
    /// this collects them once and replays them along the links.
    pub fn iter_mut<'a>(&'a mut self) -> IterMut<'a, K, V> {
        let len = self.nodes.len();
        let mut cursor = self.head;
        let mut by_handle: SecondaryMap<EntryHandle, (&'a K, &'a mut V, Option<EntryHandle>)> =
            SecondaryMap::with_capacity(self.nodes.capacity());
        for (handle, node) in self.nodes.iter_mut() {
            let Node {
                key, value, next, ..
            } = node;
            let key: &'a K = key;
            by_handle.insert(handle, (key, value, *next));
        }

        let mut ordered = Vec::with_capacity(len);
        while let Some(handle) = cursor {
            let Some((key, value, next)) = by_handle.remove(handle) else {
                break;
            };
            ordered.push((handle, key, value));
            cursor = next;
        }
        IterMut {
            it: ordered.into_iter(),
        }
    }
}

impl<K, V> Default for EntrySequence<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Index<EntryHandle> for EntrySequence<K, V> {
    type Output = Node<K, V>;

    /// Panics if `handle` is stale.
    #[inline]
    fn index(&self, handle: EntryHandle) -> &Node<K, V> {
        &self.nodes[handle]
    }
}

impl<K, V> IndexMut<EntryHandle> for EntrySequence<K, V> {
    #[inline]
    fn index_mut(&mut self, handle: EntryHandle) -> &mut Node<K, V> {
        &mut self.nodes[handle]
    }
}

/// Front-to-back iterator over the nodes of an `EntrySequence`.
pub struct Iter<'a, K, V> {
    nodes: &'a SlotMap<EntryHandle, Node<K, V>>,
    front: Option<EntryHandle>,
    back: Option<EntryHandle>,
    remaining: usize,
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Iter {
            nodes: self.nodes,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (EntryHandle, &'a Node<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let handle = self.front?;
        let node = self.nodes.get(handle)?;
        self.front = node.next;
        self.remaining -= 1;
        Some((handle, node))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let handle = self.back?;
        let node = self.nodes.get(handle)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some((handle, node))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Front-to-back iterator with mutable access to values.
pub struct IterMut<'a, K, V> {
    it: std::vec::IntoIter<(EntryHandle, &'a K, &'a mut V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (EntryHandle, &'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<K: Clone, V>(seq: &EntrySequence<K, V>) -> Vec<K> {
        seq.iter().map(|(_, n)| n.key().clone()).collect()
    }

    /// Invariant: nodes come back in append order; reverse iteration mirrors it.
    #[test]
    fn push_back_preserves_order() {
        let mut seq = EntrySequence::new();
        for (i, k) in ["a", "b", "c", "d"].into_iter().enumerate() {
            seq.push_back(k, i, 0);
        }
        assert_eq!(keys(&seq), ["a", "b", "c", "d"]);
        let rev: Vec<_> = seq.iter().rev().map(|(_, n)| *n.key()).collect();
        assert_eq!(rev, ["d", "c", "b", "a"]);
        assert_eq!(seq.iter().len(), 4);
    }

    /// Invariant: removing head, middle, and tail keeps the links consistent.
    #[test]
    fn remove_relinks_neighbours() {
        let mut seq = EntrySequence::new();
        let hs: Vec<_> = (0..5).map(|i| seq.push_back(i, i * 10, i as u64)).collect();

        let mid = seq.remove(hs[2]).expect("middle present");
        assert_eq!(mid.into_parts(), (2, 20));
        assert_eq!(keys(&seq), [0, 1, 3, 4]);

        seq.remove(hs[0]).expect("head present");
        assert_eq!(keys(&seq), [1, 3, 4]);

        seq.remove(hs[4]).expect("tail present");
        assert_eq!(keys(&seq), [1, 3]);
        let rev: Vec<_> = seq.iter().rev().map(|(_, n)| *n.key()).collect();
        assert_eq!(rev, [3, 1]);

        // New nodes still attach after the current tail.
        seq.push_back(9, 90, 9);
        assert_eq!(keys(&seq), [1, 3, 9]);
        assert_eq!(seq.len(), 3);
    }

    /// Invariant: a removed handle never resolves again, even after its arena
    /// slot is reused by a later append.
    #[test]
    fn stale_handle_does_not_alias() {
        let mut seq = EntrySequence::new();
        let old = seq.push_back("old", 1, 0);
        assert!(seq.remove(old).is_some());
        let new = seq.push_back("new", 2, 0);
        assert_ne!(old, new);
        assert!(seq.iter().all(|(h, _)| h != old));
        assert!(seq.remove(old).is_none());
        assert_eq!(seq[new].value(), &2);
    }

    /// Invariant: `iter_mut` walks link order, not arena order.
    #[test]
    fn iter_mut_follows_links() {
        let mut seq = EntrySequence::new();
        let a = seq.push_back("a", 1, 0);
        seq.push_back("b", 2, 0);
        seq.remove(a);
        // Reuses a's arena slot but must still come last.
        seq.push_back("c", 3, 0);

        let mut seen = Vec::new();
        for (_, k, v) in seq.iter_mut() {
            *v *= 10;
            seen.push(*k);
        }
        assert_eq!(seen, ["b", "c"]);
        let values: Vec<_> = seq.iter().map(|(_, n)| *n.value()).collect();
        assert_eq!(values, [20, 30]);
    }

    #[test]
    fn pop_front_and_back_drain_in_order() {
        let mut seq = EntrySequence::new();
        for i in 0..4 {
            seq.push_back(i, (), 0);
        }
        assert_eq!(seq.pop_front().map(|n| *n.key()), Some(0));
        assert_eq!(seq.pop_back().map(|n| *n.key()), Some(3));
        assert_eq!(keys(&seq), [1, 2]);
        seq.clear();
        assert!(seq.is_empty());
        assert!(seq.pop_front().is_none());
        assert!(seq.iter().next().is_none());
    }
}
