//! probe-map: an insertion-ordered hash map built from an open-addressed
//! bucket index over a linked sequence of entries.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: amortized O(1) insert/lookup/remove with iteration in insertion
//!   order, without leaning on a library hash table.
//! - Layers:
//!   - EntrySequence<K, V>: sole owner of the key/value pairs. A
//!     doubly-linked list threaded through a generational arena, so nodes
//!     never move while live and handles to removed nodes never resolve.
//!   - BucketIndex: a fixed-capacity slot array (Empty / Occupied(handle) /
//!     Tombstone) probed linearly from `hash % capacity`.
//!   - ProbeMap<K, V, S>: public API tying the two together.
//!
//! Load factor
//! - After every insert, `len * 2 <= capacity`; otherwise the index is
//!   rebuilt at double capacity.
//! - After every removal, `len * 4 > capacity`; otherwise the index is
//!   rebuilt at half capacity, repeatedly if needed, never below 2.
//! - A rebuild re-places every live entry in iteration order into a fresh
//!   index and drops all tombstones. Entries themselves stay where they are.
//! - Lookups never rebuild.
//!
//! Tombstones
//! - Removal turns the slot into a tombstone, never back to Empty, so probes
//!   for keys placed further along still reach them.
//! - Lookups and duplicate checks probe through tombstones; placement reuses
//!   the first one it meets.
//! - Every probe is bounded to `capacity` steps, so a table whose free slots
//!   are all tombstones still terminates.
//!
//! Hasher invariants
//! - Each entry stores its precomputed `u64` hash; rebuilds use the stored
//!   hash and never call `K: Hash`.
//! - The `BuildHasher` must hash equal keys identically. Clones of a map
//!   clone the hasher and therefore agree on every hash.
//!
//! Iteration and references
//! - Iterators and references returned by lookups borrow the map, so the
//!   borrow checker rules out structural mutation during a traversal and
//!   stale references after an insert, removal, or clear.
//!
//! Notes and non-goals
//! - Duplicate inserts are a silent no-op: the first value is kept.
//! - `at` is the only fallible accessor and returns `MapError::NotFound`.
//! - Single-threaded: no internal synchronization.

mod buckets;
mod error;
mod probe_map;
mod probe_map_proptest;
#[cfg(feature = "bench_internal")]
pub mod sequence;
#[cfg(not(feature = "bench_internal"))]
mod sequence;
#[cfg(feature = "serde")]
mod serde_impl;

// Public surface
pub use error::{MapError, Result};
pub use probe_map::{IntoIter, Iter, IterMut, Keys, ProbeMap, Values, ValuesMut};
