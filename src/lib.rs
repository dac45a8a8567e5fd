//! assoc-maps: two single-threaded associative maps with one contract and
//! bidirectional cursors.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: offer the same "unique key to one value" map through two
//!   interchangeable engines, so a caller can swap one for the other.
//! - Engines:
//!   - ChainedHashMap<K, V, S>: fixed bucket count chosen at construction,
//!     one `VecDeque` chain per bucket, new entries pushed to the chain
//!     front. Unordered.
//!   - TreeMap<K, V>: red-black tree in a `slotmap` arena. Ordered by key.
//! - Contract: `AssociativeMap`, plus `Cursor`/`CursorMut` built on the
//!   contract's position arithmetic.
//!
//! Constraints
//! - Single-threaded; no interior mutability, no locking.
//! - No rehashing: the hash engine's bucket count never changes.
//! - Keys are immutable post-insert; there is no `key_mut`.
//! - Cursors borrow their map, so the map cannot change underneath a
//!   cursor except through `CursorMut::remove_current`.
//!
//! Positions
//! - ChainedHashMap: `(bucket, slot)`; the end is `bucket == capacity`.
//!   Stepping skips empty buckets. A cached lowest occupied bucket gives
//!   O(1) `begin` and bounds backward scans; it is lowered on insert and
//!   advanced when removal empties that bucket.
//! - TreeMap: `Node(NodeKey)` or `End`. Node keys are generational, so a
//!   position that outlives its node is detected instead of aliasing a
//!   newer node. Links are `Option<NodeKey>`: `None` stands in for the nil
//!   leaf and for "parent of the root".
//!
//! Errors
//! - `MapError::KeyNotFound`: lookup of an absent key, or reading the end
//!   position.
//! - `MapError::InvalidCursorOperation`: advancing from the end, stepping
//!   back from the first entry, removing at the end.
//!
//! Equality
//! - TreeMap: same length and identical in-order `(key, value)` sequences.
//! - ChainedHashMap: same length and every key present in both with equal
//!   values. Bucket layout, capacity and hasher seed are irrelevant.
//!
//! Copy and move
//! - `Clone` is a deep copy of every entry (the tree clones its arena, so
//!   node keys and shape are preserved).
//! - `std::mem::take` transfers ownership and leaves an empty map behind.

mod chained_hash_map;
mod chained_hash_map_proptest;
mod cursor;
mod error;
mod map;
mod tree_map;
mod tree_map_proptest;

// Public surface
pub use chained_hash_map::{BucketPosition, ChainedHashMap, DEFAULT_CAPACITY};
pub use cursor::{Cursor, CursorMut};
pub use error::{CursorOp, MapError};
pub use map::AssociativeMap;
pub use tree_map::{NodeKey, TreeMap, TreePosition};

pub mod hash {
    //! Iterator types of `ChainedHashMap`.
    pub use crate::chained_hash_map::{Iter, IterMut};
}

pub mod tree {
    //! Iterator types of `TreeMap`.
    pub use crate::tree_map::{Iter, IterMut};
}
