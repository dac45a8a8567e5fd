//! ChainedHashMap: fixed bucket count, one unordered chain per bucket.
//!
//! Entry with key `k` always lives in bucket `hash(k) % capacity`. The
//! bucket count is chosen at construction and never changes; there is no
//! rehashing, so very large maps degrade to long chains.

use crate::error::{CursorOp, MapError};
use crate::map::AssociativeMap;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;
use log::{debug, trace};
use std::collections::vec_deque;
use std::collections::VecDeque;

/// Bucket count used by `ChainedHashMap::new`.
pub const DEFAULT_CAPACITY: usize = 64_037;

#[derive(Clone, Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
}

type Bucket<K, V> = VecDeque<Entry<K, V>>;

/// Location of an entry: bucket index plus slot within the chain.
/// The end position is `bucket == capacity`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct BucketPosition {
    bucket: usize,
    slot: usize,
}

impl BucketPosition {
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

#[derive(Clone)]
pub struct ChainedHashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    buckets: Box<[Bucket<K, V>]>,
    len: usize,
    // Lowest non-empty bucket, or `buckets.len()` when empty.
    first_occupied: usize,
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A map with `buckets` chains; zero is treated as one.
    pub fn with_capacity(buckets: usize) -> Self {
        Self::with_capacity_and_hasher(buckets, Default::default())
    }
}

impl<K, V> Default for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    pub fn with_capacity_and_hasher(buckets: usize, hasher: S) -> Self {
        let capacity = buckets.max(1);
        let buckets: Box<[Bucket<K, V>]> = (0..capacity).map(|_| VecDeque::new()).collect();
        Self {
            hasher,
            buckets,
            len: 0,
            first_occupied: capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets, fixed for the map's lifetime.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    fn bucket_of<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        (self.hasher.hash_one(q) % self.buckets.len() as u64) as usize
    }

    fn locate<Q>(&self, q: &Q) -> Option<BucketPosition>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let bucket = self.bucket_of(q);
        self.buckets[bucket]
            .iter()
            .position(|e| e.key.borrow() == q)
            .map(|slot| BucketPosition { bucket, slot })
    }

    fn end(&self) -> BucketPosition {
        BucketPosition {
            bucket: self.buckets.len(),
            slot: 0,
        }
    }

    fn first_occupied_from(&self, start: usize) -> usize {
        (start..self.buckets.len())
            .find(|&i| !self.buckets[i].is_empty())
            .unwrap_or(self.buckets.len())
    }

    fn entry(&self, pos: BucketPosition) -> Option<&Entry<K, V>> {
        self.buckets.get(pos.bucket)?.get(pos.slot)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let pos = self.locate(q)?;
        self.entry(pos).map(|e| &e.value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let pos = self.locate(q)?;
        self.buckets[pos.bucket].get_mut(pos.slot).map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.locate(q).is_some()
    }

    pub fn lookup<Q>(&self, q: &Q) -> Result<&V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(MapError::KeyNotFound)
    }

    pub fn lookup_mut<Q>(&mut self, q: &Q) -> Result<&mut V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_mut(q).ok_or(MapError::KeyNotFound)
    }

    pub fn get_or_insert(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Returns the value for `key`; on a miss the new entry is pushed to the
    /// front of its bucket with the value produced by `default`.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let bucket = self.bucket_of(&key);
        let slot = match self.buckets[bucket].iter().position(|e| e.key == key) {
            Some(slot) => slot,
            None => {
                let value = default();
                self.buckets[bucket].push_front(Entry { key, value });
                self.len += 1;
                if bucket < self.first_occupied {
                    self.first_occupied = bucket;
                }
                0
            }
        };
        &mut self.buckets[bucket][slot].value
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(pos) = self.locate(&key) {
            let slot = &mut self.buckets[pos.bucket][pos.slot].value;
            return Some(core::mem::replace(slot, value));
        }
        let _ = self.get_or_insert_with(key, || value);
        None
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Result<V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let pos = self.locate(q).ok_or(MapError::KeyNotFound)?;
        self.unlink(pos)
            .map(|(_, v, _)| v)
            .ok_or(MapError::KeyNotFound)
    }

    /// Removes the entry at `pos`. The end position, or any position that
    /// does not address an entry, is rejected.
    pub fn remove_at(&mut self, pos: BucketPosition) -> Result<(K, V), MapError> {
        self.unlink(pos)
            .map(|(k, v, _)| (k, v))
            .ok_or(MapError::InvalidCursorOperation(CursorOp::Remove))
    }

    fn unlink(&mut self, pos: BucketPosition) -> Option<(K, V, BucketPosition)> {
        let entry = self.buckets.get_mut(pos.bucket)?.remove(pos.slot)?;
        self.len -= 1;
        let remaining = self.buckets[pos.bucket].len();
        if remaining == 0 && pos.bucket == self.first_occupied {
            self.first_occupied = self.first_occupied_from(pos.bucket + 1);
            trace!(
                "bucket {} emptied; first occupied bucket is now {}",
                pos.bucket,
                self.first_occupied
            );
        }
        let next = if pos.slot < remaining {
            pos
        } else {
            BucketPosition {
                bucket: self.first_occupied_from(pos.bucket + 1),
                slot: 0,
            }
        };
        Some((entry.key, entry.value, next))
    }

    pub fn clear(&mut self) {
        for bucket in self.buckets[self.first_occupied..].iter_mut() {
            bucket.clear();
        }
        self.len = 0;
        self.first_occupied = self.buckets.len();
    }

    fn begin(&self) -> BucketPosition {
        if self.len == 0 {
            return self.end();
        }
        BucketPosition {
            bucket: self.first_occupied,
            slot: 0,
        }
    }

    fn next(&self, pos: BucketPosition) -> Result<BucketPosition, MapError> {
        let chain_len = match self.buckets.get(pos.bucket) {
            Some(bucket) if pos.slot < bucket.len() => bucket.len(),
            _ => {
                debug!("rejected advance from {:?}", pos);
                return Err(MapError::InvalidCursorOperation(CursorOp::Next));
            }
        };
        if pos.slot + 1 < chain_len {
            return Ok(BucketPosition {
                bucket: pos.bucket,
                slot: pos.slot + 1,
            });
        }
        Ok(BucketPosition {
            bucket: self.first_occupied_from(pos.bucket + 1),
            slot: 0,
        })
    }

    fn prev(&self, pos: BucketPosition) -> Result<BucketPosition, MapError> {
        let rejected = || {
            debug!("rejected step back from {:?}", pos);
            MapError::InvalidCursorOperation(CursorOp::Prev)
        };
        let capacity = self.buckets.len();
        if self.len == 0 || pos.bucket > capacity {
            return Err(rejected());
        }
        if pos.bucket < capacity {
            if pos.slot >= self.buckets[pos.bucket].len() {
                return Err(rejected());
            }
            if pos.slot > 0 {
                return Ok(BucketPosition {
                    bucket: pos.bucket,
                    slot: pos.slot - 1,
                });
            }
        }
        (self.first_occupied..pos.bucket)
            .rev()
            .find(|&i| !self.buckets[i].is_empty())
            .map(|bucket| BucketPosition {
                bucket,
                slot: self.buckets[bucket].len() - 1,
            })
            .ok_or_else(rejected)
    }

    /// Entries in bucket order; within a bucket, most recently inserted first.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets[self.first_occupied..].iter(),
            chain: None,
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.len;
        IterMut {
            buckets: self.buckets[self.first_occupied..].iter_mut(),
            chain: None,
            remaining,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}

impl<K, V, S> AssociativeMap for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Key = K;
    type Value = V;
    type Position = BucketPosition;

    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, key: &K) -> Option<&V> {
        ChainedHashMap::get(self, key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        ChainedHashMap::get_mut(self, key)
    }

    fn get_or_insert(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        ChainedHashMap::get_or_insert(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        ChainedHashMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Result<V, MapError> {
        ChainedHashMap::remove(self, key)
    }

    fn remove_and_next(&mut self, pos: BucketPosition) -> Result<(K, V, BucketPosition), MapError> {
        self.unlink(pos)
            .ok_or(MapError::InvalidCursorOperation(CursorOp::Remove))
    }

    fn clear(&mut self) {
        ChainedHashMap::clear(self)
    }

    fn begin_position(&self) -> BucketPosition {
        self.begin()
    }

    fn end_position(&self) -> BucketPosition {
        self.end()
    }

    fn find_position(&self, key: &K) -> BucketPosition {
        self.locate(key).unwrap_or_else(|| self.end())
    }

    fn next_position(&self, pos: BucketPosition) -> Result<BucketPosition, MapError> {
        self.next(pos)
    }

    fn prev_position(&self, pos: BucketPosition) -> Result<BucketPosition, MapError> {
        self.prev(pos)
    }

    fn entry_at(&self, pos: BucketPosition) -> Result<(&K, &V), MapError> {
        self.entry(pos)
            .map(|e| (&e.key, &e.value))
            .ok_or(MapError::KeyNotFound)
    }

    fn entry_at_mut(&mut self, pos: BucketPosition) -> Result<(&K, &mut V), MapError> {
        self.buckets
            .get_mut(pos.bucket)
            .and_then(|b| b.get_mut(pos.slot))
            .map(|e| (&e.key, &mut e.value))
            .ok_or(MapError::KeyNotFound)
    }
}

/// Two maps are equal when they hold the same set of keys with equal
/// values. Bucket layout, capacity and hasher state do not matter.
impl<K, V, S> PartialEq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> fmt::Debug for ChainedHashMap<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, Q> Index<&Q> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not present in ChainedHashMap")
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Later pairs overwrite earlier pairs with the same key.
impl<K, V, S> FromIterator<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Iterator over immutable entries in `ChainedHashMap`.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Bucket<K, V>>,
    chain: Option<vec_deque::Iter<'a, Entry<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.chain.as_mut().and_then(|c| c.next()) {
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
            if self.remaining == 0 {
                return None;
            }
            self.chain = Some(self.buckets.next()?.iter());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

/// Iterator over mutable entries in `ChainedHashMap`.
pub struct IterMut<'a, K, V> {
    buckets: core::slice::IterMut<'a, Bucket<K, V>>,
    chain: Option<vec_deque::IterMut<'a, Entry<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.chain.as_mut().and_then(|c| c.next()) {
                self.remaining -= 1;
                return Some((&e.key, &mut e.value));
            }
            if self.remaining == 0 {
                return None;
            }
            self.chain = Some(self.buckets.next()?.iter_mut());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for IterMut<'a, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
