//! TreeMap: a red-black tree whose nodes live in a generational arena.
//!
//! Links are `Option<NodeKey>`: `None` plays the role of the classical nil
//! leaf for children and of the "above the root" sentinel for parents. The
//! past-the-end cursor target is the explicit `TreePosition::End`. Rotations
//! and transplants only reassign keys, so a node keeps its `NodeKey` for as
//! long as it is in the tree, and a removed node's key never resolves again.

use crate::error::{CursorOp, MapError};
use crate::map::AssociativeMap;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::ops::Index;
use log::{debug, trace};
use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Stable identity of a tree node.
    pub struct NodeKey;
}

/// Cursor target inside a `TreeMap`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TreePosition {
    Node(NodeKey),
    End,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Color {
    Red,
    Black,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Dir {
    Left,
    Right,
}

impl Dir {
    fn flip(self) -> Dir {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[derive(Clone, Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    parent: Option<NodeKey>,
    left: Option<NodeKey>,
    right: Option<NodeKey>,
}

/// Outcome of a key descent.
enum Probe {
    Found(NodeKey),
    /// Where a new node would hang: `None` when the tree is empty.
    Vacant(Option<(NodeKey, Dir)>),
}

/// Ordered map backed by a red-black tree.
#[derive(Clone)]
pub struct TreeMap<K, V> {
    nodes: SlotMap<NodeKey, Node<K, V>>,
    root: Option<NodeKey>,
    // In-order first node; `None` iff the tree is empty.
    min: Option<NodeKey>,
}

impl<K, V> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            min: None,
        }
    }
}

// Structural helpers that never compare keys.
impl<K, V> TreeMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.min = None;
    }

    fn color(&self, n: Option<NodeKey>) -> Color {
        n.map_or(Color::Black, |k| self.nodes[k].color)
    }

    fn child(&self, n: NodeKey, dir: Dir) -> Option<NodeKey> {
        match dir {
            Dir::Left => self.nodes[n].left,
            Dir::Right => self.nodes[n].right,
        }
    }

    fn set_child(&mut self, n: NodeKey, dir: Dir, c: Option<NodeKey>) {
        match dir {
            Dir::Left => self.nodes[n].left = c,
            Dir::Right => self.nodes[n].right = c,
        }
    }

    /// Which side of its parent `n` hangs on. Meaningless for the root.
    fn side_of(&self, n: NodeKey, parent: NodeKey) -> Dir {
        if self.nodes[parent].left == Some(n) {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    /// Points whatever referenced `old` (a parent's child slot, or the root)
    /// at `new`.
    fn replace_child(&mut self, parent: Option<NodeKey>, old: NodeKey, new: Option<NodeKey>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let side = self.side_of(old, p);
                self.set_child(p, side, new);
            }
        }
    }

    /// Rotates the subtree at `x` so that `x` moves down towards `dir` and
    /// its opposite child takes its place.
    fn rotate(&mut self, x: NodeKey, dir: Dir) {
        let Some(y) = self.child(x, dir.flip()) else {
            return;
        };
        let inner = self.child(y, dir);
        self.set_child(x, dir.flip(), inner);
        if let Some(b) = inner {
            self.nodes[b].parent = Some(x);
        }
        let xp = self.nodes[x].parent;
        self.nodes[y].parent = xp;
        self.replace_child(xp, x, Some(y));
        self.set_child(y, dir, Some(x));
        self.nodes[x].parent = Some(y);
        trace!("rotated {:?} {:?}", x, dir);
    }

    fn transplant(&mut self, u: NodeKey, v: Option<NodeKey>) {
        let up = self.nodes[u].parent;
        self.replace_child(up, u, v);
        if let Some(v) = v {
            self.nodes[v].parent = up;
        }
    }

    fn extreme(&self, mut n: NodeKey, dir: Dir) -> NodeKey {
        while let Some(c) = self.child(n, dir) {
            n = c;
        }
        n
    }

    /// In-order neighbour of `n` towards `dir` (`Right` = successor).
    fn neighbour(&self, n: NodeKey, dir: Dir) -> Option<NodeKey> {
        if let Some(c) = self.child(n, dir) {
            return Some(self.extreme(c, dir.flip()));
        }
        let mut cur = n;
        let mut up = self.nodes[n].parent;
        while let Some(p) = up {
            if self.child(p, dir) != Some(cur) {
                break;
            }
            cur = p;
            up = self.nodes[p].parent;
        }
        up
    }

    fn max(&self) -> Option<NodeKey> {
        self.root.map(|r| self.extreme(r, Dir::Right))
    }

    fn insert_fixup(&mut self, mut z: NodeKey) {
        while let Some(p) = self.nodes[z].parent {
            if self.nodes[p].color == Color::Black {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let Some(g) = self.nodes[p].parent else {
                break;
            };
            let side = self.side_of(p, g);
            let uncle = self.child(g, side.flip());
            match uncle {
                Some(u) if self.nodes[u].color == Color::Red => {
                    self.nodes[p].color = Color::Black;
                    self.nodes[u].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    z = g;
                }
                _ => {
                    let mut top = p;
                    if self.side_of(z, p) != side {
                        self.rotate(p, side);
                        top = z;
                    }
                    self.nodes[top].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    self.rotate(g, side.flip());
                    break;
                }
            }
        }
        if let Some(r) = self.root {
            self.nodes[r].color = Color::Black;
        }
    }

    /// Restores black-height after a black node was spliced out. `x` is the
    /// node that took its place (possibly absent) and `parent` is x's parent.
    fn remove_fixup(&mut self, mut x: Option<NodeKey>, mut parent: Option<NodeKey>) {
        while x != self.root && self.color(x) == Color::Black {
            let Some(p) = parent else {
                break;
            };
            let side = if self.nodes[p].left == x {
                Dir::Left
            } else {
                Dir::Right
            };
            let mut w = self.child(p, side.flip());
            if let Some(s) = w.filter(|&s| self.nodes[s].color == Color::Red) {
                self.nodes[s].color = Color::Black;
                self.nodes[p].color = Color::Red;
                self.rotate(p, side);
                w = self.child(p, side.flip());
            }
            let Some(mut s) = w else {
                x = Some(p);
                parent = self.nodes[p].parent;
                continue;
            };
            let near = self.child(s, side);
            let far = self.child(s, side.flip());
            if self.color(near) == Color::Black && self.color(far) == Color::Black {
                self.nodes[s].color = Color::Red;
                x = Some(p);
                parent = self.nodes[p].parent;
                continue;
            }
            if self.color(far) == Color::Black {
                if let Some(n) = near {
                    self.nodes[n].color = Color::Black;
                }
                self.nodes[s].color = Color::Red;
                self.rotate(s, side.flip());
                let Some(ns) = self.child(p, side.flip()) else {
                    break;
                };
                s = ns;
            }
            self.nodes[s].color = self.nodes[p].color;
            self.nodes[p].color = Color::Black;
            if let Some(f) = self.child(s, side.flip()) {
                self.nodes[f].color = Color::Black;
            }
            self.rotate(p, side);
            x = self.root;
            parent = None;
        }
        if let Some(x) = x {
            self.nodes[x].color = Color::Black;
        }
    }

    /// Splices `z` out of the tree and rebalances. Returns `None` if `z` is
    /// not a live node.
    fn unlink(&mut self, z: NodeKey) -> Option<(K, V)> {
        if !self.nodes.contains_key(z) {
            return None;
        }
        let new_min = if self.min == Some(z) {
            self.neighbour(z, Dir::Right)
        } else {
            self.min
        };

        let mut removed_color = self.nodes[z].color;
        let (x, x_parent) = match (self.nodes[z].left, self.nodes[z].right) {
            (None, r) => {
                let zp = self.nodes[z].parent;
                self.transplant(z, r);
                (r, zp)
            }
            (l, None) => {
                let zp = self.nodes[z].parent;
                self.transplant(z, l);
                (l, zp)
            }
            (Some(l), Some(r)) => {
                let y = self.extreme(r, Dir::Left);
                removed_color = self.nodes[y].color;
                let x = self.nodes[y].right;
                let x_parent = if self.nodes[y].parent == Some(z) {
                    Some(y)
                } else {
                    let yp = self.nodes[y].parent;
                    self.transplant(y, x);
                    self.nodes[y].right = Some(r);
                    self.nodes[r].parent = Some(y);
                    yp
                };
                self.transplant(z, Some(y));
                self.nodes[y].left = Some(l);
                self.nodes[l].parent = Some(y);
                self.nodes[y].color = self.nodes[z].color;
                (x, x_parent)
            }
        };

        if removed_color == Color::Black {
            self.remove_fixup(x, x_parent);
        }
        if self.min != new_min {
            trace!("minimum moved from {:?} to {:?}", self.min, new_min);
            self.min = new_min;
        }
        self.nodes.remove(z).map(|n| (n.key, n.value))
    }

    fn begin(&self) -> TreePosition {
        self.min.map_or(TreePosition::End, TreePosition::Node)
    }

    fn next(&self, pos: TreePosition) -> Result<TreePosition, MapError> {
        match pos {
            TreePosition::Node(n) if self.nodes.contains_key(n) => Ok(self
                .neighbour(n, Dir::Right)
                .map_or(TreePosition::End, TreePosition::Node)),
            _ => {
                debug!("rejected advance from {:?}", pos);
                Err(MapError::InvalidCursorOperation(CursorOp::Next))
            }
        }
    }

    fn prev(&self, pos: TreePosition) -> Result<TreePosition, MapError> {
        let found = match pos {
            TreePosition::End => self.max(),
            TreePosition::Node(n) if self.nodes.contains_key(n) && self.min != Some(n) => {
                self.neighbour(n, Dir::Left)
            }
            TreePosition::Node(_) => None,
        };
        found.map(TreePosition::Node).ok_or_else(|| {
            debug!("rejected step back from {:?}", pos);
            MapError::InvalidCursorOperation(CursorOp::Prev)
        })
    }

    fn entry(&self, pos: TreePosition) -> Option<&Node<K, V>> {
        match pos {
            TreePosition::Node(n) => self.nodes.get(n),
            TreePosition::End => None,
        }
    }

    /// Removes the entry at `pos`. `End` and stale node keys are rejected.
    pub fn remove_at(&mut self, pos: TreePosition) -> Result<(K, V), MapError> {
        self.remove_and_step(pos).map(|(k, v, _)| (k, v))
    }

    fn remove_and_step(&mut self, pos: TreePosition) -> Result<(K, V, TreePosition), MapError> {
        let rejected = MapError::InvalidCursorOperation(CursorOp::Remove);
        let TreePosition::Node(z) = pos else {
            return Err(rejected);
        };
        if !self.nodes.contains_key(z) {
            return Err(rejected);
        }
        // Node keys survive relinking, so the successor computed up front
        // is still the successor afterwards.
        let next = self
            .neighbour(z, Dir::Right)
            .map_or(TreePosition::End, TreePosition::Node);
        let (k, v) = self.unlink(z).ok_or(rejected)?;
        Ok((k, v, next))
    }

    /// First entry in key order.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.min.map(|n| (&self.nodes[n].key, &self.nodes[n].value))
    }

    /// Last entry in key order.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.max().map(|n| (&self.nodes[n].key, &self.nodes[n].value))
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            map: self,
            front: self.min,
            back: self.max(),
            remaining: self.len(),
        }
    }

    /// Mutable entries in ascending key order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let mut rank: SecondaryMap<NodeKey, usize> = SecondaryMap::with_capacity(self.len());
        let mut cur = self.min;
        let mut i = 0;
        while let Some(n) = cur {
            rank.insert(n, i);
            i += 1;
            cur = self.neighbour(n, Dir::Right);
        }
        let mut slots: Vec<Option<(&K, &mut V)>> = (0..i).map(|_| None).collect();
        for (n, node) in self.nodes.iter_mut() {
            if let Some(&r) = rank.get(n) {
                slots[r] = Some((&node.key, &mut node.value));
            }
        }
        IterMut {
            inner: slots.into_iter().flatten(),
            remaining: i,
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}

impl<K: Ord, V> TreeMap<K, V> {
    fn probe<Q>(&self, q: &Q) -> Probe
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut cur = self.root;
        let mut slot = None;
        while let Some(n) = cur {
            let dir = match q.cmp(self.nodes[n].key.borrow()) {
                Ordering::Equal => return Probe::Found(n),
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
            };
            slot = Some((n, dir));
            cur = self.child(n, dir);
        }
        Probe::Vacant(slot)
    }

    fn locate<Q>(&self, q: &Q) -> Option<NodeKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.probe(q) {
            Probe::Found(n) => Some(n),
            Probe::Vacant(_) => None,
        }
    }

    /// Hangs a new red node at `slot` and rebalances.
    fn attach(&mut self, key: K, value: V, slot: Option<(NodeKey, Dir)>) -> NodeKey {
        let parent = slot.map(|(p, _)| p);
        let color = if parent.is_some() {
            Color::Red
        } else {
            Color::Black
        };
        let n = self.nodes.insert(Node {
            key,
            value,
            color,
            parent,
            left: None,
            right: None,
        });
        match slot {
            None => self.root = Some(n),
            Some((p, dir)) => self.set_child(p, dir, Some(n)),
        }
        // The new node is the minimum iff it hangs left of the old minimum.
        let is_min = match slot {
            None => true,
            Some((p, dir)) => dir == Dir::Left && self.min == Some(p),
        };
        if is_min {
            self.min = Some(n);
        }
        self.insert_fixup(n);
        n
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.locate(q).map(|n| &self.nodes[n].value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let n = self.locate(q)?;
        self.nodes.get_mut(n).map(|node| &mut node.value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.locate(q).is_some()
    }

    pub fn lookup<Q>(&self, q: &Q) -> Result<&V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.get(q).ok_or(MapError::KeyNotFound)
    }

    pub fn lookup_mut<Q>(&mut self, q: &Q) -> Result<&mut V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.get_mut(q).ok_or(MapError::KeyNotFound)
    }

    pub fn get_or_insert(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Returns the value for `key`, running `default` only on a miss.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let n = match self.probe(&key) {
            Probe::Found(n) => n,
            Probe::Vacant(slot) => self.attach(key, default(), slot),
        };
        &mut self.nodes[n].value
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.probe(&key) {
            Probe::Found(n) => Some(core::mem::replace(&mut self.nodes[n].value, value)),
            Probe::Vacant(slot) => {
                self.attach(key, value, slot);
                None
            }
        }
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Result<V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let n = self.locate(q).ok_or(MapError::KeyNotFound)?;
        self.unlink(n)
            .map(|(_, v)| v)
            .ok_or(MapError::KeyNotFound)
    }

    /// Verifies the red-black and bookkeeping invariants, describing the
    /// first violation found.
    #[cfg(any(test, feature = "bench_internal"))]
    pub fn check_invariants(&self) -> Result<(), String> {
        let Some(root) = self.root else {
            if self.min.is_some() || !self.nodes.is_empty() {
                return Err("empty root but nodes or min present".into());
            }
            return Ok(());
        };
        if self.nodes[root].parent.is_some() {
            return Err("root has a parent".into());
        }
        if self.nodes[root].color != Color::Black {
            return Err("root is red".into());
        }
        let mut count = 0;
        self.check_subtree(root, &mut count)?;
        if count != self.nodes.len() {
            return Err(format!("{} reachable nodes, {} stored", count, self.nodes.len()));
        }
        if self.min != Some(self.extreme(root, Dir::Left)) {
            return Err("cached minimum is not the leftmost node".into());
        }
        let mut keys = self.keys();
        if let Some(mut prev) = keys.next() {
            for k in keys {
                if prev >= k {
                    return Err("in-order keys are not strictly increasing".into());
                }
                prev = k;
            }
        }
        Ok(())
    }

    /// Returns the black-height of the subtree at `n`.
    #[cfg(any(test, feature = "bench_internal"))]
    fn check_subtree(&self, n: NodeKey, count: &mut usize) -> Result<usize, String> {
        *count += 1;
        let node = &self.nodes[n];
        let mut heights = [0usize; 2];
        for (i, c) in [node.left, node.right].into_iter().enumerate() {
            let Some(c) = c else {
                heights[i] = 1;
                continue;
            };
            if self.nodes[c].parent != Some(n) {
                return Err(format!("child {:?} does not point back to {:?}", c, n));
            }
            if node.color == Color::Red && self.nodes[c].color == Color::Red {
                return Err(format!("red node {:?} has a red child", n));
            }
            heights[i] = self.check_subtree(c, count)?;
        }
        if heights[0] != heights[1] {
            return Err(format!("unequal black-height below {:?}", n));
        }
        Ok(heights[0] + usize::from(node.color == Color::Black))
    }
}

impl<K: Ord, V> AssociativeMap for TreeMap<K, V> {
    type Key = K;
    type Value = V;
    type Position = TreePosition;

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn get(&self, key: &K) -> Option<&V> {
        TreeMap::get(self, key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        TreeMap::get_mut(self, key)
    }

    fn get_or_insert(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        TreeMap::get_or_insert(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        TreeMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Result<V, MapError> {
        TreeMap::remove(self, key)
    }

    fn remove_and_next(&mut self, pos: TreePosition) -> Result<(K, V, TreePosition), MapError> {
        self.remove_and_step(pos)
    }

    fn clear(&mut self) {
        TreeMap::clear(self)
    }

    fn begin_position(&self) -> TreePosition {
        self.begin()
    }

    fn end_position(&self) -> TreePosition {
        TreePosition::End
    }

    fn find_position(&self, key: &K) -> TreePosition {
        self.locate(key)
            .map_or(TreePosition::End, TreePosition::Node)
    }

    fn next_position(&self, pos: TreePosition) -> Result<TreePosition, MapError> {
        self.next(pos)
    }

    fn prev_position(&self, pos: TreePosition) -> Result<TreePosition, MapError> {
        self.prev(pos)
    }

    fn entry_at(&self, pos: TreePosition) -> Result<(&K, &V), MapError> {
        self.entry(pos)
            .map(|n| (&n.key, &n.value))
            .ok_or(MapError::KeyNotFound)
    }

    fn entry_at_mut(&mut self, pos: TreePosition) -> Result<(&K, &mut V), MapError> {
        match pos {
            TreePosition::Node(n) => self.nodes.get_mut(n),
            TreePosition::End => None,
        }
        .map(|node| (&node.key, &mut node.value))
        .ok_or(MapError::KeyNotFound)
    }
}

/// Equal when both hold the same entries in the same key order.
impl<K: PartialEq, V: PartialEq> PartialEq for TreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for TreeMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, Q> Index<&Q> for TreeMap<K, V>
where
    K: Ord + Borrow<Q>,
    Q: ?Sized + Ord,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not present in TreeMap")
    }
}

impl<K: Ord, V> Extend<(K, V)> for TreeMap<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Later pairs overwrite earlier pairs with the same key.
impl<K: Ord, V> FromIterator<(K, V)> for TreeMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = TreeMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for TreeMap<K, V> {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Iterator over immutable entries in key order; double-ended.
pub struct Iter<'a, K, V> {
    map: &'a TreeMap<K, V>,
    front: Option<NodeKey>,
    back: Option<NodeKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let n = self.front?;
        self.remaining -= 1;
        self.front = self.map.neighbour(n, Dir::Right);
        let node = &self.map.nodes[n];
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let n = self.back?;
        self.remaining -= 1;
        self.back = self.map.neighbour(n, Dir::Left);
        let node = &self.map.nodes[n];
        Some((&node.key, &node.value))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

/// Iterator over mutable entries in key order; double-ended.
pub struct IterMut<'a, K, V> {
    inner: core::iter::Flatten<std::vec::IntoIter<Option<(&'a K, &'a mut V)>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for IterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self.inner.next_back()?;
        self.remaining -= 1;
        Some(item)
    }
}

impl<'a, K, V> ExactSizeIterator for IterMut<'a, K, V> {}

impl<'a, K, V> IntoIterator for &'a TreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut TreeMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeMap<i32, &'static str> {
        let mut m = TreeMap::new();
        for k in [5, 3, 8, 1, 4, 7, 9] {
            *m.get_or_insert(k) = "x";
        }
        m
    }

    fn keys_of(m: &TreeMap<i32, &'static str>) -> Vec<i32> {
        m.keys().copied().collect()
    }

    #[test]
    fn in_order_traversal_then_remove_root_key() {
        let mut m = sample();
        m.check_invariants().unwrap();
        assert_eq!(keys_of(&m), [1, 3, 4, 5, 7, 8, 9]);

        assert_eq!(m.remove(&5), Ok("x"));
        m.check_invariants().unwrap();
        assert_eq!(keys_of(&m), [1, 3, 4, 7, 8, 9]);
        assert_eq!(m.find(&5), m.cursor_end());
    }

    #[test]
    fn lookup_fails_after_removal() {
        let mut m: TreeMap<i32, String> = TreeMap::new();
        m.insert(1, "a".to_string());
        m.insert(2, "b".to_string());
        m.remove(&1).unwrap();
        assert_eq!(m.lookup(&1), Err(MapError::KeyNotFound));
        assert_eq!(m.lookup(&2).map(String::as_str), Ok("b"));
        assert_eq!(m.remove(&1), Err(MapError::KeyNotFound));
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let mut m = TreeMap::new();
        for k in 0..1000 {
            m.insert(k, k * 2);
        }
        m.check_invariants().unwrap();
        assert_eq!(m.len(), 1000);
        assert_eq!(m.first_key_value(), Some((&0, &0)));
        assert_eq!(m.last_key_value(), Some((&999, &1998)));
        for k in (0..1000).step_by(3) {
            assert_eq!(m.remove(&k), Ok(k * 2));
        }
        m.check_invariants().unwrap();
        assert_eq!(m.first_key_value(), Some((&1, &2)));
    }

    #[test]
    fn removing_the_minimum_updates_front() {
        let mut m = sample();
        assert_eq!(m.cursor_front().key(), Ok(&1));
        m.remove(&1).unwrap();
        assert_eq!(m.cursor_front().key(), Ok(&3));
        m.remove(&3).unwrap();
        m.remove(&4).unwrap();
        assert_eq!(m.cursor_front().key(), Ok(&5));
        m.check_invariants().unwrap();
    }

    #[test]
    fn emptying_the_tree_resets_min() {
        let mut m = sample();
        for k in [9, 1, 5, 3, 8, 7, 4] {
            m.remove(&k).unwrap();
            m.check_invariants().unwrap();
        }
        assert!(m.is_empty());
        assert_eq!(m.first_key_value(), None);
        assert_eq!(m.cursor_front(), m.cursor_end());
    }

    #[test]
    fn cursor_walks_both_directions() {
        let m = sample();
        let mut c = m.cursor_front();
        let mut forward = Vec::new();
        while !c.is_end() {
            forward.push(*c.key().unwrap());
            c.move_next().unwrap();
        }
        assert_eq!(forward, [1, 3, 4, 5, 7, 8, 9]);
        assert_eq!(
            c.move_next(),
            Err(MapError::InvalidCursorOperation(CursorOp::Next))
        );
        assert_eq!(c.value(), Err(MapError::KeyNotFound));

        let mut backward = Vec::new();
        while c.move_prev().is_ok() {
            backward.push(*c.key().unwrap());
        }
        assert_eq!(backward, [9, 8, 7, 5, 4, 3, 1]);
        assert_eq!(c, m.cursor_front());
    }

    #[test]
    fn step_back_on_empty_tree_fails() {
        let m: TreeMap<i32, i32> = TreeMap::new();
        let mut c = m.cursor_end();
        assert_eq!(
            c.move_prev(),
            Err(MapError::InvalidCursorOperation(CursorOp::Prev))
        );
    }

    #[test]
    fn stale_position_is_rejected() {
        let mut m = sample();
        let pos = m.find_position(&4);
        m.remove(&4).unwrap();
        assert_eq!(m.entry_at(pos), Err(MapError::KeyNotFound));
        assert_eq!(
            m.next_position(pos),
            Err(MapError::InvalidCursorOperation(CursorOp::Next))
        );
        assert_eq!(
            m.prev_position(pos),
            Err(MapError::InvalidCursorOperation(CursorOp::Prev))
        );
        assert_eq!(
            m.remove_at(pos),
            Err(MapError::InvalidCursorOperation(CursorOp::Remove))
        );
        m.insert(4, "again");
        assert_ne!(m.find_position(&4), pos, "stale key must not alias a new node");
    }

    #[test]
    fn remove_current_advances_in_key_order() {
        let mut m = sample();
        let mut c = m.find_mut(&3);
        assert_eq!(c.remove_current(), Ok((3, "x")));
        assert_eq!(c.key(), Ok(&4));
        *c.value_mut().unwrap() = "edited";
        c.move_next().unwrap();
        assert_eq!(c.remove_current(), Ok((5, "x")));
        assert_eq!(c.key(), Ok(&7));
        m.check_invariants().unwrap();
        assert_eq!(m.get(&4), Some(&"edited"));
        assert_eq!(keys_of(&m), [1, 4, 7, 8, 9]);
    }

    #[test]
    fn remove_at_end_is_rejected() {
        let mut m = sample();
        assert_eq!(
            m.remove_at(TreePosition::End),
            Err(MapError::InvalidCursorOperation(CursorOp::Remove))
        );
        assert_eq!(m.len(), 7);
    }

    #[test]
    fn double_ended_iteration_meets_in_the_middle() {
        let m = sample();
        let mut it = m.iter();
        assert_eq!(it.next().map(|(k, _)| *k), Some(1));
        assert_eq!(it.next_back().map(|(k, _)| *k), Some(9));
        assert_eq!(it.len(), 5);
        let rest: Vec<_> = it.map(|(k, _)| *k).collect();
        assert_eq!(rest, [3, 4, 5, 7, 8]);
        let rev: Vec<_> = m.keys().rev().copied().collect();
        assert_eq!(rev, [9, 8, 7, 5, 4, 3, 1]);
    }

    #[test]
    fn iter_mut_visits_in_order() {
        let mut m: TreeMap<i32, i32> = [(3, 0), (1, 0), (2, 0)].into();
        let mut seen = Vec::new();
        for (i, (k, v)) in m.iter_mut().enumerate() {
            seen.push(*k);
            *v = i as i32;
        }
        assert_eq!(seen, [1, 2, 3]);
        assert_eq!(m[&3], 2);
        let last = m.iter_mut().next_back().map(|(k, _)| *k);
        assert_eq!(last, Some(3));
    }

    #[test]
    fn equality_is_by_contents_in_order() {
        let a: TreeMap<i32, &str> = [(1, "a"), (2, "b")].into();
        let b: TreeMap<i32, &str> = [(2, "b"), (1, "a")].into();
        assert_eq!(a, b);
        let c: TreeMap<i32, &str> = [(1, "a"), (2, "c")].into();
        assert_ne!(a, c);
    }

    #[test]
    fn clone_is_deep() {
        let a = sample();
        let mut b = a.clone();
        b.check_invariants().unwrap();
        *b.get_or_insert(1) = "y";
        b.remove(&9).unwrap();
        assert_eq!(a.get(&1), Some(&"x"));
        assert!(a.contains_key(&9));
        assert_ne!(a, b);
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut a = sample();
        let b = core::mem::take(&mut a);
        assert!(a.is_empty());
        assert_eq!(a.len(), 0);
        assert_eq!(b.len(), 7);
        a.insert(1, "fresh");
        a.check_invariants().unwrap();
    }

    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: TreeMap<String, i32> = TreeMap::new();
        m.insert("hello".to_string(), 1);
        assert!(m.contains_key("hello"));
        assert!(!m.contains_key("world"));
        assert_eq!(m["hello"], 1);
    }
}
