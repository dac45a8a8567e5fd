//! Bidirectional cursors over any `AssociativeMap`.
//!
//! A cursor pairs a borrow of its map with a position. Stepping is delegated
//! to the map, so each backend keeps its own notion of order (bucket order
//! for `ChainedHashMap`, key order for `TreeMap`). Holding a cursor borrows
//! the map, which rules out structural changes behind the cursor's back;
//! `CursorMut::remove_current` is the only way to remove while positioned.

use crate::error::MapError;
use crate::map::AssociativeMap;
use core::fmt;

/// Read-only cursor.
pub struct Cursor<'a, M: AssociativeMap> {
    map: &'a M,
    pos: M::Position,
}

impl<'a, M: AssociativeMap> Cursor<'a, M> {
    pub(crate) fn new(map: &'a M, pos: M::Position) -> Self {
        Self { map, pos }
    }

    pub fn position(&self) -> M::Position {
        self.pos
    }

    pub fn is_end(&self) -> bool {
        self.pos == self.map.end_position()
    }

    /// The entry under the cursor. Fails with `KeyNotFound` at the end.
    pub fn key_value(&self) -> Result<(&'a M::Key, &'a M::Value), MapError> {
        let map: &'a M = self.map;
        map.entry_at(self.pos)
    }

    pub fn key(&self) -> Result<&'a M::Key, MapError> {
        self.key_value().map(|(k, _)| k)
    }

    pub fn value(&self) -> Result<&'a M::Value, MapError> {
        self.key_value().map(|(_, v)| v)
    }

    pub fn move_next(&mut self) -> Result<(), MapError> {
        self.pos = self.map.next_position(self.pos)?;
        Ok(())
    }

    pub fn move_prev(&mut self) -> Result<(), MapError> {
        self.pos = self.map.prev_position(self.pos)?;
        Ok(())
    }
}

impl<'a, M: AssociativeMap> Clone for Cursor<'a, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, M: AssociativeMap> Copy for Cursor<'a, M> {}

/// Cursors are equal when they belong to the same map instance and sit at
/// the same position.
impl<'a, M: AssociativeMap> PartialEq for Cursor<'a, M> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.map, other.map) && self.pos == other.pos
    }
}

impl<'a, M: AssociativeMap> Eq for Cursor<'a, M> {}

impl<'a, M: AssociativeMap> fmt::Debug for Cursor<'a, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor").field("pos", &self.pos).finish()
    }
}

/// Cursor with exclusive access: can edit values and remove entries.
pub struct CursorMut<'a, M: AssociativeMap> {
    map: &'a mut M,
    pos: M::Position,
}

impl<'a, M: AssociativeMap> CursorMut<'a, M> {
    pub(crate) fn new(map: &'a mut M, pos: M::Position) -> Self {
        Self { map, pos }
    }

    pub fn position(&self) -> M::Position {
        self.pos
    }

    pub fn is_end(&self) -> bool {
        self.pos == self.map.end_position()
    }

    pub fn key_value(&self) -> Result<(&M::Key, &M::Value), MapError> {
        self.map.entry_at(self.pos)
    }

    pub fn key(&self) -> Result<&M::Key, MapError> {
        self.key_value().map(|(k, _)| k)
    }

    pub fn value(&self) -> Result<&M::Value, MapError> {
        self.key_value().map(|(_, v)| v)
    }

    pub fn value_mut(&mut self) -> Result<&mut M::Value, MapError> {
        self.map.entry_at_mut(self.pos).map(|(_, v)| v)
    }

    pub fn move_next(&mut self) -> Result<(), MapError> {
        self.pos = self.map.next_position(self.pos)?;
        Ok(())
    }

    pub fn move_prev(&mut self) -> Result<(), MapError> {
        self.pos = self.map.prev_position(self.pos)?;
        Ok(())
    }

    /// Removes the entry under the cursor and moves to its successor.
    /// At the end position this fails and the map is left untouched.
    pub fn remove_current(&mut self) -> Result<(M::Key, M::Value), MapError> {
        let (k, v, next) = self.map.remove_and_next(self.pos)?;
        self.pos = next;
        Ok((k, v))
    }

    /// Downgrades to a read-only cursor at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, M> {
        Cursor::new(self.map, self.pos)
    }
}

impl<'a, M: AssociativeMap> fmt::Debug for CursorMut<'a, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorMut").field("pos", &self.pos).finish()
    }
}
