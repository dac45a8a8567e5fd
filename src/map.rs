//! The contract shared by `ChainedHashMap` and `TreeMap`.

use crate::cursor::{Cursor, CursorMut};
use crate::error::MapError;
use core::fmt::Debug;

/// Common functionalities for associative maps.
///
/// Traversal is expressed through `Position` values: small `Copy` handles
/// that the owning map knows how to step forward and backward. `Cursor` and
/// `CursorMut` wrap a position together with a borrow of the map.
pub trait AssociativeMap {
    /// Key type of the map.
    type Key;
    /// Value type of the map.
    type Value;
    /// Location of an entry, or the past-the-end location.
    type Position: Copy + Eq + Debug;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: &Self::Key) -> Option<&Self::Value>;

    fn get_mut(&mut self, key: &Self::Key) -> Option<&mut Self::Value>;

    fn contains_key(&self, key: &Self::Key) -> bool {
        self.get(key).is_some()
    }

    /// Like `get`, but absence is an error.
    fn lookup(&self, key: &Self::Key) -> Result<&Self::Value, MapError> {
        self.get(key).ok_or(MapError::KeyNotFound)
    }

    fn lookup_mut(&mut self, key: &Self::Key) -> Result<&mut Self::Value, MapError> {
        self.get_mut(key).ok_or(MapError::KeyNotFound)
    }

    /// Returns the value for `key`, inserting `Default::default()` first if
    /// the key is absent.
    fn get_or_insert(&mut self, key: Self::Key) -> &mut Self::Value
    where
        Self::Value: Default;

    /// Sets the value for `key`, returning the previous one if present.
    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    fn remove(&mut self, key: &Self::Key) -> Result<Self::Value, MapError>;

    /// Removes the entry at `pos` and returns it together with the position
    /// now holding its successor (possibly the end position).
    fn remove_and_next(
        &mut self,
        pos: Self::Position,
    ) -> Result<(Self::Key, Self::Value, Self::Position), MapError>;

    fn remove_at(&mut self, pos: Self::Position) -> Result<(Self::Key, Self::Value), MapError> {
        self.remove_and_next(pos).map(|(k, v, _)| (k, v))
    }

    fn clear(&mut self);

    fn begin_position(&self) -> Self::Position;

    fn end_position(&self) -> Self::Position;

    /// Position of `key`, or the end position when absent.
    fn find_position(&self, key: &Self::Key) -> Self::Position;

    fn next_position(&self, pos: Self::Position) -> Result<Self::Position, MapError>;

    fn prev_position(&self, pos: Self::Position) -> Result<Self::Position, MapError>;

    fn entry_at(&self, pos: Self::Position) -> Result<(&Self::Key, &Self::Value), MapError>;

    fn entry_at_mut(
        &mut self,
        pos: Self::Position,
    ) -> Result<(&Self::Key, &mut Self::Value), MapError>;

    fn cursor_front(&self) -> Cursor<'_, Self>
    where
        Self: Sized,
    {
        Cursor::new(self, self.begin_position())
    }

    fn cursor_end(&self) -> Cursor<'_, Self>
    where
        Self: Sized,
    {
        Cursor::new(self, self.end_position())
    }

    fn cursor_front_mut(&mut self) -> CursorMut<'_, Self>
    where
        Self: Sized,
    {
        let pos = self.begin_position();
        CursorMut::new(self, pos)
    }

    fn cursor_end_mut(&mut self) -> CursorMut<'_, Self>
    where
        Self: Sized,
    {
        let pos = self.end_position();
        CursorMut::new(self, pos)
    }

    /// Cursor at `key`, or the end cursor when absent.
    fn find(&self, key: &Self::Key) -> Cursor<'_, Self>
    where
        Self: Sized,
    {
        Cursor::new(self, self.find_position(key))
    }

    fn find_mut(&mut self, key: &Self::Key) -> CursorMut<'_, Self>
    where
        Self: Sized,
    {
        let pos = self.find_position(key);
        CursorMut::new(self, pos)
    }
}
