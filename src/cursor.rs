//! Detached, fail-fast cursors.
//!
//! A cursor does not borrow the map. Every step takes the map explicitly,
//! so the map can be mutated between steps; the cursor notices through the
//! map's modification counter and refuses to continue. Mutations made
//! through the cursor itself (`remove`, `set_value`) keep it valid. A
//! cursor only ever works on the map it was created from.

use crate::entry_table::{EntryTable, Handle};
use crate::error::{BiMapError, Result};
use crate::{HashBiMap, Inverse};
use core::hash::{BuildHasher, Hash};

#[derive(Clone, Debug)]
struct RawCursor {
    table_id: u64,
    next: Option<Handle>,
    current: Option<Handle>,
    expected_mod_count: u64,
    remaining: usize,
    poisoned: bool,
}

impl RawCursor {
    fn new<K, V, S>(table: &EntryTable<K, V, S>) -> Self {
        Self {
            table_id: table.id(),
            next: table.first(),
            current: None,
            expected_mod_count: table.mod_count(),
            remaining: table.len(),
            poisoned: false,
        }
    }

    fn check<K, V, S>(&mut self, table: &EntryTable<K, V, S>) -> Result<()> {
        if table.id() != self.table_id {
            return Err(BiMapError::WrongMap);
        }
        if !self.poisoned && table.mod_count() == self.expected_mod_count {
            return Ok(());
        }
        if !self.poisoned {
            tracing::debug!(
                expected = self.expected_mod_count,
                actual = table.mod_count(),
                "cursor observed a concurrent modification"
            );
            self.poisoned = true;
        }
        Err(BiMapError::ConcurrentModification)
    }

    fn advance<K, V, S>(&mut self, table: &EntryTable<K, V, S>) -> Result<Option<Handle>> {
        self.check(table)?;
        if self.remaining == 0 {
            return Ok(None);
        }
        let Some(h) = self.next else {
            return Ok(None);
        };
        self.next = table.next_in_order(h);
        self.current = Some(h);
        self.remaining -= 1;
        Ok(Some(h))
    }

    fn remove<K, V, S>(&mut self, table: &mut EntryTable<K, V, S>) -> Result<(K, V)> {
        self.check(table)?;
        let h = self.current.take().ok_or(BiMapError::IllegalCursorState)?;
        let pair = table.remove(h).ok_or(BiMapError::ConcurrentModification)?;
        self.expected_mod_count = table.mod_count();
        Ok(pair)
    }

    fn current<K, V, S>(&mut self, table: &EntryTable<K, V, S>) -> Result<Handle> {
        self.check(table)?;
        self.current.ok_or(BiMapError::IllegalCursorState)
    }

    /// Records the handle of a rebuilt current entry.
    fn replaced<K, V, S>(&mut self, table: &EntryTable<K, V, S>, h: Handle) {
        self.current = Some(h);
        self.expected_mod_count = table.mod_count();
    }
}

/// Fail-fast cursor over a [`HashBiMap`] in insertion order.
///
/// Created by [`HashBiMap::cursor`].
///
/// ```
/// use hash_bimap::HashBiMap;
///
/// let mut map: HashBiMap<&str, i32> = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
/// let mut cursor = map.cursor();
/// while let Some((_, v)) = cursor.next(&map).unwrap() {
///     if *v == 2 {
///         cursor.remove(&mut map).unwrap();
///     }
/// }
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["a", "c"]);
/// ```
#[derive(Clone, Debug)]
pub struct Cursor {
    raw: RawCursor,
}

impl Cursor {
    pub(crate) fn new<K, V, S>(map: &HashBiMap<K, V, S>) -> Self {
        Self {
            raw: RawCursor::new(&map.table),
        }
    }

    /// Pairs the cursor may still yield.
    pub fn remaining(&self) -> usize {
        self.raw.remaining
    }

    /// Advances to the next pair. Fails with
    /// [`BiMapError::ConcurrentModification`] if `map` was changed
    /// structurally by anything other than this cursor; after that the
    /// cursor stays failed.
    pub fn next<'a, K, V, S>(
        &mut self,
        map: &'a HashBiMap<K, V, S>,
    ) -> Result<Option<(&'a K, &'a V)>> {
        Ok(self
            .raw
            .advance(&map.table)?
            .and_then(|h| map.table.pair(h)))
    }

    /// Removes the pair last returned by [`next`](Cursor::next).
    pub fn remove<K, V, S>(&mut self, map: &mut HashBiMap<K, V, S>) -> Result<(K, V)> {
        self.raw.remove(&mut map.table)
    }

    /// Rebinds the key last returned by [`next`](Cursor::next) to `value`,
    /// keeping its place in insertion order. Returns the previous value.
    ///
    /// May be called repeatedly on the same pair; each call returns the
    /// value it replaced. Setting the current value again is a no-op that
    /// hands `value` back. A value bound to another key fails with
    /// [`BiMapError::ValueAlreadyPresent`] and changes nothing.
    pub fn set_value<K, V, S>(&mut self, map: &mut HashBiMap<K, V, S>, value: V) -> Result<V>
    where
        K: Eq + Hash,
        V: Eq + Hash,
        S: BuildHasher,
    {
        let h = self.raw.current(&map.table)?;
        let (old, h) = map.table.replace_value(h, value)?;
        self.raw.replaced(&map.table, h);
        Ok(old)
    }
}

/// Fail-fast cursor over an [`Inverse`] view, yielding `(&V, &K)` in the
/// forward map's insertion order.
///
/// Created by [`Inverse::cursor`].
#[derive(Clone, Debug)]
pub struct InverseCursor {
    raw: RawCursor,
}

impl InverseCursor {
    pub(crate) fn new<K, V, S>(inverse: &Inverse<K, V, S>) -> Self {
        Self {
            raw: RawCursor::new(&inverse.map.table),
        }
    }

    /// Pairs the cursor may still yield.
    pub fn remaining(&self) -> usize {
        self.raw.remaining
    }

    /// Advances to the next `(value, key)` pair.
    pub fn next<'a, K, V, S>(
        &mut self,
        inverse: &'a Inverse<K, V, S>,
    ) -> Result<Option<(&'a V, &'a K)>> {
        let table = &inverse.map.table;
        Ok(self
            .raw
            .advance(table)?
            .and_then(|h| table.pair(h))
            .map(|(k, v)| (v, k)))
    }

    /// Removes the pair last returned by [`next`](InverseCursor::next).
    pub fn remove<K, V, S>(&mut self, inverse: &mut Inverse<K, V, S>) -> Result<(V, K)> {
        self.raw
            .remove(&mut inverse.map.table)
            .map(|(k, v)| (v, k))
    }

    /// Rebinds the current value to `key`, keeping its place in insertion
    /// order. Returns the previous key. A key bound elsewhere fails with
    /// [`BiMapError::ValueAlreadyPresent`], the inverse's name for it.
    pub fn set_value<K, V, S>(&mut self, inverse: &mut Inverse<K, V, S>, key: K) -> Result<K>
    where
        K: Eq + Hash,
        V: Eq + Hash,
        S: BuildHasher,
    {
        let table = &mut inverse.map.table;
        let h = self.raw.current(table)?;
        let (old, h) = table.replace_key(h, key)?;
        self.raw.replaced(table, h);
        Ok(old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_abc() -> HashBiMap<char, u32> {
        let mut m = HashBiMap::new();
        m.insert('a', 1);
        m.insert('b', 2);
        m.insert('c', 3);
        m
    }

    /// Invariant: a fresh cursor yields every pair once, in insertion order.
    #[test]
    fn walks_in_insertion_order() {
        let m = map_abc();
        let mut c = m.cursor();
        assert_eq!(c.remaining(), 3);
        let mut seen = Vec::new();
        while let Some((k, v)) = c.next(&m).unwrap() {
            seen.push((*k, *v));
        }
        assert_eq!(seen, vec![('a', 1), ('b', 2), ('c', 3)]);
        assert_eq!(c.remaining(), 0);
        // Exhausted cursors keep returning None.
        assert_eq!(c.next(&m), Ok(None));
    }

    /// Invariant: external structural changes poison the cursor for good.
    #[test]
    fn external_remove_is_detected() {
        let mut m = map_abc();
        let mut c = m.cursor();
        assert_eq!(c.next(&m).unwrap(), Some((&'a', &1)));
        m.remove(&'b');
        assert_eq!(c.next(&m), Err(BiMapError::ConcurrentModification));
        assert_eq!(c.remove(&mut m), Err(BiMapError::ConcurrentModification));
        assert_eq!(c.next(&m), Err(BiMapError::ConcurrentModification));
    }

    /// Invariant: lookups and no-op puts do not count as modifications.
    #[test]
    fn reads_do_not_poison() {
        let mut m = map_abc();
        let mut c = m.cursor();
        c.next(&m).unwrap();
        assert_eq!(m.get(&'b'), Some(&2));
        assert_eq!(m.insert('b', 2), Some(2));
        assert_eq!(c.next(&m).unwrap(), Some((&'b', &2)));
    }

    /// Invariant: remove needs a yielded pair and works once per yield.
    #[test]
    fn remove_requires_current_pair() {
        let mut m = map_abc();
        let mut c = m.cursor();
        assert_eq!(c.remove(&mut m), Err(BiMapError::IllegalCursorState));
        c.next(&m).unwrap();
        assert_eq!(c.remove(&mut m), Ok(('a', 1)));
        assert_eq!(c.remove(&mut m), Err(BiMapError::IllegalCursorState));
        assert_eq!(c.next(&m).unwrap(), Some((&'b', &2)));
        assert_eq!(c.next(&m).unwrap(), Some((&'c', &3)));
        assert_eq!(c.next(&m).unwrap(), None);
        assert_eq!(m.len(), 2);
    }

    /// Invariant: set_value keeps the cursor's position and the pair's slot.
    #[test]
    fn set_value_keeps_position() {
        let mut m = map_abc();
        let mut c = m.cursor();
        assert_eq!(c.set_value(&mut m, 9), Err(BiMapError::IllegalCursorState));
        c.next(&m).unwrap();
        c.next(&m).unwrap();
        assert_eq!(c.set_value(&mut m, 3), Err(BiMapError::ValueAlreadyPresent));
        assert_eq!(c.set_value(&mut m, 2), Ok(2));
        assert_eq!(c.set_value(&mut m, 20), Ok(2));
        assert_eq!(c.set_value(&mut m, 21), Ok(20));
        assert_eq!(c.next(&m).unwrap(), Some((&'c', &3)));
        assert_eq!(c.next(&m).unwrap(), None);
        let pairs: Vec<_> = m.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(pairs, vec![('a', 1), ('b', 21), ('c', 3)]);
        assert_eq!(m.get_by_value(&21), Some(&'b'));
        assert!(!m.contains_value(&2));
    }

    /// Invariant: set_value repeats on one pair; remove works once per yield.
    #[test]
    fn set_value_repeats_remove_does_not() {
        let mut m = map_abc();
        let mut c = m.cursor();
        c.next(&m).unwrap();
        assert_eq!(c.set_value(&mut m, 10), Ok(1));
        assert_eq!(c.set_value(&mut m, 11), Ok(10));
        assert_eq!(c.remove(&mut m), Ok(('a', 11)));
        assert_eq!(c.remove(&mut m), Err(BiMapError::IllegalCursorState));
        assert_eq!(c.set_value(&mut m, 12), Err(BiMapError::IllegalCursorState));
        assert_eq!(c.next(&m).unwrap(), Some((&'b', &2)));
    }

    /// Invariant: a cursor never reads or writes a map it was not made from.
    #[test]
    fn foreign_map_is_rejected() {
        let a: HashBiMap<&str, i32> = [("a", 1)].into_iter().collect();
        let mut b: HashBiMap<&str, i32> = [("x", 100)].into_iter().collect();
        // Same mod count on both sides, so only the owner check can tell.
        assert_eq!(a.table.mod_count(), b.table.mod_count());
        let mut c = a.cursor();
        assert_eq!(c.next(&a).unwrap(), Some((&"a", &1)));
        assert_eq!(c.remove(&mut b), Err(BiMapError::WrongMap));
        assert_eq!(c.set_value(&mut b, 7), Err(BiMapError::WrongMap));
        assert_eq!(c.next(&b), Err(BiMapError::WrongMap));
        assert_eq!(b.get("x"), Some(&100));
        assert_eq!(b.len(), 1);
        // The cursor is still good for its own map.
        assert_eq!(c.next(&a), Ok(None));
    }

    /// Invariant: a clone is a different map for cursors.
    #[test]
    fn cursor_rejects_clone_of_its_map() {
        let mut m = map_abc();
        let mut copy = m.clone();
        let mut c = m.cursor();
        c.next(&m).unwrap();
        assert_eq!(c.remove(&mut copy), Err(BiMapError::WrongMap));
        assert_eq!(copy.len(), 3);
        assert_eq!(c.remove(&mut m), Ok(('a', 1)));

        let inv = m.inverse_mut();
        let mut ic = inv.cursor();
        let mut other = copy.into_inverse();
        assert_eq!(ic.next(&other), Err(BiMapError::WrongMap));
        assert_eq!(ic.set_value(&mut other, 'q'), Err(BiMapError::WrongMap));
        assert_eq!(ic.next(inv).unwrap(), Some((&2, &'b')));
    }

    /// Invariant: the pair can be removed after its value was replaced.
    #[test]
    fn remove_after_set_value() {
        let mut m = map_abc();
        let mut c = m.cursor();
        c.next(&m).unwrap();
        c.set_value(&mut m, 10).unwrap();
        assert_eq!(c.remove(&mut m), Ok(('a', 10)));
        assert_eq!(m.len(), 2);
    }

    /// Invariant: the inverse cursor swaps roles but walks the same order.
    #[test]
    fn inverse_cursor_swaps_roles() {
        let mut m = map_abc();
        let inv = m.inverse_mut();
        let mut c = inv.cursor();
        assert_eq!(c.next(inv).unwrap(), Some((&1, &'a')));
        assert_eq!(c.next(inv).unwrap(), Some((&2, &'b')));
        assert_eq!(c.set_value(inv, 'c'), Err(BiMapError::ValueAlreadyPresent));
        assert_eq!(c.set_value(inv, 'z'), Ok('b'));
        assert_eq!(c.remove(inv), Ok((2, 'z')));
        assert_eq!(c.next(inv).unwrap(), Some((&3, &'c')));
        let pairs: Vec<_> = m.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(pairs, vec![('a', 1), ('c', 3)]);
    }
}
