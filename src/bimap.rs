//! HashBiMap: public bijective map over `EntryTable`.

use crate::cursor::Cursor;
use crate::entry_table::{EntryTable, DEFAULT_EXPECTED_SIZE};
use crate::error::Result;
use crate::inverse::Inverse;
use crate::iter::{IntoIter, Iter, Keys, Values};
use crate::policy::PutPolicy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// A hash map that keeps keys and values in one-to-one correspondence.
///
/// Every pair lives in a single arena slot that is chained into a key table
/// and a value table at once, so lookups are O(1) on average from either
/// side and nothing is stored twice. Pairs are iterated in insertion order;
/// rebinding a key keeps its original position.
///
/// ```
/// use hash_bimap::{BiMapError, HashBiMap};
///
/// let mut map = HashBiMap::new();
/// map.insert("one", 1);
/// map.insert("two", 2);
/// assert_eq!(map.get("one"), Some(&1));
/// assert_eq!(map.get_by_value(&2), Some(&"two"));
///
/// // A plain insert evicts the pair that held the value before.
/// map.insert("uno", 1);
/// assert!(!map.contains_key("one"));
///
/// // The strict variant refuses instead.
/// assert_eq!(map.try_insert("eins", 1), Err(BiMapError::ValueAlreadyPresent));
///
/// assert_eq!(map.inverse().get(&1), Some(&"uno"));
/// ```
#[derive(Clone)]
pub struct HashBiMap<K, V, S = DefaultHashBuilder> {
    pub(crate) table: EntryTable<K, V, S>,
}

impl<K, V> HashBiMap<K, V, DefaultHashBuilder> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EXPECTED_SIZE)
    }

    /// Creates a map sized so `expected` pairs fit without rehashing.
    pub fn with_capacity(expected: usize) -> Self {
        Self::with_capacity_and_hasher(expected, DefaultHashBuilder::default())
    }
}

impl<K, V, S> Default for HashBiMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_capacity_and_hasher(DEFAULT_EXPECTED_SIZE, S::default())
    }
}

impl<K, V, S> HashBiMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_EXPECTED_SIZE, hasher)
    }

    pub fn with_capacity_and_hasher(expected: usize, hasher: S) -> Self {
        Self {
            table: EntryTable::with_capacity_and_hasher(expected, hasher),
        }
    }

    pub fn hasher(&self) -> &S {
        self.table.hasher()
    }

    /// Pairs that fit before the next rehash. Equal to the table length,
    /// since the load factor is 1.
    pub fn capacity(&self) -> usize {
        self.table.table_len()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.entries(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.table.entries(),
        }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.table.entries(),
        }
    }

    /// Oldest pair in insertion order.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.table.first().and_then(|h| self.table.pair(h))
    }

    /// Newest pair in insertion order.
    pub fn last(&self) -> Option<(&K, &V)> {
        self.table.last().and_then(|h| self.table.pair(h))
    }

    /// Starts a fail-fast [`Cursor`] at the oldest pair.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self)
    }

    /// The same map seen from the value side. Shares all storage.
    pub fn inverse(&self) -> &Inverse<K, V, S> {
        // SAFETY: `Inverse` is `repr(transparent)` over `HashBiMap<K, V, S>`.
        unsafe { &*(self as *const Self as *const Inverse<K, V, S>) }
    }

    pub fn inverse_mut(&mut self) -> &mut Inverse<K, V, S> {
        // SAFETY: `Inverse` is `repr(transparent)` over `HashBiMap<K, V, S>`.
        unsafe { &mut *(self as *mut Self as *mut Inverse<K, V, S>) }
    }

    pub fn into_inverse(self) -> Inverse<K, V, S> {
        Inverse { map: self }
    }
}

impl<K, V, S> HashBiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.table.seek_by_key(key)?;
        self.table.pair(h)
    }

    /// Looks up the key bound to `value`.
    pub fn get_by_value<Q>(&self, value: &Q) -> Option<&K>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.table.seek_by_value(value)?;
        self.table.pair(h).map(|(k, _)| k)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.seek_by_key(key).is_some()
    }

    pub fn contains_value<Q>(&self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.seek_by_value(value).is_some()
    }

    /// Binds `key` to `value` and returns the value `key` had before.
    ///
    /// If another key already holds `value`, that pair is removed first.
    /// Rebinding an existing key keeps its position in insertion order.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.table.force_put(key, value)
    }

    /// Like [`insert`](HashBiMap::insert) but fails with
    /// [`ValueAlreadyPresent`](crate::BiMapError::ValueAlreadyPresent)
    /// instead of evicting another key's binding.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        self.table.put(key, value, PutPolicy::Replace)
    }

    /// Adds a pair only if neither side is bound yet. The key is checked
    /// before the value. Re-inserting an existing pair succeeds.
    pub fn insert_unique(&mut self, key: K, value: V) -> Result<()> {
        self.table.put(key, value, PutPolicy::Unique).map(|_| ())
    }

    /// Insert with an explicit conflict policy.
    pub fn put(&mut self, key: K, value: V, policy: PutPolicy) -> Result<Option<V>> {
        self.table.put(key, value, policy)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.table.seek_by_key(key)?;
        self.table.remove(h)
    }

    /// Removes the pair holding `value` and returns its key.
    pub fn remove_by_value<Q>(&mut self, value: &Q) -> Option<K>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.table.seek_by_value(value)?;
        self.table.remove(h).map(|(k, _)| k)
    }

    /// Keeps only the pairs for which `f` returns true, in insertion order.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut cursor = self.cursor();
        while let Some((k, v)) = cursor
            .next(self)
            .expect("retain holds the map exclusively")
        {
            if !f(k, v) {
                cursor
                    .remove(self)
                    .expect("pair was yielded by this cursor");
            }
        }
    }

    /// Makes room for `additional` more pairs without rehashing.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }
}

impl<K, V, S> fmt::Debug for HashBiMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Two maps are equal when they hold the same pairs, in any order.
impl<K, V, S> PartialEq for HashBiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for HashBiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
}

impl<K, V, S> FromIterator<(K, V)> for HashBiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity_and_hasher(iter.size_hint().0, S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for HashBiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashBiMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> IntoIterator for HashBiMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_entries(),
        }
    }
}
