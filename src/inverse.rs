//! Inverse: the value-to-key view of a `HashBiMap`.
//!
//! The view owns nothing of its own. It is a `repr(transparent)` wrapper,
//! so a `&HashBiMap` and its `&Inverse` are the same pointer and inverting
//! twice hands back the original map, not a copy.

use crate::bimap::HashBiMap;
use crate::cursor::InverseCursor;
use crate::error::Result;
use crate::policy::PutPolicy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use hashbrown::hash_map::DefaultHashBuilder;

/// A [`HashBiMap<K, V, S>`] viewed with keys and values swapped.
///
/// Keys of the view are the map's values. Iteration follows the forward
/// map's insertion order. Conflict errors use the view's vocabulary: a
/// clash on the forward key is
/// [`ValueAlreadyPresent`](crate::BiMapError::ValueAlreadyPresent).
///
/// ```
/// use hash_bimap::HashBiMap;
///
/// let mut map = HashBiMap::new();
/// map.insert('a', 1);
/// map.inverse_mut().insert(2, 'b');
/// assert_eq!(map.get(&'b'), Some(&2));
/// assert!(std::ptr::eq(map.inverse().inverse(), &map));
/// ```
#[repr(transparent)]
pub struct Inverse<K, V, S = DefaultHashBuilder> {
    pub(crate) map: HashBiMap<K, V, S>,
}

impl<K, V, S> Inverse<K, V, S> {
    /// The forward map. Same instance the view was taken from.
    pub fn inverse(&self) -> &HashBiMap<K, V, S> {
        &self.map
    }

    pub fn inverse_mut(&mut self) -> &mut HashBiMap<K, V, S> {
        &mut self.map
    }

    pub fn into_inverse(self) -> HashBiMap<K, V, S> {
        self.map
    }

    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// `(&V, &K)` pairs in the forward map's insertion order.
    pub fn iter(&self) -> InverseIter<'_, K, V> {
        InverseIter {
            inner: self.map.iter(),
        }
    }

    /// The view's keys, i.e. the forward values.
    pub fn keys(&self) -> crate::iter::Values<'_, K, V> {
        self.map.values()
    }

    /// The view's values, i.e. the forward keys.
    pub fn values(&self) -> crate::iter::Keys<'_, K, V> {
        self.map.keys()
    }

    /// Oldest pair in insertion order, as `(value, key)`.
    pub fn first(&self) -> Option<(&V, &K)> {
        self.map.first().map(|(k, v)| (v, k))
    }

    /// Newest pair in insertion order, as `(value, key)`.
    pub fn last(&self) -> Option<(&V, &K)> {
        self.map.last().map(|(k, v)| (v, k))
    }

    pub fn cursor(&self) -> InverseCursor {
        InverseCursor::new(self)
    }
}

impl<K, V, S> Inverse<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
    /// Looks up the forward key bound to `value`.
    pub fn get<Q>(&self, value: &Q) -> Option<&K>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.get_by_value(value)
    }

    pub fn get_key_value<Q>(&self, value: &Q) -> Option<(&V, &K)>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.map.table.seek_by_value(value)?;
        self.map.table.pair(h).map(|(k, v)| (v, k))
    }

    /// Looks up the forward value bound to `key`.
    pub fn get_by_value<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.get(key)
    }

    pub fn contains_key<Q>(&self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_value(value)
    }

    pub fn contains_value<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(key)
    }

    /// Binds `value` to `key` and returns the key `value` had before. A
    /// pair already holding `key` is removed. Rebinding keeps the slot of
    /// the pair that held `value`.
    pub fn insert(&mut self, value: V, key: K) -> Option<K> {
        self.map.table.force_put_inverse(value, key)
    }

    /// Like [`insert`](Inverse::insert) but refuses to evict the pair
    /// holding `key`.
    pub fn try_insert(&mut self, value: V, key: K) -> Result<Option<K>> {
        self.map.table.put_inverse(value, key, PutPolicy::Replace)
    }

    /// Adds the pair only if neither side is bound; `value` is checked first.
    pub fn insert_unique(&mut self, value: V, key: K) -> Result<()> {
        self.map
            .table
            .put_inverse(value, key, PutPolicy::Unique)
            .map(|_| ())
    }

    pub fn put(&mut self, value: V, key: K, policy: PutPolicy) -> Result<Option<K>> {
        self.map.table.put_inverse(value, key, policy)
    }

    pub fn remove<Q>(&mut self, value: &Q) -> Option<K>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.remove_by_value(value)
    }

    pub fn remove_by_value<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.remove(key)
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&V, &K) -> bool,
    {
        self.map.retain(|k, v| f(v, k));
    }

    pub fn reserve(&mut self, additional: usize) {
        self.map.reserve(additional);
    }
}

impl<K, V, S> fmt::Debug for Inverse<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for Inverse<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<K, V, S> Eq for Inverse<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
}

impl<K, V, S> Clone for Inverse<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a Inverse<K, V, S> {
    type Item = (&'a V, &'a K);
    type IntoIter = InverseIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over `(&V, &K)` pairs of an [`Inverse`] view.
pub struct InverseIter<'a, K, V> {
    inner: crate::iter::Iter<'a, K, V>,
}

impl<K, V> Clone for InverseIter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for InverseIter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for InverseIter<'a, K, V> {
    type Item = (&'a V, &'a K);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (v, k))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for InverseIter<'_, K, V> {}
impl<K, V> FusedIterator for InverseIter<'_, K, V> {}

#[cfg(test)]
mod tests {
    use crate::{BiMapError, HashBiMap};

    /// Invariant: inverting twice yields the very same map instance.
    #[test]
    fn double_inverse_is_identity() {
        let mut m: HashBiMap<&str, i32> = HashBiMap::new();
        assert!(std::ptr::eq(m.inverse().inverse(), &m));
        m.insert("a", 1);
        let p: *const HashBiMap<&str, i32> = &m;
        assert!(std::ptr::eq(m.inverse_mut().inverse_mut(), p));
        let inv = m.into_inverse();
        let back = inv.into_inverse();
        assert_eq!(back.get("a"), Some(&1));
    }

    /// Invariant: the view reads the forward map with roles swapped.
    #[test]
    fn view_swaps_roles() {
        let mut m = HashBiMap::new();
        m.insert("a", 1);
        m.insert("b", 2);
        let inv = m.inverse();
        assert_eq!(inv.get(&1), Some(&"a"));
        assert_eq!(inv.get_by_value("b"), Some(&2));
        assert!(inv.contains_key(&2));
        assert!(inv.contains_value("a"));
        assert_eq!(inv.len(), 2);
        let pairs: Vec<_> = inv.iter().map(|(v, k)| (*v, *k)).collect();
        assert_eq!(pairs, vec![(1, "a"), (2, "b")]);
        assert_eq!(inv.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(inv.values().copied().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(format!("{:?}", inv), r#"{1: "a", 2: "b"}"#);
    }

    /// Invariant: writes through the view are visible in the forward map.
    #[test]
    fn writes_through_view() {
        let mut m = HashBiMap::new();
        m.insert("a", 1);
        m.insert("b", 2);
        m.insert("c", 3);
        let inv = m.inverse_mut();
        // Rebinding value 2 keeps its slot; the pair holding "c" is evicted.
        assert_eq!(inv.insert(2, "c"), Some("b"));
        assert_eq!(inv.remove(&1), Some("a"));
        assert_eq!(inv.remove_by_value("zzz"), None);
        let pairs: Vec<_> = m.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(pairs, vec![("c", 2)]);
    }

    /// Invariant: strict puts through the view use the view's vocabulary.
    #[test]
    fn strict_puts_through_view() {
        let mut m = HashBiMap::new();
        m.insert("a", 1);
        m.insert("b", 2);
        let inv = m.inverse_mut();
        assert_eq!(inv.try_insert(3, "a"), Err(BiMapError::ValueAlreadyPresent));
        assert_eq!(inv.try_insert(1, "z"), Ok(Some("a")));
        assert_eq!(inv.insert_unique(2, "a"), Err(BiMapError::KeyAlreadyPresent));
        assert_eq!(inv.insert_unique(4, "b"), Err(BiMapError::ValueAlreadyPresent));
        assert_eq!(inv.insert_unique(4, "d"), Ok(()));
        assert_eq!(m.get("z"), Some(&1));
        assert_eq!(m.get("d"), Some(&4));
        assert!(!m.contains_key("a"));
    }

    /// Invariant: the view's sizing and endpoint accessors mirror the map's.
    #[test]
    fn view_mirrors_sizing_and_endpoints() {
        let mut m: HashBiMap<&str, u32> = HashBiMap::with_capacity(4);
        assert_eq!(m.inverse().first(), None);
        m.insert("a", 1);
        m.insert("b", 2);
        m.insert("c", 3);
        let inv = m.inverse_mut();
        assert_eq!(inv.first(), Some((&1, &"a")));
        assert_eq!(inv.last(), Some((&3, &"c")));
        assert_eq!(inv.get_key_value(&2), Some((&2, &"b")));
        assert_eq!(inv.get_key_value(&9), None);
        assert_eq!(inv.capacity(), 4);
        inv.reserve(100);
        assert_eq!(inv.capacity(), 128);
        assert_eq!(m.capacity(), 128);
        assert_eq!(m.get("b"), Some(&2));
    }

    /// Invariant: retain through the view sees (value, key) pairs.
    #[test]
    fn retain_through_view() {
        let mut m: HashBiMap<String, u32> = (0..10).map(|i| (format!("k{i}"), i)).collect();
        m.inverse_mut().retain(|v, k| v % 2 == 0 && k.as_str() != "k4");
        let keys: Vec<_> = m.keys().cloned().collect();
        assert_eq!(keys, vec!["k0", "k2", "k6", "k8"]);
    }
}
