//! EntryTable: structural layer holding one arena of entries threaded through
//! a key table, a value table and an insertion-order list.

use crate::error::BiMapError;
use crate::policy::PutPolicy;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::sync::atomic::{AtomicU64, Ordering};
use slotmap::{DefaultKey, SlotMap};

/// Ratio of live entries to table length above which the tables double.
pub const LOAD_FACTOR: f64 = 1.0;

/// Largest table length; past this the chains simply grow longer.
pub const MAX_TABLE_LEN: usize = 1 << 30;

/// Expected size used by `new()` and `Default`.
pub(crate) const DEFAULT_EXPECTED_SIZE: usize = 16;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(0);

fn next_table_id() -> u64 {
    NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
    key_hash: u64,
    value_hash: u64,
    next_in_key_bucket: Option<DefaultKey>,
    next_in_value_bucket: Option<DefaultKey>,
    prev_in_order: Option<DefaultKey>,
    next_in_order: Option<DefaultKey>,
}

/// A pair unlinked from the table, with the order slot it used to follow.
pub(crate) struct Removed<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    key_hash: u64,
    value_hash: u64,
    prev_in_order: Option<DefaultKey>,
}

/// Which side of the pair a put is anchored on. The anchor keeps its
/// insertion-order slot when rebound; the other side gets evicted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Side {
    Key,
    Value,
}

enum Probe {
    /// The anchor is already bound to the requested counterpart.
    Bound,
    Free {
        anchor: Option<DefaultKey>,
        other: Option<DefaultKey>,
    },
}

pub(crate) struct EntryTable<K, V, S> {
    // Distinct per table, clones included; cursors check it.
    id: u64,
    hasher: S,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
    key_table: Vec<Option<DefaultKey>>,
    value_table: Vec<Option<DefaultKey>>,
    mask: usize,
    first: Option<DefaultKey>,
    last: Option<DefaultKey>,
    mod_count: u64,
}

impl<K: Clone, V: Clone, S: Clone> Clone for EntryTable<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            id: next_table_id(),
            hasher: self.hasher.clone(),
            slots: self.slots.clone(),
            key_table: self.key_table.clone(),
            value_table: self.value_table.clone(),
            mask: self.mask,
            first: self.first,
            last: self.last,
            mod_count: self.mod_count,
        }
    }
}

/// Power-of-two table length able to hold `expected` entries at `LOAD_FACTOR`.
pub(crate) fn table_len_for(expected: usize) -> usize {
    let wanted = expected.max(2);
    if wanted >= MAX_TABLE_LEN {
        MAX_TABLE_LEN
    } else {
        wanted.next_power_of_two()
    }
}

fn needs_resizing(len: usize, table_len: usize) -> bool {
    len as f64 > LOAD_FACTOR * table_len as f64 && table_len < MAX_TABLE_LEN
}

impl<K, V, S> EntryTable<K, V, S> {
    pub(crate) fn with_capacity_and_hasher(expected: usize, hasher: S) -> Self {
        let table_len = table_len_for(expected);
        Self {
            id: next_table_id(),
            hasher,
            slots: SlotMap::with_capacity(expected.min(MAX_TABLE_LEN)),
            key_table: vec![None; table_len],
            value_table: vec![None; table_len],
            mask: table_len - 1,
            first: None,
            last: None,
            mod_count: 0,
        }
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn table_len(&self) -> usize {
        debug_assert_eq!(self.key_table.len(), self.value_table.len());
        self.key_table.len()
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn mod_count(&self) -> u64 {
        self.mod_count
    }

    pub(crate) fn first(&self) -> Option<Handle> {
        self.first.map(Handle::new)
    }

    pub(crate) fn last(&self) -> Option<Handle> {
        self.last.map(Handle::new)
    }

    pub(crate) fn next_in_order(&self, h: Handle) -> Option<Handle> {
        self.slots
            .get(h.raw_handle())
            .and_then(|e| e.next_in_order)
            .map(Handle::new)
    }

    pub(crate) fn pair(&self, h: Handle) -> Option<(&K, &V)> {
        self.slots.get(h.raw_handle()).map(|e| (&e.key, &e.value))
    }

    pub(crate) fn entries(&self) -> Entries<'_, K, V> {
        Entries {
            slots: &self.slots,
            next: self.first,
            remaining: self.slots.len(),
        }
    }

    pub(crate) fn into_entries(self) -> IntoEntries<K, V> {
        IntoEntries {
            remaining: self.slots.len(),
            next: self.first,
            slots: self.slots,
        }
    }

    fn bump_mod_count(&mut self) {
        self.mod_count = self.mod_count.wrapping_add(1);
    }

    #[inline]
    fn bucket(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    /// Drops every entry and empties both tables, keeping their length.
    pub(crate) fn clear(&mut self) {
        let dropped = self.slots.len();
        self.key_table.fill(None);
        self.value_table.fill(None);
        self.first = None;
        self.last = None;
        self.slots.clear();
        self.bump_mod_count();
        tracing::trace!(dropped, "cleared bijective map");
    }

    /// Links a fresh entry into both chains and into the order list right
    /// after `prev` (at the front when `prev` is `None`).
    fn link(
        &mut self,
        key: K,
        value: V,
        key_hash: u64,
        value_hash: u64,
        prev: Option<DefaultKey>,
    ) -> DefaultKey {
        let kb = self.bucket(key_hash);
        let vb = self.bucket(value_hash);
        let next = match prev {
            Some(p) => self.slots[p].next_in_order,
            None => self.first,
        };
        let k = self.slots.insert(Entry {
            key,
            value,
            key_hash,
            value_hash,
            next_in_key_bucket: self.key_table[kb],
            next_in_value_bucket: self.value_table[vb],
            prev_in_order: prev,
            next_in_order: next,
        });
        self.key_table[kb] = Some(k);
        self.value_table[vb] = Some(k);
        match prev {
            Some(p) => self.slots[p].next_in_order = Some(k),
            None => self.first = Some(k),
        }
        match next {
            Some(n) => self.slots[n].prev_in_order = Some(k),
            None => self.last = Some(k),
        }
        self.bump_mod_count();
        k
    }

    /// Unlinks an entry from both chains and the order list and frees its
    /// slot. Returns `None` for a handle that no longer resolves.
    fn delete(&mut self, k: DefaultKey) -> Option<Removed<K, V>> {
        let (kb, vb, next_k, next_v, prev, next) = {
            let e = self.slots.get(k)?;
            (
                self.bucket(e.key_hash),
                self.bucket(e.value_hash),
                e.next_in_key_bucket,
                e.next_in_value_bucket,
                e.prev_in_order,
                e.next_in_order,
            )
        };

        if self.key_table[kb] == Some(k) {
            self.key_table[kb] = next_k;
        } else {
            let mut cursor = self.key_table[kb];
            while let Some(c) = cursor {
                let entry = &mut self.slots[c];
                if entry.next_in_key_bucket == Some(k) {
                    entry.next_in_key_bucket = next_k;
                    break;
                }
                cursor = entry.next_in_key_bucket;
            }
        }

        if self.value_table[vb] == Some(k) {
            self.value_table[vb] = next_v;
        } else {
            let mut cursor = self.value_table[vb];
            while let Some(c) = cursor {
                let entry = &mut self.slots[c];
                if entry.next_in_value_bucket == Some(k) {
                    entry.next_in_value_bucket = next_v;
                    break;
                }
                cursor = entry.next_in_value_bucket;
            }
        }

        match prev {
            Some(p) => self.slots[p].next_in_order = next,
            None => self.first = next,
        }
        match next {
            Some(n) => self.slots[n].prev_in_order = prev,
            None => self.last = prev,
        }

        let entry = self
            .slots
            .remove(k)
            .expect("entry must exist while it is linked");
        self.bump_mod_count();
        Some(Removed {
            key: entry.key,
            value: entry.value,
            key_hash: entry.key_hash,
            value_hash: entry.value_hash,
            prev_in_order: entry.prev_in_order,
        })
    }

    pub(crate) fn remove(&mut self, h: Handle) -> Option<(K, V)> {
        self.delete(h.raw_handle()).map(|r| (r.key, r.value))
    }

    /// Reallocates both tables at `new_len` and re-threads every entry in
    /// insertion order using the cached hashes; user `Hash` never runs here.
    fn resize(&mut self, new_len: usize) {
        tracing::trace!(
            from = self.key_table.len(),
            to = new_len,
            len = self.slots.len(),
            "rehashing bijective map tables"
        );
        let mut key_table = vec![None; new_len];
        let mut value_table = vec![None; new_len];
        let mask = new_len - 1;

        let mut cursor = self.first;
        while let Some(k) = cursor {
            let entry = &mut self.slots[k];
            let kb = (entry.key_hash as usize) & mask;
            let vb = (entry.value_hash as usize) & mask;
            entry.next_in_key_bucket = key_table[kb];
            entry.next_in_value_bucket = value_table[vb];
            key_table[kb] = Some(k);
            value_table[vb] = Some(k);
            cursor = entry.next_in_order;
        }

        self.key_table = key_table;
        self.value_table = value_table;
        self.mask = mask;
        self.bump_mod_count();
    }

    fn rehash_if_necessary(&mut self) {
        let table_len = self.key_table.len();
        if needs_resizing(self.slots.len(), table_len) {
            self.resize(table_len * 2);
        }
    }

    /// Grows the tables so `additional` more entries fit without a rehash.
    pub(crate) fn reserve(&mut self, additional: usize) {
        let wanted = table_len_for(self.slots.len().saturating_add(additional));
        if wanted > self.key_table.len() {
            self.resize(wanted);
        }
        self.slots.reserve(additional);
    }

    /// Replaces `anchor` (or appends, when absent) with a fresh entry after
    /// evicting `other`. Returns the anchor's old pair.
    fn commit(
        &mut self,
        anchor: Option<DefaultKey>,
        other: Option<DefaultKey>,
        key: K,
        value: V,
        key_hash: u64,
        value_hash: u64,
    ) -> Option<(K, V)> {
        // Evict first so the anchor's neighbours are final before we read them.
        if let Some(o) = other {
            self.delete(o);
        }
        let (prev, old) = match anchor.and_then(|a| self.delete(a)) {
            Some(r) => (r.prev_in_order, Some((r.key, r.value))),
            None => (self.last, None),
        };
        self.link(key, value, key_hash, value_hash, prev);
        self.rehash_if_necessary();
        old
    }
}

impl<K, V, S> EntryTable<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn seek_by_key_hashed<Q>(&self, q: &Q, hash: u64) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut cursor = self.key_table[self.bucket(hash)];
        while let Some(k) = cursor {
            let entry = &self.slots[k];
            if entry.key_hash == hash && entry.key.borrow() == q {
                return Some(k);
            }
            cursor = entry.next_in_key_bucket;
        }
        None
    }

    fn seek_by_value_hashed<Q>(&self, q: &Q, hash: u64) -> Option<DefaultKey>
    where
        V: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut cursor = self.value_table[self.bucket(hash)];
        while let Some(k) = cursor {
            let entry = &self.slots[k];
            if entry.value_hash == hash && entry.value.borrow() == q {
                return Some(k);
            }
            cursor = entry.next_in_value_bucket;
        }
        None
    }

    pub(crate) fn seek_by_key<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.seek_by_key_hashed(q, self.make_hash(q)).map(Handle::new)
    }

    pub(crate) fn seek_by_value<Q>(&self, q: &Q) -> Option<Handle>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.seek_by_value_hashed(q, self.make_hash(q)).map(Handle::new)
    }

    fn probe(&self, key: &K, key_hash: u64, value: &V, value_hash: u64, side: Side) -> Probe {
        match side {
            Side::Key => {
                let anchor = self.seek_by_key_hashed(key, key_hash);
                if let Some(a) = anchor {
                    let e = &self.slots[a];
                    if e.value_hash == value_hash && e.value == *value {
                        return Probe::Bound;
                    }
                }
                let other = self.seek_by_value_hashed(value, value_hash);
                Probe::Free { anchor, other }
            }
            Side::Value => {
                let anchor = self.seek_by_value_hashed(value, value_hash);
                if let Some(a) = anchor {
                    let e = &self.slots[a];
                    if e.key_hash == key_hash && e.key == *key {
                        return Probe::Bound;
                    }
                }
                let other = self.seek_by_key_hashed(key, key_hash);
                Probe::Free { anchor, other }
            }
        }
    }

    /// Evicting put. `Err` hands the pair back when it was already bound.
    fn put_anchored(
        &mut self,
        key: K,
        value: V,
        side: Side,
    ) -> Result<Option<(K, V)>, (K, V)> {
        let key_hash = self.make_hash(&key);
        let value_hash = self.make_hash(&value);
        match self.probe(&key, key_hash, &value, value_hash, side) {
            Probe::Bound => Err((key, value)),
            Probe::Free { anchor, other } => {
                Ok(self.commit(anchor, other, key, value, key_hash, value_hash))
            }
        }
    }

    fn checked_put_anchored(
        &mut self,
        key: K,
        value: V,
        side: Side,
        policy: PutPolicy,
    ) -> Result<Result<Option<(K, V)>, (K, V)>, BiMapError> {
        let key_hash = self.make_hash(&key);
        let value_hash = self.make_hash(&value);
        match self.probe(&key, key_hash, &value, value_hash, side) {
            Probe::Bound => Ok(Err((key, value))),
            Probe::Free { anchor, other } => {
                policy.check(anchor.is_some(), other.is_some())?;
                Ok(Ok(self.commit(anchor, other, key, value, key_hash, value_hash)))
            }
        }
    }

    /// Binds `key` to `value`, evicting whatever else holds `value`.
    /// Returns the value `key` was bound to before.
    pub(crate) fn force_put(&mut self, key: K, value: V) -> Option<V> {
        match self.put_anchored(key, value, Side::Key) {
            Ok(old) => old.map(|(_, v)| v),
            Err((_, value)) => Some(value),
        }
    }

    /// Binds `value` to `key`, evicting whatever else holds `key`.
    /// Returns the key `value` was bound to before.
    pub(crate) fn force_put_inverse(&mut self, value: V, key: K) -> Option<K> {
        match self.put_anchored(key, value, Side::Value) {
            Ok(old) => old.map(|(k, _)| k),
            Err((key, _)) => Some(key),
        }
    }

    pub(crate) fn put(
        &mut self,
        key: K,
        value: V,
        policy: PutPolicy,
    ) -> Result<Option<V>, BiMapError> {
        Ok(match self.checked_put_anchored(key, value, Side::Key, policy)? {
            Ok(old) => old.map(|(_, v)| v),
            Err((_, value)) => Some(value),
        })
    }

    pub(crate) fn put_inverse(
        &mut self,
        value: V,
        key: K,
        policy: PutPolicy,
    ) -> Result<Option<K>, BiMapError> {
        Ok(match self.checked_put_anchored(key, value, Side::Value, policy)? {
            Ok(old) => old.map(|(k, _)| k),
            Err((key, _)) => Some(key),
        })
    }

    /// Rebinds the entry at `h` to `value` in place: same order slot, same
    /// key. Returns the old value and the handle of the rebuilt entry.
    pub(crate) fn replace_value(
        &mut self,
        h: Handle,
        value: V,
    ) -> Result<(V, Handle), BiMapError> {
        let value_hash = self.make_hash(&value);
        let entry = self
            .slots
            .get(h.raw_handle())
            .ok_or(BiMapError::ConcurrentModification)?;
        if entry.value_hash == value_hash && entry.value == value {
            return Ok((value, h));
        }
        if self.seek_by_value_hashed(&value, value_hash).is_some() {
            return Err(BiMapError::ValueAlreadyPresent);
        }
        let removed = self.delete(h.raw_handle()).expect("entry resolved above");
        let k = self.link(
            removed.key,
            value,
            removed.key_hash,
            value_hash,
            removed.prev_in_order,
        );
        Ok((removed.value, Handle::new(k)))
    }

    /// Mirror of `replace_value` for the inverse view.
    pub(crate) fn replace_key(
        &mut self,
        h: Handle,
        key: K,
    ) -> Result<(K, Handle), BiMapError> {
        let key_hash = self.make_hash(&key);
        let entry = self
            .slots
            .get(h.raw_handle())
            .ok_or(BiMapError::ConcurrentModification)?;
        if entry.key_hash == key_hash && entry.key == key {
            return Ok((key, h));
        }
        if self.seek_by_key_hashed(&key, key_hash).is_some() {
            return Err(BiMapError::ValueAlreadyPresent);
        }
        let removed = self.delete(h.raw_handle()).expect("entry resolved above");
        let k = self.link(
            key,
            removed.value,
            key_hash,
            removed.value_hash,
            removed.prev_in_order,
        );
        Ok((removed.key, Handle::new(k)))
    }
}

/// Borrowing walk over the order list, bounded by the length at creation.
pub(crate) struct Entries<'a, K, V> {
    slots: &'a SlotMap<DefaultKey, Entry<K, V>>,
    next: Option<DefaultKey>,
    remaining: usize,
}

impl<K, V> Clone for Entries<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Entries<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.slots.get(self.next?)?;
        self.next = entry.next_in_order;
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Owning walk over the order list; frees each slot as it goes.
pub(crate) struct IntoEntries<K, V> {
    slots: SlotMap<DefaultKey, Entry<K, V>>,
    next: Option<DefaultKey>,
    remaining: usize,
}

impl<K, V> Iterator for IntoEntries<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.slots.remove(self.next?)?;
        self.next = entry.next_in_order;
        self.remaining -= 1;
        Some((entry.key, entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
impl<K, V, S> EntryTable<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
    /// Walks every structure and asserts the table invariants hold.
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.key_table.len(), self.value_table.len());
        assert!(self.key_table.len().is_power_of_two());
        assert_eq!(self.mask, self.key_table.len() - 1);

        let mut in_key_chains = 0;
        for (b, head) in self.key_table.iter().enumerate() {
            let mut cursor = *head;
            while let Some(k) = cursor {
                let e = &self.slots[k];
                assert_eq!(self.bucket(e.key_hash), b, "entry in wrong key bucket");
                in_key_chains += 1;
                cursor = e.next_in_key_bucket;
            }
        }
        let mut in_value_chains = 0;
        for (b, head) in self.value_table.iter().enumerate() {
            let mut cursor = *head;
            while let Some(k) = cursor {
                let e = &self.slots[k];
                assert_eq!(self.bucket(e.value_hash), b, "entry in wrong value bucket");
                in_value_chains += 1;
                cursor = e.next_in_value_bucket;
            }
        }
        assert_eq!(in_key_chains, self.slots.len());
        assert_eq!(in_value_chains, self.slots.len());

        let mut in_order = 0;
        let mut prev = None;
        let mut cursor = self.first;
        while let Some(k) = cursor {
            let e = &self.slots[k];
            assert_eq!(e.prev_in_order, prev);
            assert_eq!(self.seek_by_key_hashed(&e.key, e.key_hash), Some(k));
            assert_eq!(self.seek_by_value_hashed(&e.value, e.value_hash), Some(k));
            in_order += 1;
            prev = Some(k);
            cursor = e.next_in_order;
        }
        assert_eq!(prev, self.last);
        assert_eq!(in_order, self.slots.len());
    }
}
