//! hash-bimap: a single-threaded bijective hash map with insertion-ordered
//! iteration and an inverse view that shares the same storage.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep keys and values in one-to-one correspondence with O(1)
//!   average lookups from either side, without storing anything twice.
//! - Layers:
//!   - EntryTable<K, V, S>: structural layer. One generational arena of
//!     entries; each entry is chained into a key table and a value table
//!     (separate chaining, power-of-two length, `hash & mask`) and into a
//!     doubly linked insertion-order list. All links are arena keys.
//!   - HashBiMap<K, V, S>: public API (lookups, puts under a `PutPolicy`,
//!     removals, iteration, cursors).
//!   - Inverse<K, V, S>: `repr(transparent)` view of the same map with
//!     roles swapped; `map.inverse().inverse()` is `map` itself.
//!
//! Constraints
//! - Single-threaded: no locks, no atomics, no interior mutability.
//! - Bijection is enforced on every mutation, never merely checked.
//! - Both tables always have the same length and grow together.
//! - Rebinding a key (or, through the inverse, a value) keeps its slot in
//!   insertion order.
//!
//! Puts and conflicts
//! - `insert` evicts the pair that held the other side. `try_insert`
//!   refuses to evict. `insert_unique` refuses any conflict and reports the
//!   key before the value. `put` takes the policy explicitly.
//! - Re-putting an existing pair is a no-op under every policy.
//!
//! Hashing and rehashing
//! - Each entry caches both hashes. Rehashing doubles the tables once
//!   `len > LOAD_FACTOR * table_len` and re-threads entries in insertion
//!   order from the cached hashes; `K: Hash` and `V: Hash` never run then.
//!
//! Iteration and fail-fast
//! - Borrowing iterators walk the order list and are bounded by the length
//!   at creation.
//! - `Cursor` does not borrow the map. It checks the map's modification
//!   counter on each step and fails with `ConcurrentModification` when the
//!   map changed behind its back. Its own `remove` and `set_value` keep it
//!   valid and preserve its position.
//!
//! Notes and non-goals
//! - No persistence, no synchronization.
//! - Values are immutable while stored; change them with a cursor's
//!   `set_value` or a new put, so both tables stay consistent.

mod bimap;
mod cursor;
mod entry_table;
mod entry_table_proptest;
mod error;
mod inverse;
pub mod iter;
mod policy;
#[cfg(feature = "serde")]
mod serde_impl;

// Public surface
pub use bimap::HashBiMap;
pub use cursor::{Cursor, InverseCursor};
pub use entry_table::{LOAD_FACTOR, MAX_TABLE_LEN};
pub use error::{BiMapError, Result};
pub use inverse::{Inverse, InverseIter};
pub use policy::PutPolicy;
