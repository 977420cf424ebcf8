#![cfg(test)]

// Property tests for HashBiMap kept inside the crate so they can walk the
// internal tables after every step.

use crate::{BiMapError, HashBiMap, PutPolicy};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

// Small domains on both sides so conflicts happen constantly.
#[derive(Clone, Debug)]
enum Op {
    Insert(u8, u8),
    Put(u8, u8, PutPolicy),
    InversePut(u8, u8, PutPolicy),
    Remove(u8),
    RemoveByValue(u8),
    CursorSetValue(usize, u8),
    CursorRemove(usize),
    Clear,
    Iterate,
}

fn arb_policy() -> impl Strategy<Value = PutPolicy> {
    prop_oneof![
        Just(PutPolicy::Evict),
        Just(PutPolicy::Replace),
        Just(PutPolicy::Unique),
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let k = 0u8..12;
    let v = 0u8..12;
    let op = prop_oneof![
        6 => (k.clone(), v.clone()).prop_map(|(k, v)| Op::Insert(k, v)),
        4 => (k.clone(), v.clone(), arb_policy()).prop_map(|(k, v, p)| Op::Put(k, v, p)),
        3 => (v.clone(), k.clone(), arb_policy()).prop_map(|(v, k, p)| Op::InversePut(v, k, p)),
        2 => k.clone().prop_map(Op::Remove),
        2 => v.clone().prop_map(Op::RemoveByValue),
        2 => (any::<usize>(), v.clone()).prop_map(|(i, v)| Op::CursorSetValue(i, v)),
        1 => any::<usize>().prop_map(Op::CursorRemove),
        1 => Just(Op::Clear),
        1 => Just(Op::Iterate),
    ];
    proptest::collection::vec(op, 1..80)
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Side {
    Key,
    Value,
}

// Reference model: the live pairs in insertion order.
#[derive(Default)]
struct Model {
    pairs: Vec<(u8, u8)>,
}

impl Model {
    fn pos_of_key(&self, k: u8) -> Option<usize> {
        self.pairs.iter().position(|p| p.0 == k)
    }

    fn pos_of_value(&self, v: u8) -> Option<usize> {
        self.pairs.iter().position(|p| p.1 == v)
    }

    // Returns the anchor's previous counterpart.
    fn put(
        &mut self,
        k: u8,
        v: u8,
        side: Side,
        policy: PutPolicy,
    ) -> Result<Option<u8>, BiMapError> {
        let (anchor, other) = match side {
            Side::Key => (self.pos_of_key(k), self.pos_of_value(v)),
            Side::Value => (self.pos_of_value(v), self.pos_of_key(k)),
        };
        let previous = |p: (u8, u8)| match side {
            Side::Key => p.1,
            Side::Value => p.0,
        };
        if let Some(a) = anchor {
            if self.pairs[a] == (k, v) {
                return Ok(Some(previous((k, v))));
            }
        }
        match policy {
            PutPolicy::Evict => {}
            PutPolicy::Replace => {
                if other.is_some() {
                    return Err(BiMapError::ValueAlreadyPresent);
                }
            }
            PutPolicy::Unique => {
                if anchor.is_some() {
                    return Err(BiMapError::KeyAlreadyPresent);
                }
                if other.is_some() {
                    return Err(BiMapError::ValueAlreadyPresent);
                }
            }
        }
        if let Some(o) = other {
            self.pairs.remove(o);
        }
        let anchor = match side {
            Side::Key => self.pos_of_key(k),
            Side::Value => self.pos_of_value(v),
        };
        match anchor {
            Some(a) => {
                let old = self.pairs[a];
                self.pairs[a] = (k, v);
                Ok(Some(previous(old)))
            }
            None => {
                self.pairs.push((k, v));
                Ok(None)
            }
        }
    }
}

fn check_against_model<S: BuildHasher>(
    mut sut: HashBiMap<u8, u8, S>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model = Model::default();

    for op in ops {
        match op {
            Op::Insert(k, v) => {
                let got = sut.insert(k, v);
                let want = model.put(k, v, Side::Key, PutPolicy::Evict);
                prop_assert_eq!(Ok(got), want);
            }
            Op::Put(k, v, policy) => {
                let got = sut.put(k, v, policy);
                let want = model.put(k, v, Side::Key, policy);
                prop_assert_eq!(got, want);
            }
            Op::InversePut(v, k, policy) => {
                let got = sut.inverse_mut().put(v, k, policy);
                let want = model.put(k, v, Side::Value, policy);
                prop_assert_eq!(got, want);
            }
            Op::Remove(k) => {
                let want = model.pos_of_key(k).map(|p| model.pairs.remove(p).1);
                prop_assert_eq!(sut.remove(&k), want);
            }
            Op::RemoveByValue(v) => {
                let want = model.pos_of_value(v).map(|p| model.pairs.remove(p).0);
                prop_assert_eq!(sut.remove_by_value(&v), want);
            }
            Op::CursorSetValue(i, v) => {
                if model.pairs.is_empty() {
                    continue;
                }
                let target = i % model.pairs.len();
                let mut cursor = sut.cursor();
                for _ in 0..=target {
                    prop_assert!(cursor.next(&sut).unwrap().is_some());
                }
                let current = model.pairs[target];
                let want = if current.1 == v {
                    Ok(v)
                } else if model.pos_of_value(v).is_some() {
                    Err(BiMapError::ValueAlreadyPresent)
                } else {
                    model.pairs[target].1 = v;
                    Ok(current.1)
                };
                prop_assert_eq!(cursor.set_value(&mut sut, v), want);
                // The cursor keeps walking from where it was.
                let next = cursor.next(&sut).unwrap().map(|(k, v)| (*k, *v));
                prop_assert_eq!(next, model.pairs.get(target + 1).copied());
            }
            Op::CursorRemove(i) => {
                if model.pairs.is_empty() {
                    continue;
                }
                let target = i % model.pairs.len();
                let mut cursor = sut.cursor();
                for _ in 0..=target {
                    prop_assert!(cursor.next(&sut).unwrap().is_some());
                }
                let removed = model.pairs.remove(target);
                prop_assert_eq!(cursor.remove(&mut sut), Ok(removed));
                let next = cursor.next(&sut).unwrap().map(|(k, v)| (*k, *v));
                prop_assert_eq!(next, model.pairs.get(target).copied());
            }
            Op::Clear => {
                sut.clear();
                model.pairs.clear();
            }
            Op::Iterate => {
                let got: Vec<_> = sut.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(got, model.pairs.clone());
            }
        }

        // Post-conditions after each op
        // 1) Structural invariants of both tables and the order list
        sut.table.assert_consistent();
        // 2) Same pairs, same order, reachable from both sides
        let order: Vec<_> = sut.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&order, &model.pairs);
        for &(k, v) in &model.pairs {
            prop_assert_eq!(sut.get(&k), Some(&v));
            prop_assert_eq!(sut.inverse().get(&v), Some(&k));
        }
        // 3) Size parity
        prop_assert_eq!(sut.len(), model.pairs.len());
        prop_assert!(sut.len() <= sut.capacity());
    }
    Ok(())
}

// Property: state-machine equivalence against an ordered pair list.
// Invariants exercised across random operation sequences:
// - Bijection: no key or value is bound twice, whatever the policy.
// - Every policy evicts, replaces or refuses exactly as the model does,
//   with the same previous binding or error.
// - Insertion order survives rebinding, eviction, rehash and cursor edits.
// - Both chains and the order list stay consistent after every step.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        let sut: HashBiMap<u8, u8, RandomState> =
            HashBiMap::with_capacity_and_hasher(2, RandomState::new());
        check_against_model(sut, ops)?;
    }
}

// Collision variant using a constant hasher so every entry shares one
// chain in each table.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same invariants as above under worst-case collisions.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(ops in arb_ops()) {
        let sut: HashBiMap<u8, u8, ConstBuildHasher> =
            HashBiMap::with_capacity_and_hasher(2, ConstBuildHasher);
        check_against_model(sut, ops)?;
    }
}
