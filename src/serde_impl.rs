//! Serde support: a map is a sequence of `(key, value)` pairs in insertion
//! order. Deserializing refuses duplicated keys or values.

use crate::HashBiMap;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use serde::de::{Error, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Deserializer, Serialize};

struct HashBiMapVisitor<K, V, S> {
    marker: PhantomData<fn() -> HashBiMap<K, V, S>>,
}

impl<'de, K, V, S> Visitor<'de> for HashBiMapVisitor<K, V, S>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de> + Eq + Hash,
    S: BuildHasher + Default,
{
    type Value = HashBiMap<K, V, S>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a sequence of unique (key, value) pairs")
    }

    fn visit_seq<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: SeqAccess<'de>,
    {
        let mut map =
            HashBiMap::with_capacity_and_hasher(access.size_hint().unwrap_or(0), S::default());
        while let Some((k, v)) = access.next_element::<(K, V)>()? {
            map.insert_unique(k, v).map_err(M::Error::custom)?;
        }
        Ok(map)
    }
}

impl<'de, K, V, S> Deserialize<'de> for HashBiMap<K, V, S>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de> + Eq + Hash,
    S: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(HashBiMapVisitor {
            marker: PhantomData,
        })
    }
}

impl<K, V, H> Serialize for HashBiMap<K, V, H>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for pair in self.iter() {
            seq.serialize_element(&pair)?;
        }
        seq.end()
    }
}
