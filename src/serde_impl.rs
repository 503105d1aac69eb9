//! `serde` support: a `ProbeMap` serializes as a map in iteration order and
//! deserializes with insert semantics (first occurrence of a key wins).

use crate::ProbeMap;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

// Upper bound on pre-sizing from an untrusted length hint.
const MAX_PRESIZE: usize = 4096;

impl<K, V, S> Serialize for ProbeMap<K, V, S>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<T: Serializer>(&self, serializer: T) -> Result<T::Ok, T::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct ProbeMapVisitor<K, V, S> {
    marker: PhantomData<fn() -> ProbeMap<K, V, S>>,
}

impl<'de, K, V, S> Visitor<'de> for ProbeMapVisitor<K, V, S>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    type Value = ProbeMap<K, V, S>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let hint = access.size_hint().unwrap_or(0).min(MAX_PRESIZE);
        let mut map = ProbeMap::with_capacity_and_hasher(hint * 2, S::default());
        while let Some((k, v)) = access.next_entry()? {
            map.insert(k, v);
        }
        Ok(map)
    }
}

impl<'de, K, V, S> Deserialize<'de> for ProbeMap<K, V, S>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ProbeMapVisitor {
            marker: PhantomData,
        })
    }
}
